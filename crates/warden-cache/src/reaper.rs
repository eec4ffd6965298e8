//! Periodic background task with explicit shutdown.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A named background thread that runs a task on a fixed interval.
///
/// The task returns `false` to stop itself (for example when the structure it
/// sweeps has been dropped). [`Reaper::shutdown`] stops the thread and waits
/// for it; dropping the reaper does the same.
#[derive(Debug)]
pub struct Reaper {
    name: String,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Spawn the background thread.
    ///
    /// The first run happens one `interval` after spawning.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the OS if the thread cannot be spawned.
    pub fn spawn<F>(name: impl Into<String>, interval: Duration, mut task: F) -> std::io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let name = name.into();
        let (stop, signal) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                loop {
                    match signal.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !task() {
                                break;
                            }
                        },
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        tracing::trace!(reaper = %name, ?interval, "Reaper started");

        Ok(Self {
            name,
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// The thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the background thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread to stop and wait for it to exit.
    ///
    /// Idempotent. When called from the reaper thread itself the join is
    /// skipped; the thread exits after the current run.
    pub fn shutdown(&mut self) {
        drop(self.stop.take());

        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::warn!(reaper = %self.name, "Reaper thread panicked");
        } else {
            tracing::trace!(reaper = %self.name, "Reaper stopped");
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_periodically_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let mut reaper = Reaper::spawn("test-reaper", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

        assert_eq!(reaper.name(), "test-reaper");
        thread::sleep(Duration::from_millis(100));
        reaper.shutdown();
        assert!(!reaper.is_running());

        let after_shutdown = runs.load(Ordering::SeqCst);
        assert!(after_shutdown >= 2);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }

    #[test]
    fn test_task_can_stop_itself() {
        let reaper = Reaper::spawn("self-stop", Duration::from_millis(5), || false).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(!reaper.is_running());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut reaper = Reaper::spawn("idempotent", Duration::from_secs(60), || true).unwrap();
        assert!(reaper.is_running());
        reaper.shutdown();
        reaper.shutdown();
        assert!(!reaper.is_running());
    }
}
