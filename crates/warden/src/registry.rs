//! Mapping of external interactions to their subjects.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{SecurityManager, SecurityResult, Subject, SubjectContext};

/// Binds an interaction key (for example a request id) to its subject.
///
/// Owned by the host. Every [`SubjectRegistry::acquire`] or
/// [`SubjectRegistry::register`] must be paired with a
/// [`SubjectRegistry::release`] when the interaction ends, otherwise the
/// entry stays in the registry.
pub struct SubjectRegistry<K> {
    subjects: Mutex<HashMap<K, Arc<Subject>>>,
}

impl<K> SubjectRegistry<K>
where
    K: Eq + Hash,
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subjects: Mutex::new(HashMap::new()),
        }
    }

    /// The subject bound to `key`, creating one from `context` if there is none.
    ///
    /// A new subject resuming a live session restores the identity stored in it.
    ///
    /// # Errors
    ///
    /// Returns the error of [`SecurityManager::create_subject`].
    pub fn acquire(
        &self,
        key: K,
        manager: &Arc<SecurityManager>,
        context: SubjectContext,
    ) -> SecurityResult<Arc<Subject>> {
        let mut subjects = self.lock();
        if let Some(subject) = subjects.get(&key) {
            return Ok(Arc::clone(subject));
        }

        let subject = Arc::new(manager.create_subject(context)?);
        subjects.insert(key, Arc::clone(&subject));
        Ok(subject)
    }

    /// Bind `subject` to `key`, returning the subject it replaces.
    pub fn register(&self, key: K, subject: Arc<Subject>) -> Option<Arc<Subject>> {
        self.lock().insert(key, subject)
    }

    /// The subject bound to `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<Subject>> {
        self.lock().get(key).cloned()
    }

    /// Unbind `key` at the end of its interaction.
    pub fn release(&self, key: &K) -> Option<Arc<Subject>> {
        self.lock().remove(key)
    }

    /// Number of bound interactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no interaction is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Arc<Subject>>> {
        self.subjects.lock().unwrap_or_else(|e| {
            tracing::warn!("SubjectRegistry lock poisoned, recovering");
            e.into_inner()
        })
    }
}

impl<K> Default for SubjectRegistry<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for SubjectRegistry<K>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubjectRegistry")
            .field("subjects", &self.len())
            .finish()
    }
}
