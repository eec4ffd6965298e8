//! Opaque transport carrier.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque, shareable handle to a host transport object.
///
/// Warden never inspects the carried value. It is only passed through to
/// session implementations that need it (for example to set a cookie on a
/// response) and recovered by them with [`Carrier::downcast_ref`].
#[derive(Clone)]
pub struct Carrier(Arc<dyn Any + Send + Sync>);

impl Carrier {
    /// Wrap a transport object.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the carried value as `T`, if that is its type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether two carriers wrap the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Carrier(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast() {
        let carrier = Carrier::new(42_u32);
        assert_eq!(carrier.downcast_ref::<u32>(), Some(&42));
        assert!(carrier.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_ptr_eq() {
        let a = Carrier::new("request");
        let b = a.clone();
        let c = Carrier::new("request");
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
