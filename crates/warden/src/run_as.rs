//! The run-as principal stack.

use serde::{Deserialize, Serialize};
use warden_core::Principal;

use crate::{SecurityError, SecurityResult};

/// A LIFO stack of principal sets backing run-as.
///
/// The last pushed set is the identity currently assumed. The stack never
/// holds an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalStack {
    frames: Vec<Vec<Principal>>,
}

impl PrincipalStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assume `principals` on top of the current identity.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::EmptyPrincipalSet`] if `principals` is empty.
    pub fn push(&mut self, principals: Vec<Principal>) -> SecurityResult<()> {
        if principals.is_empty() {
            return Err(SecurityError::EmptyPrincipalSet);
        }
        self.frames.push(principals);
        Ok(())
    }

    /// Remove and return the top set.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::EmptyStack`] if the stack is empty.
    pub fn pop(&mut self) -> SecurityResult<Vec<Principal>> {
        self.frames.pop().ok_or(SecurityError::EmptyStack)
    }

    /// The top set.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::EmptyStack`] if the stack is empty.
    pub fn peek(&self) -> SecurityResult<&[Principal]> {
        self.frames
            .last()
            .map(Vec::as_slice)
            .ok_or(SecurityError::EmptyStack)
    }

    /// Whether no identity is assumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of stacked sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Every principal of every stacked set, oldest set first.
    pub fn principals(&self) -> impl Iterator<Item = &Principal> {
        self.frames.iter().flatten()
    }

    /// Drop every stacked set.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Encode the stack, oldest set first.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::Codec`] if serialization fails.
    pub fn encode(&self) -> SecurityResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SecurityError::Codec(e.to_string()))
    }

    /// Decode a stack produced by [`PrincipalStack::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::Codec`] if the bytes are malformed or contain
    /// an empty set.
    pub fn decode(bytes: &[u8]) -> SecurityResult<Self> {
        let stack: Self =
            serde_json::from_slice(bytes).map_err(|e| SecurityError::Codec(e.to_string()))?;
        if stack.frames.iter().any(Vec::is_empty) {
            return Err(SecurityError::Codec(
                "run-as stack contains an empty principal set".to_string(),
            ));
        }
        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> Vec<Principal> {
        names.iter().map(|n| Principal::name(*n)).collect()
    }

    #[test]
    fn test_push_pop_peek() {
        let mut stack = PrincipalStack::new();
        assert!(stack.is_empty());
        assert!(matches!(stack.peek(), Err(SecurityError::EmptyStack)));
        assert!(matches!(stack.pop(), Err(SecurityError::EmptyStack)));

        stack.push(set(&["bar"])).unwrap();
        stack.push(set(&["baz", "qux"])).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek().unwrap(), set(&["baz", "qux"]).as_slice());
        assert_eq!(stack.pop().unwrap(), set(&["baz", "qux"]));
        assert_eq!(stack.pop().unwrap(), set(&["bar"]));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_principals_spans_every_set() {
        let mut stack = PrincipalStack::new();
        assert_eq!(stack.principals().count(), 0);

        stack.push(set(&["bar"])).unwrap();
        stack.push(set(&["baz", "qux"])).unwrap();
        let all: Vec<Principal> = stack.principals().cloned().collect();
        assert_eq!(all, set(&["bar", "baz", "qux"]));
    }

    #[test]
    fn test_push_rejects_empty_set() {
        let mut stack = PrincipalStack::new();
        assert!(matches!(
            stack.push(Vec::new()),
            Err(SecurityError::EmptyPrincipalSet)
        ));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let mut stack = PrincipalStack::new();
        stack.push(set(&["bar"])).unwrap();

        let mut decoded = PrincipalStack::decode(&stack.encode().unwrap()).unwrap();
        assert_eq!(decoded, stack);
        assert_eq!(decoded.pop().unwrap(), set(&["bar"]));
    }

    #[test]
    fn test_round_trip_keeps_order() {
        let mut stack = PrincipalStack::new();
        stack.push(set(&["a"])).unwrap();
        stack.push(set(&["b", "c"])).unwrap();
        stack.push(set(&["d"])).unwrap();

        let decoded = PrincipalStack::decode(&stack.encode().unwrap()).unwrap();
        assert_eq!(decoded, stack);
    }

    #[test]
    fn test_decoded_empty_stack_errors_on_pop() {
        let empty = PrincipalStack::new().encode().unwrap();
        let mut decoded = PrincipalStack::decode(&empty).unwrap();
        assert!(matches!(decoded.pop(), Err(SecurityError::EmptyStack)));
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        assert!(matches!(
            PrincipalStack::decode(b"not json"),
            Err(SecurityError::Codec(_))
        ));
        assert!(matches!(
            PrincipalStack::decode(b"[[]]"),
            Err(SecurityError::Codec(_))
        ));
    }
}
