//! Progress token allocation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// A numeric token that associates `notifications/progress` updates with
/// the outbound request that requested them.
///
/// Every token handed out by [`ProgressTokenAllocator`] within a single
/// engine instance is distinct and never reused, so a stale notification
/// referencing a token from a completed request can always be told apart
/// from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressToken(pub u64);

impl ProgressToken {
    /// Wraps a raw token value. Mostly useful in tests.
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProgressToken {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out strictly increasing [`ProgressToken`]s for one engine instance.
#[derive(Default)]
pub struct ProgressTokenAllocator {
    next: AtomicU64,
}

impl ProgressTokenAllocator {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Allocates the next token. Monotonic, never returns the same value twice.
    pub fn allocate(&self) -> ProgressToken {
        ProgressToken(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_allocates_distinct_tokens() {
        let allocator = ProgressTokenAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        assert_ne!(a, b);
    }

    #[test]
    fn it_serializes_as_bare_number() {
        let token = ProgressToken::new(42);
        assert_eq!(serde_json::to_string(&token).unwrap(), "42");
    }
}
