//! The capability registry
//!
//! Wraps a [`CapabilitySet`](crate::types::CapabilitySet) with the
//! negotiation lifecycle the protocol expects: capabilities are declared
//! while building an [`EngineOptions`](crate::engine::EngineOptions), merged
//! with whatever the peer asserts during `initialize`, and frozen the
//! instant `connect()` runs. Declaring a capability afterwards is a
//! programming error, not a runtime one the peer can trigger — so it's
//! rejected with [`ErrorCode::StateError`] rather than silently ignored.

use std::sync::RwLock;
use crate::error::{Error, ErrorCode};
use crate::types::CapabilitySet;

/// Holds this side's declared capabilities and, once negotiated, the peer's.
pub struct CapabilityRegistry {
    local: RwLock<CapabilitySet>,
    remote: RwLock<Option<CapabilitySet>>,
    locked: RwLock<bool>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self { local: RwLock::new(CapabilitySet::new()), remote: RwLock::new(None), locked: RwLock::new(false) }
    }
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares or extends a local capability at `path`. Fails once the
    /// registry is locked.
    pub fn declare(&self, path: &str, value: serde_json::Value) -> Result<(), Error> {
        if *self.locked.read().unwrap() {
            return Err(Error::new(ErrorCode::StateError, "capabilities are locked after connect()"));
        }
        self.local.write().unwrap().set(path, value);
        Ok(())
    }

    /// Returns this side's declared capabilities, to send in `initialize`.
    pub fn local(&self) -> CapabilitySet {
        self.local.read().unwrap().clone()
    }

    /// Records the peer's negotiated capabilities and locks the registry
    /// against further local declarations. Idempotent: calling it again
    /// just re-locks with the newer set, which only matters for tests that
    /// re-run `initialize` against the same registry.
    pub fn negotiate(&self, remote: CapabilitySet) {
        *self.remote.write().unwrap() = Some(remote);
        *self.locked.write().unwrap() = true;
    }

    /// Asserts the peer declared `path`, returning
    /// [`ErrorCode::CapabilityError`] if it didn't (or `initialize` hasn't
    /// happened yet).
    pub fn require(&self, path: &str) -> Result<(), Error> {
        let remote = self.remote.read().unwrap();
        let has = remote.as_ref().is_some_and(|caps| caps.has(path));
        if has {
            Ok(())
        } else {
            Err(Error::new(ErrorCode::CapabilityError, format!("peer did not declare capability: {path}")))
        }
    }

    /// True once `negotiate` has run and local declarations are frozen.
    pub fn is_locked(&self) -> bool {
        *self.locked.read().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_declares_and_reports_local_capabilities() {
        let registry = CapabilityRegistry::new();
        registry.declare("tools.listChanged", json!(true)).unwrap();
        assert!(registry.local().has("tools.listChanged"));
    }

    #[test]
    fn it_rejects_declarations_after_negotiate() {
        let registry = CapabilityRegistry::new();
        registry.negotiate(CapabilitySet::new());
        let result = registry.declare("tools", json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn it_requires_a_negotiated_remote_capability() {
        let registry = CapabilityRegistry::new();
        assert!(registry.require("sampling").is_err());

        let mut remote = CapabilitySet::new();
        remote.set("sampling", json!(true));
        registry.negotiate(remote);

        assert!(registry.require("sampling").is_ok());
        assert!(registry.require("roots").is_err());
    }
}
