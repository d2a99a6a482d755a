//! The pending outbound request table

use dashmap::DashMap;
use tokio::sync::oneshot;
use crate::types::{ErrorDetails, ProgressToken, RequestId};
use crate::validator::CompiledSchema;

/// What happens to an outbound request once its response arrives.
pub(crate) struct PendingRequest {
    responder: oneshot::Sender<Result<serde_json::Value, ErrorDetails>>,
    validator: Option<Box<dyn CompiledSchema>>,
    progress_token: Option<ProgressToken>,
}

impl PendingRequest {
    pub(crate) fn new(
        responder: oneshot::Sender<Result<serde_json::Value, ErrorDetails>>,
        validator: Option<Box<dyn CompiledSchema>>,
        progress_token: Option<ProgressToken>,
    ) -> Self {
        Self { responder, validator, progress_token }
    }
}

/// Tracks outbound requests awaiting a response, keyed by the id the engine
/// assigned them.
#[derive(Default)]
pub(crate) struct PendingTable {
    entries: DashMap<RequestId, PendingRequest>,
}

impl PendingTable {
    pub(crate) fn insert(&self, id: RequestId, entry: PendingRequest) {
        self.entries.insert(id, entry);
    }

    /// Returns the progress token registered for `id`, if any — used to
    /// look up its timeout tracking when a progress notification arrives.
    pub(crate) fn progress_token(&self, id: &RequestId) -> Option<ProgressToken> {
        self.entries.get(id).and_then(|e| e.progress_token)
    }

    /// Resolves a pending request with a successful result, running it
    /// through the registered schema validator first if one was supplied.
    /// Returns `false` if no such request was pending (a stray or
    /// already-settled response).
    pub(crate) fn resolve(&self, id: &RequestId, result: serde_json::Value) -> bool {
        let Some((_, entry)) = self.entries.remove(id) else { return false };
        let outcome = match &entry.validator {
            Some(validator) => validator
                .validate(&result)
                .map(|()| result)
                .map_err(ErrorDetails::from),
            None => Ok(result),
        };
        let _ = entry.responder.send(outcome);
        true
    }

    /// Resolves a pending request with an error from the peer.
    pub(crate) fn reject(&self, id: &RequestId, error: ErrorDetails) -> bool {
        match self.entries.remove(id) {
            Some((_, entry)) => {
                let _ = entry.responder.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Removes a pending request without resolving it, e.g. once its
    /// timeout has fired and the waiting future has already moved on.
    pub(crate) fn remove(&self, id: &RequestId) {
        self.entries.remove(id);
    }

    /// Fails every still-pending outbound request with the same error,
    /// e.g. once the transport has closed and none of them can ever
    /// receive a real response.
    pub(crate) fn fail_all(&self, error: ErrorDetails) {
        for (_, entry) in self.entries.drain() {
            let _ = entry.responder.send(Err(error.clone()));
        }
    }
}
