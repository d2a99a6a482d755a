//! Progress and timeout tracking for outbound requests
//!
//! Each pending request carries a soft deadline that resets every time a
//! `notifications/progress` arrives for its progress token, bounded by a
//! hard ceiling that no amount of progress pushes past. A progress
//! notification for a token nobody is waiting on is simply dropped — the
//! sender may be reporting progress on a task or a fire-and-forget
//! operation that nothing here tracks.

use std::time::Duration;
use dashmap::DashMap;
use tokio::sync::watch;
use crate::types::ProgressToken;

/// One outbound request's timeout state.
struct Watch {
    reset: watch::Sender<()>,
    max_total: Option<Duration>,
}

/// Tracks soft/hard deadlines for outbound requests keyed by progress token.
///
/// The soft timeout is the per-progress-notification reset window; the hard
/// `max_total_timeout` is an upper bound measured from registration that
/// progress can never extend past.
#[derive(Default)]
pub struct ProgressTracker {
    watches: DashMap<ProgressToken, Watch>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a progress token so `on_progress` can find it. Returns a
    /// receiver that fires every time progress resets the soft deadline.
    pub fn register(&self, token: ProgressToken, max_total_timeout: Option<Duration>) -> watch::Receiver<()> {
        let (tx, rx) = watch::channel(());
        self.watches.insert(token, Watch { reset: tx, max_total: max_total_timeout });
        rx
    }

    /// Called for every inbound `notifications/progress`. Resets the soft
    /// deadline for a known token; silently no-ops for an unknown one.
    pub fn on_progress(&self, token: ProgressToken) {
        if let Some(watch) = self.watches.get(&token) {
            let _ = watch.reset.send(());
        }
    }

    /// The hard ceiling registered for `token`, if any.
    pub fn max_total_timeout(&self, token: ProgressToken) -> Option<Duration> {
        self.watches.get(&token).and_then(|w| w.max_total)
    }

    /// Stops tracking `token`, e.g. once its request settles.
    pub fn unregister(&self, token: ProgressToken) {
        self.watches.remove(&token);
    }

    /// Waits out a soft timeout that resets on every progress update, never
    /// running past `max_total_timeout` from the moment it's called.
    /// Returns `true` if the deadline elapsed, `false` if the caller should
    /// race this against the request's own completion instead.
    pub async fn wait_for_timeout(&self, token: ProgressToken, soft: Duration) -> bool {
        let mut rx = match self.watches.get(&token) {
            Some(watch) => watch.reset.subscribe(),
            None => return false,
        };
        let max_total = self.max_total_timeout(token);
        let deadline = async {
            loop {
                let reset = tokio::time::sleep(soft);
                tokio::select! {
                    _ = reset => return,
                    changed = rx.changed() => if changed.is_err() { return },
                }
            }
        };

        match max_total {
            Some(hard) => tokio::select! {
                _ = deadline => true,
                _ = tokio::time::sleep(hard) => true,
            },
            None => {
                deadline.await;
                true
            }
        }
    }
}
