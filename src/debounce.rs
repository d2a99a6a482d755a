//! Outbound notification debouncing
//!
//! Several notifications fired in quick succession for the same method —
//! `notifications/tools/list_changed` triggered by five registrations in a
//! row — collapse into one send instead of five, but only when the
//! notification is [debounce-eligible](crate::types::notification::Notification::is_debounce_eligible):
//! no params, and no related task. A `notifications/progress` carries a
//! token and must never be coalesced away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use crate::types::notification::Notification;

type Sink = Arc<dyn Fn(Notification) + Send + Sync>;

/// Coalesces eligible same-method notifications raised within `window` of
/// each other into a single send of the latest one.
pub struct Debouncer {
    window: Duration,
    pending: Arc<Mutex<HashMap<String, Notification>>>,
    flushing: Arc<AsyncMutex<()>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: Arc::default(), flushing: Arc::new(AsyncMutex::new(())) }
    }

    /// Offers a notification to the debouncer. Ineligible notifications are
    /// sent immediately via `sink`; eligible ones are buffered and flushed
    /// at most once per `window` per method.
    pub fn offer(&self, notification: Notification, sink: Sink) {
        if !notification.is_debounce_eligible() {
            sink(notification);
            return;
        }

        let method = notification.method.clone();
        let first_for_method = {
            let mut pending = self.pending.lock().unwrap();
            let was_empty = !pending.contains_key(&method);
            pending.insert(method.clone(), notification);
            was_empty
        };

        if !first_for_method {
            return;
        }

        let window = self.window;
        let pending = self.pending.clone();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(notification) = pending.lock().unwrap().remove(&method) {
                sink(notification);
            }
        });
    }

    /// Flushes every buffered notification immediately, bypassing the
    /// window. Used when the connection is closing and nothing further
    /// will arrive to coalesce with.
    pub async fn flush(&self, sink: Sink) {
        let _guard = self.flushing.lock().await;
        let drained: Vec<_> = self.pending.lock().unwrap().drain().map(|(_, n)| n).collect();
        for notification in drained {
            sink(notification);
        }
    }

    /// Drops every buffered notification without sending it. Used when the
    /// transport has already gone away and there's no peer left to flush to.
    pub fn discard(&self) {
        self.pending.lock().unwrap().clear();
    }
}
