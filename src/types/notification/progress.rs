//! Progress and cancellation notifications

use serde::{Serialize, Deserialize};
use crate::types::notification::Notification;
use crate::types::{ProgressToken, RequestId};

/// An out-of-band notification informing the requestor of progress on a
/// long-running request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressNotification {
    /// The progress token given in the original request's `_meta`, used to
    /// associate this notification with the request that is proceeding.
    #[serde(rename = "progressToken")]
    pub progress_token: ProgressToken,

    /// The progress thus far. Should increase every time progress is made,
    /// even if the total is unknown.
    pub progress: f64,

    /// Total number of items to process (or total progress required), if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,

    /// Human-readable description of the current progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Requests cancellation of an in-flight request. A no-op if the request has
/// already completed or was never issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelledNotification {
    /// The id of the request to cancel.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,

    /// Optional human-readable reason for the cancellation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<ProgressNotification> for Notification {
    #[inline]
    fn from(progress: ProgressNotification) -> Self {
        Self::new(
            super::commands::PROGRESS,
            serde_json::to_value(progress).ok(),
        )
    }
}

impl From<CancelledNotification> for Notification {
    #[inline]
    fn from(cancelled: CancelledNotification) -> Self {
        Self::new(
            super::commands::CANCELLED,
            serde_json::to_value(cancelled).ok(),
        )
    }
}
