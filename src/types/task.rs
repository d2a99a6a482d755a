//! Types for the task sub-protocol
//!
//! A task is a durable state machine that stands in for a request whose
//! answer isn't ready yet: the receiver hands back a [`Task`] immediately
//! and the requestor polls `tasks/get`/`tasks/result`, or waits for
//! `notifications/tasks/status`, until it reaches a terminal state.

use std::ops::{Deref, DerefMut};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use chrono::{DateTime, Utc};
use serde_json::Value;
use crate::error::{Error, ErrorCode};
use crate::types::{Cursor, Page};

/// The `_meta` key under which [`RelatedTaskMetadata`] is stamped.
pub const RELATED_TASK_KEY: &str = "io.modelcontextprotocol/related-task";

const DEFAULT_TTL_MS: usize = 30_000;

/// Method and notification names of the task sub-protocol.
pub mod commands {
    /// Returns a page of tasks currently tracked by the receiver.
    pub const LIST: &str = "tasks/list";

    /// Cancels a task.
    pub const CANCEL: &str = "tasks/cancel";

    /// Returns the result of a completed or failed task.
    pub const RESULT: &str = "tasks/result";

    /// Returns the current status of a task.
    pub const GET: &str = "tasks/get";

    /// Notifies the requestor that a task's status changed.
    pub const STATUS: &str = "notifications/tasks/status";
}

/// Params for `tasks/list`.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct ListTasksRequestParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

/// Result of `tasks/list`.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct ListTasksResult {
    pub tasks: Vec<Task>,

    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
}

/// Params for `tasks/cancel`.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct CancelTaskRequestParams {
    #[serde(rename = "taskId")]
    pub id: String,
}

/// Params for `tasks/get`.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct GetTaskRequestParams {
    #[serde(rename = "taskId")]
    pub id: String,
}

/// Params for `tasks/result`.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct GetTaskPayloadRequestParams {
    #[serde(rename = "taskId")]
    pub id: String,
}

/// The immediate acknowledgement returned in place of a direct result when
/// a request is executed as a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskResult {
    pub task: Task,

    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A task: the durable record of a request's execution state.
///
/// Each task is uniquely identified by a receiver-generated id and moves
/// through [`TaskStatus`] until it reaches `completed`, `failed` or
/// `cancelled`, after which no further status transition is permitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "taskId")]
    pub id: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "lastUpdatedAt")]
    pub last_updated_at: DateTime<Utc>,

    /// Retention duration from creation, in milliseconds.
    pub ttl: usize,

    pub status: TaskStatus,

    #[serde(rename = "statusMessage", skip_serializing_if = "Option::is_none")]
    pub status_msg: Option<String>,

    /// Suggested polling interval in milliseconds. Advisory only — the
    /// engine never measures or enforces it; see the task sub-protocol's
    /// open question on this field.
    #[serde(rename = "pollInterval", skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<usize>,
}

/// Task execution state.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "cancelled")]
    Cancelled,

    #[serde(rename = "completed")]
    Completed,

    #[serde(rename = "failed")]
    Failed,

    #[default]
    #[serde(rename = "working")]
    Working,

    #[serde(rename = "input_required")]
    InputRequired,
}

impl TaskStatus {
    /// A task in a terminal state accepts no further status transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

/// `task` field of a request's params, requesting task-augmented execution.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<usize>,
}

/// `_meta["io.modelcontextprotocol/related-task"]` value, stamping a
/// message (request or notification) as belonging to a task.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct RelatedTaskMetadata {
    #[serde(rename = "taskId")]
    pub id: String,
}

impl<T: Into<String>> From<T> for RelatedTaskMetadata {
    #[inline]
    fn from(value: T) -> Self {
        Self { id: value.into() }
    }
}

/// The result of `tasks/result`: the inner value matches the result type of
/// the request the task originally wrapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload(pub Value);

impl Deref for TaskPayload {
    type Target = Value;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for TaskPayload {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl TaskPayload {
    #[inline]
    pub fn into_inner(self) -> Value {
        self.0
    }

    #[inline]
    pub fn to<T: DeserializeOwned>(self) -> Result<T, Error> {
        serde_json::from_value::<T>(self.0).map_err(Error::from)
    }
}

impl<const N: usize> From<[Task; N]> for ListTasksResult {
    #[inline]
    fn from(tasks: [Task; N]) -> Self {
        Self { next_cursor: None, tasks: tasks.to_vec() }
    }
}

impl From<Vec<Task>> for ListTasksResult {
    #[inline]
    fn from(tasks: Vec<Task>) -> Self {
        Self { next_cursor: None, tasks }
    }
}

impl From<Page<'_, Task>> for ListTasksResult {
    #[inline]
    fn from(page: Page<'_, Task>) -> Self {
        Self { next_cursor: page.next_cursor, tasks: page.items.to_vec() }
    }
}

impl Default for Task {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl From<TaskMetadata> for Task {
    #[inline]
    fn from(meta: TaskMetadata) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
            ttl: meta.ttl.unwrap_or(DEFAULT_TTL_MS),
            status: TaskStatus::Working,
            status_msg: None,
            poll_interval: None,
        }
    }
}

impl CreateTaskResult {
    pub fn new(task: Task) -> Self {
        Self { task, meta: None }
    }
}

impl Task {
    /// Creates a new task in `working` status with the default 30s TTL.
    #[inline]
    pub fn new() -> Self {
        TaskMetadata::default().into()
    }

    /// Sets the status message and bumps `last_updated_at`.
    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.status_msg = Some(msg.into());
        self.last_updated_at = Utc::now();
    }

    /// Attempts a status transition, rejecting any transition out of a
    /// terminal state.
    fn transition(&mut self, status: TaskStatus) -> Result<(), Error> {
        if self.status.is_terminal() {
            return Err(Error::new(
                ErrorCode::TaskError,
                format!("task {} is already in terminal state {:?}", self.id, self.status),
            ));
        }
        self.status = status;
        self.last_updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), Error> {
        self.transition(TaskStatus::Cancelled)
    }

    pub fn complete(&mut self) -> Result<(), Error> {
        self.transition(TaskStatus::Completed)
    }

    pub fn fail(&mut self) -> Result<(), Error> {
        self.transition(TaskStatus::Failed)
    }

    pub fn require_input(&mut self) -> Result<(), Error> {
        self.transition(TaskStatus::InputRequired)
    }

    /// Returns the task back to `working`, e.g. after input was supplied.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.transition(TaskStatus::Working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_creates_task_in_working_status() {
        let task = Task::new();
        assert_eq!(task.status, TaskStatus::Working);
        assert_eq!(task.ttl, DEFAULT_TTL_MS);
    }

    #[test]
    fn it_rejects_transitions_out_of_terminal_state() {
        let mut task = Task::new();
        task.complete().unwrap();
        assert!(task.fail().is_err());
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn it_allows_reset_from_input_required() {
        let mut task = Task::new();
        task.require_input().unwrap();
        task.reset().unwrap();
        assert_eq!(task.status, TaskStatus::Working);
    }

    #[test]
    fn it_stamps_related_task_metadata_from_str() {
        let related: RelatedTaskMetadata = "task-1".into();
        assert_eq!(related.id, "task-1");
    }

    #[test]
    fn it_builds_list_result_from_page() {
        let tasks = vec![Task::new(), Task::new()];
        let page = Page { items: &tasks, next_cursor: Some(Cursor(2)) };
        let result: ListTasksResult = page.into();
        assert_eq!(result.tasks.len(), 2);
        assert_eq!(result.next_cursor, Some(Cursor(2)));
    }
}
