//! Task sub-protocol engine
//!
//! Wraps a [`TaskStore`] with the state-machine rules the wire protocol
//! expects: status transitions reject out of a terminal state, `_meta`
//! stamping links a message back to the task it belongs to, and the four
//! `tasks/*` methods are dispatched from here rather than threaded through
//! the general request handler.

use std::sync::Arc;
use serde_json::{json, Value};
use crate::error::{Error, ErrorCode};
use crate::task::TaskStore;
use crate::types::task::{
    commands, CancelTaskRequestParams, GetTaskPayloadRequestParams, GetTaskRequestParams,
    ListTasksRequestParams, ListTasksResult, RelatedTaskMetadata, RELATED_TASK_KEY,
};
use crate::types::{Task, TaskMetadata, TaskPayload};

/// Default page size for `tasks/list` when the caller doesn't specify one.
const DEFAULT_PAGE_SIZE: usize = 50;

/// Coordinates task creation, lookup and status transitions against a
/// [`TaskStore`]. One instance is shared by an engine's request dispatch and
/// its task-augmented handler invocations.
#[derive(Clone)]
pub struct TaskEngine {
    store: Arc<dyn TaskStore>,
}

impl TaskEngine {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Creates and persists a new task for a request executed asynchronously.
    pub async fn create(&self, meta: TaskMetadata) -> Task {
        let task = Task::from(meta);
        self.store.insert(task.clone()).await;
        task
    }

    /// Handles `tasks/get`.
    pub async fn get(&self, params: GetTaskRequestParams) -> Result<Task, Error> {
        self.store
            .get(&params.id)
            .await
            .ok_or_else(|| Self::not_found(&params.id))
    }

    /// Handles `tasks/list`.
    pub async fn list(&self, params: ListTasksRequestParams) -> ListTasksResult {
        let (tasks, next_cursor) = self.store.list(params.cursor, DEFAULT_PAGE_SIZE).await;
        ListTasksResult { tasks, next_cursor }
    }

    /// Handles `tasks/cancel`. Cancelling a task never cancels the in-flight
    /// request that created it and vice versa — the two cancellation paths
    /// (`notifications/cancelled` and `tasks/cancel`) are independent by
    /// construction: this method only ever touches the [`TaskStore`].
    pub async fn cancel(&self, params: CancelTaskRequestParams) -> Result<Task, Error> {
        let id = params.id;
        self.store
            .update(&id, Box::new(|task| task.cancel()))
            .await
    }

    /// Handles `tasks/result`.
    pub async fn result(&self, params: GetTaskPayloadRequestParams) -> Result<TaskPayload, Error> {
        self.store
            .result(&params.id)
            .await
            .ok_or_else(|| Self::not_found(&params.id))
    }

    /// Marks a task completed and stores its result payload.
    pub async fn complete(&self, id: &str, payload: TaskPayload) -> Result<Task, Error> {
        let task = self.store.update(id, Box::new(|task| task.complete())).await?;
        self.store.set_result(id, payload).await;
        Ok(task)
    }

    /// Marks a task failed and stores the error payload as its result.
    pub async fn fail(&self, id: &str, payload: TaskPayload) -> Result<Task, Error> {
        let task = self.store.update(id, Box::new(|task| task.fail())).await?;
        self.store.set_result(id, payload).await;
        Ok(task)
    }

    /// Marks a task as needing more input from the requestor.
    pub async fn require_input(&self, id: &str) -> Result<Task, Error> {
        self.store.update(id, Box::new(|task| task.require_input())).await
    }

    /// Builds the `_meta` object stamping a request or notification as
    /// belonging to `task_id`.
    pub fn stamp(task_id: &str) -> Value {
        json!({ RELATED_TASK_KEY: RelatedTaskMetadata::from(task_id) })
    }

    /// Returns true if `method` is one the task engine handles directly.
    pub fn owns(method: &str) -> bool {
        matches!(method, commands::GET | commands::LIST | commands::CANCEL | commands::RESULT)
    }

    fn not_found(id: &str) -> Error {
        Error::new(ErrorCode::TaskError, format!("no such task: {id}"))
    }
}
