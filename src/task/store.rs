//! The task store interface
//!
//! Persisting tasks across restarts, sharing them across processes, or
//! evicting them on a schedule are all receiver-specific concerns the
//! engine does not implement — it only depends on this trait, and ships an
//! in-memory default good enough for a single-process receiver.

use futures_util::future::BoxFuture;
use crate::error::Error;
use crate::types::{Cursor, Task, TaskPayload};

/// Abstract persistence for tasks tracked by the task sub-protocol engine.
///
/// Implementations must preserve **insertion order** for [`TaskStore::list`]
/// so that cursor-based pagination is stable across calls: a cursor taken
/// mid-list must still resolve to "everything after this point" even if
/// other tasks are inserted or removed concurrently elsewhere in the store.
pub trait TaskStore: Send + Sync {
    /// Inserts a newly created task.
    fn insert(&self, task: Task) -> BoxFuture<'_, ()>;

    /// Returns a task's current state without removing it.
    fn get(&self, id: &str) -> BoxFuture<'_, Option<Task>>;

    /// Applies `f` to the task's current state and persists the result.
    /// Returns [`ErrorCode::TaskError`](crate::error::ErrorCode::TaskError)
    /// if the task doesn't exist.
    fn update<'a>(
        &'a self,
        id: &'a str,
        f: Box<dyn FnOnce(&mut Task) -> Result<(), Error> + Send + 'a>,
    ) -> BoxFuture<'a, Result<Task, Error>>;

    /// Removes a task, returning its last known state.
    fn remove(&self, id: &str) -> BoxFuture<'_, Option<Task>>;

    /// Returns one page of tasks in insertion order, plus a cursor for the
    /// next page if more remain. `Page` itself borrows from its source slice
    /// and can't cross a `BoxFuture` boundary, so implementations hand back
    /// owned data instead.
    fn list(&self, cursor: Option<Cursor>, page_size: usize) -> BoxFuture<'_, (Vec<Task>, Option<Cursor>)>;

    /// Stores the completed/failed result payload for a task.
    fn set_result(&self, id: &str, result: TaskPayload) -> BoxFuture<'_, ()>;

    /// Returns the task's result once available, or resolves immediately
    /// if it already is. Implementations are expected to wake this future
    /// as soon as [`TaskStore::set_result`] is called for the same id.
    fn result(&self, id: &str) -> BoxFuture<'_, Option<TaskPayload>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::InMemoryTaskStore;

    #[tokio::test]
    async fn it_round_trips_through_the_trait_object() {
        let store: Box<dyn TaskStore> = Box::new(InMemoryTaskStore::new());
        let task = Task::new();
        let id = task.id.clone();

        store.insert(task).await;
        assert!(store.get(&id).await.is_some());

        store.remove(&id).await;
        assert!(store.get(&id).await.is_none());
    }
}
