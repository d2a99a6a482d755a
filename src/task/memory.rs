//! In-memory, insertion-ordered [`TaskStore`]

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::sync::{watch, RwLock};
use crate::error::{Error, ErrorCode};
use crate::task::TaskStore;
use crate::types::{Cursor, Pagination, Task, TaskPayload};

struct Entry {
    task: Task,
    tx: watch::Sender<Option<TaskPayload>>,
    rx: watch::Receiver<Option<TaskPayload>>,
}

/// Default [`TaskStore`]: a concurrent map plus a separate order vector,
/// since `DashMap` alone doesn't preserve insertion order, which
/// `tasks/list` pagination depends on.
#[derive(Default)]
pub struct InMemoryTaskStore {
    entries: DashMap<String, Entry>,
    order: RwLock<Vec<String>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(id: &str) -> Error {
        Error::new(ErrorCode::TaskError, format!("no such task: {id}"))
    }
}

impl TaskStore for InMemoryTaskStore {
    fn insert(&self, task: Task) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let id = task.id.clone();
            let (tx, rx) = watch::channel(None);
            self.entries.insert(id.clone(), Entry { task, tx, rx });
            self.order.write().await.push(id);
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, Option<Task>> {
        let id = id.to_string();
        Box::pin(async move { self.entries.get(&id).map(|e| e.task.clone()) })
    }

    fn update<'a>(
        &'a self,
        id: &'a str,
        f: Box<dyn FnOnce(&mut Task) -> Result<(), Error> + Send + 'a>,
    ) -> BoxFuture<'a, Result<Task, Error>> {
        Box::pin(async move {
            let mut entry = self.entries.get_mut(id).ok_or_else(|| Self::not_found(id))?;
            f(&mut entry.task)?;
            Ok(entry.task.clone())
        })
    }

    fn remove(&self, id: &str) -> BoxFuture<'_, Option<Task>> {
        let id = id.to_string();
        Box::pin(async move {
            let removed = self.entries.remove(&id).map(|(_, e)| e.task);
            if removed.is_some() {
                self.order.write().await.retain(|existing| existing != &id);
            }
            removed
        })
    }

    fn list(&self, cursor: Option<Cursor>, page_size: usize) -> BoxFuture<'_, (Vec<Task>, Option<Cursor>)> {
        Box::pin(async move {
            let order = self.order.read().await;
            let tasks: Vec<Task> = order
                .iter()
                .filter_map(|id| self.entries.get(id).map(|e| e.task.clone()))
                .collect();
            let page = tasks.paginate(cursor, page_size);
            (page.items.to_vec(), page.next_cursor)
        })
    }

    fn set_result(&self, id: &str, result: TaskPayload) -> BoxFuture<'_, ()> {
        let id = id.to_string();
        Box::pin(async move {
            if let Some(entry) = self.entries.get(&id) {
                let _ = entry.tx.send(Some(result));
            }
        })
    }

    fn result(&self, id: &str) -> BoxFuture<'_, Option<TaskPayload>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut rx = self.entries.get(&id)?.rx.clone();
            if let Some(result) = rx.borrow_and_update().clone() {
                return Some(result);
            }
            rx.changed().await.ok()?;
            rx.borrow().clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn it_preserves_insertion_order_across_pages() {
        let store = InMemoryTaskStore::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let task = Task::new();
            ids.push(task.id.clone());
            store.insert(task).await;
        }

        let (items, next_cursor) = store.list(None, 2).await;
        let returned: Vec<_> = items.iter().map(|t| t.id.clone()).collect();
        assert_eq!(returned, ids[0..2]);

        let (items, _) = store.list(next_cursor, 2).await;
        let returned: Vec<_> = items.iter().map(|t| t.id.clone()).collect();
        assert_eq!(returned, ids[2..4]);
    }

    #[tokio::test]
    async fn it_rejects_update_of_unknown_task() {
        let store = InMemoryTaskStore::new();
        let result = store.update("missing", Box::new(|_| Ok(()))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn it_delivers_result_set_before_the_wait() {
        let store = InMemoryTaskStore::new();
        let task = Task::new();
        let id = task.id.clone();
        store.insert(task).await;

        store.set_result(&id, TaskPayload(serde_json::json!("done"))).await;
        let result = store.result(&id).await.unwrap();
        assert_eq!(result.0, "done");
    }

    #[tokio::test]
    async fn it_wakes_on_result_set_after_the_wait_started() {
        let store = std::sync::Arc::new(InMemoryTaskStore::new());
        let task = Task::new();
        let id = task.id.clone();
        store.insert(task).await;

        let waiter = {
            let store = store.clone();
            let id = id.clone();
            tokio::spawn(async move { store.result(&id).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        store.set_result(&id, TaskPayload(serde_json::json!(42))).await;

        let result = waiter.await.unwrap().unwrap();
        assert_eq!(result.0, 42);
    }
}
