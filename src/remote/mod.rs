//! Remote task store: the HTTP API that owns task state.

pub mod http;

use crate::domain::{NewTask, TaskPatch, TaskRecord};
use crate::error::RemoteError;
use async_trait::async_trait;

pub use http::HttpTaskStore;

/// Async interface to the task store
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// `GET /tasks`
    async fn list(&self) -> Result<Vec<TaskRecord>, RemoteError>;

    /// `POST /tasks`, returning the record with its server-assigned id
    async fn create(&self, task: &NewTask) -> Result<TaskRecord, RemoteError>;

    /// `PUT /tasks/{id}` with a partial body
    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<(), RemoteError>;

    /// `POST /tasks/{id}/complete`
    async fn complete(&self, id: &str) -> Result<(), RemoteError>;

    /// `DELETE /tasks/{id}`
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}
