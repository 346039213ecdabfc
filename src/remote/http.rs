use super::TaskStore;
use crate::config::Config;
use crate::domain::{Highlight, NewTask, TaskPatch, TaskRecord};
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

/// [`TaskStore`] backed by the REST API
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: Client,
    base_url: String,
}

/// Build a [`reqwest::Client`] with the configured timeout
pub fn build_client(config: &Config) -> Result<Client, RemoteError> {
    Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!("taskin/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {e}")))
}

impl HttpTaskStore {
    pub fn new(config: &Config) -> Result<Self, RemoteError> {
        Ok(Self::with_client(build_client(config)?, &config.api_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and turn non-2xx statuses into errors
    async fn send(
        &self,
        method: &'static str,
        path: String,
        request: RequestBuilder,
    ) -> Result<Response, RemoteError> {
        debug!(method, path = %path, "task store request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                method,
                path,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// `GET /highlights`
    pub async fn list_highlights(&self) -> Result<Vec<Highlight>, RemoteError> {
        let path = "/highlights".to_string();
        let request = self.client.get(self.url(&path));
        let response = self.send("GET", path, request).await?;
        Ok(response.json().await?)
    }

    /// `DELETE /highlights/{id}`
    pub async fn delete_highlight(&self, id: &str) -> Result<(), RemoteError> {
        let path = format!("/highlights/{}", id);
        let request = self.client.delete(self.url(&path));
        self.send("DELETE", path, request).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self) -> Result<Vec<TaskRecord>, RemoteError> {
        let path = "/tasks".to_string();
        let request = self.client.get(self.url(&path));
        let response = self.send("GET", path, request).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, task: &NewTask) -> Result<TaskRecord, RemoteError> {
        let path = "/tasks".to_string();
        let request = self.client.post(self.url(&path)).json(task);
        let response = self.send("POST", path, request).await?;
        Ok(response.json().await?)
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<(), RemoteError> {
        let path = format!("/tasks/{}", id);
        let request = self.client.put(self.url(&path)).json(patch);
        self.send("PUT", path, request).await?;
        Ok(())
    }

    async fn complete(&self, id: &str) -> Result<(), RemoteError> {
        let path = format!("/tasks/{}/complete", id);
        let request = self.client.post(self.url(&path));
        self.send("POST", path, request).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let path = format!("/tasks/{}", id);
        let request = self.client.delete(self.url(&path));
        self.send("DELETE", path, request).await?;
        Ok(())
    }
}
