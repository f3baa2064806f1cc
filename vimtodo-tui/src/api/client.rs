use anyhow::{Context, Result};
use reqwest::{cookie::Jar, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::api::dev_backend::{DevBackend, DEV_USER_ID};
use crate::api::dto::{CreateTaskRequest, Envelope, UpdateTaskRequest};
use crate::api::error::ClientError;
use crate::api::request::{TaskChanges, TaskRequest, TaskResponse};
use crate::types::{Me, Task};

pub const SESSION_COOKIE: &str = "id";

/// HTTP client for vimtodo-api, or the in-memory [`DevBackend`] in dev mode.
///
/// Cheap to clone; clones share the connection pool and cookie jar, so calls
/// can be issued from spawned tasks.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    dev_backend: Option<DevBackend>,
}

impl ApiClient {
    pub fn new(base_url: &str, session_id: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid API URL: {}", base_url))?;
        let jar = Arc::new(Jar::default());

        jar.add_cookie_str(
            &format!("{}={}; Path=/", SESSION_COOKIE, session_id),
            &base_url,
        );

        let client = Client::builder()
            .cookie_provider(jar)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            dev_backend: None,
        })
    }

    pub fn dev() -> Result<Self> {
        let base_url = Url::parse("http://localhost")?;
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            dev_backend: Some(DevBackend::new()),
        })
    }

    pub fn is_dev(&self) -> bool {
        self.dev_backend.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Transport(format!("invalid URL for {}: {}", path, e)))
    }

    fn task_endpoint(&self, id: &str) -> Result<Url, ClientError> {
        self.endpoint(&format!("/tasks/{}", urlencoding::encode(id)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, url = %response.url(), "request failed");
            return Err(ClientError::from_status(status));
        }
        Ok(response)
    }

    async fn get_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let envelope: Envelope<T> = self.send(request).await?.json().await?;
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
    }

    async fn send_without_body(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let response = self.send(request).await?;
        let _ = response.bytes().await;
        Ok(())
    }

    pub async fn me(&self) -> Result<Me, ClientError> {
        if self.dev_backend.is_some() {
            return Ok(Me {
                id: DEV_USER_ID,
                email: "dev@localhost".to_string(),
                name: "Dev User".to_string(),
            });
        }

        self.get_data(self.client.get(self.endpoint("/me")?)).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        if let Some(dev) = &self.dev_backend {
            return Ok(dev.tasks());
        }

        self.get_data(self.client.get(self.endpoint("/tasks")?))
            .await
    }

    pub async fn create_task(&self, text: &str) -> Result<Task, ClientError> {
        if let Some(dev) = &self.dev_backend {
            return dev.create_task(text);
        }

        self.get_data(
            self.client
                .post(self.endpoint("/tasks")?)
                .json(&CreateTaskRequest { task: text }),
        )
        .await
    }

    pub async fn update_task(&self, id: &str, changes: &TaskChanges) -> Result<(), ClientError> {
        if let Some(dev) = &self.dev_backend {
            return dev.update_task(id, changes);
        }

        self.send_without_body(self.client.put(self.task_endpoint(id)?).json(
            &UpdateTaskRequest {
                task: changes.task.as_deref(),
                completed: changes.completed,
            },
        ))
        .await
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        if let Some(dev) = &self.dev_backend {
            return dev.delete_task(id);
        }

        self.send_without_body(self.client.delete(self.task_endpoint(id)?))
            .await
    }

    /// Run one queued model call.
    pub async fn execute(&self, request: TaskRequest) -> Result<TaskResponse, ClientError> {
        match request {
            TaskRequest::List => self.list_tasks().await.map(TaskResponse::Listed),
            TaskRequest::Create { text } => self.create_task(&text).await.map(TaskResponse::Created),
            TaskRequest::Update { id, changes } => self
                .update_task(&id, &changes)
                .await
                .map(|_| TaskResponse::Updated),
            TaskRequest::Delete { id } => self.delete_task(&id).await.map(|_| TaskResponse::Deleted),
        }
    }

    /// End the server-side session.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if self.dev_backend.is_some() {
            return Ok(());
        }

        self.send_without_body(self.client.get(self.endpoint("/logout")?))
            .await
    }
}
