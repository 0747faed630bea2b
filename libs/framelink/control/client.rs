use super::types::MonitorTask;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Not authorized")]
    Unauthorized,

    #[error("Monitor task not found")]
    NotFound,

    #[error("API error: {0}")]
    ApiError(String),
}

pub type Result<T> = std::result::Result<T, ControlError>;

/// Error body shape the backend uses for failures
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Monitor-task REST client
///
/// Start the remote task before opening its stream, stop it before tearing
/// the stream down for good.
pub struct ControlClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl ControlClient {
    /// Create a client for an unauthenticated backend (tests, local dev)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            client: Client::new(),
        }
    }

    /// Create a client that sends `Authorization: Bearer <token>`
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: Some(token.into()),
            client: Client::new(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Start the remote monitor task; must succeed before opening its stream
    pub async fn start_task(&self, monitor_id: i64) -> Result<()> {
        let url = format!("{}/monitor-tasks/{}/start", self.base_url, monitor_id);
        debug!("POST {}", url);
        let response = self.authorized(self.client.post(&url)).send().await?;
        check_status(response).await?;
        info!("Started monitor task {}", monitor_id);
        Ok(())
    }

    /// Stop the remote monitor task; call before the terminal stream teardown
    pub async fn stop_task(&self, monitor_id: i64) -> Result<()> {
        let url = format!("{}/monitor-tasks/{}/stop", self.base_url, monitor_id);
        debug!("POST {}", url);
        let response = self.authorized(self.client.post(&url)).send().await?;
        check_status(response).await?;
        info!("Stopped monitor task {}", monitor_id);
        Ok(())
    }

    /// Fetch all monitor tasks (the dashboard polls this to find running ones)
    pub async fn list_tasks(&self) -> Result<Vec<MonitorTask>> {
        let url = format!("{}/monitor-tasks", self.base_url);
        debug!("GET {}", url);
        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Fetch one monitor task by id
    pub async fn get_task(&self, monitor_id: i64) -> Result<MonitorTask> {
        let tasks = self.list_tasks().await?;
        tasks
            .into_iter()
            .find(|task| task.id == monitor_id)
            .ok_or(ControlError::NotFound)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ControlError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ControlError::NotFound),
        status => {
            let detail = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.detail)
                .unwrap_or_else(|_| status.to_string());
            Err(ControlError::ApiError(detail))
        }
    }
}
