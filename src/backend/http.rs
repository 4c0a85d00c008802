//! HTTP implementation of [`ChatBackend`] for the Flask/Ollama chat server.
//!
//! The server answers `/status`, `/chat` and `/clear` relative to one base
//! URL. Status codes are not trusted on their own: the server returns JSON
//! error bodies with 4xx codes, so bodies are always parsed first and the
//! status code only matters when the body is not JSON.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::backend::types::{ChatRequest, ChatResponse, StatusResponse};
use crate::backend::{BackendError, ChatBackend, ChatReply, ServiceStatus};

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Builds a backend rooted at `base_url`.
    ///
    /// Fails with [`BackendError::Config`] if the URL is not an absolute
    /// http(s) URL or the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| BackendError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::Config(format!(
                "unsupported URL scheme '{}' in '{base_url}'",
                parsed.scheme()
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Config(format!("failed to build HTTP client: {e}")))?;

        info!("HTTP backend at {} (timeout: {:?})", base_url, timeout);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Reads a response body and parses it as JSON, whatever the status code.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;

    match serde_json::from_str::<T>(&body) {
        Ok(parsed) => {
            if !status.is_success() {
                warn!("Backend returned HTTP {} with a JSON body", status.as_u16());
            }
            Ok(parsed)
        }
        Err(e) if status.is_success() => Err(BackendError::Parse(e.to_string())),
        Err(_) => Err(BackendError::Api {
            status: status.as_u16(),
            message: body,
        }),
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn check_status(&self) -> Result<ServiceStatus, BackendError> {
        let response = self
            .client
            .get(self.endpoint("status"))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        debug!("Status response: {}", response.status());
        let body: StatusResponse = read_json(response).await?;
        Ok(ServiceStatus::from(body))
    }

    async fn send_message(&self, message: &str) -> Result<ChatReply, BackendError> {
        info!("POST /chat ({} bytes)", message.len());

        let response = self
            .client
            .post(self.endpoint("chat"))
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        debug!("Chat response: {}", response.status());
        let body: ChatResponse = read_json(response).await?;
        if let Some(echo) = &body.user_message
            && echo != message
        {
            debug!("Backend echoed a different message ({} bytes)", echo.len());
        }
        Ok(ChatReply::from(body))
    }

    async fn clear(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint("clear"))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        // Any response at all means the request went through; the body is ignored.
        debug!("Clear response: {}", response.status());
        Ok(())
    }
}
