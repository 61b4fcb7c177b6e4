//! HTTP client for an Ollama-compatible model daemon.
//!
//! Ollama API docs: https://github.com/ollama/ollama/blob/main/docs/api.md

use async_trait::async_trait;
use localgate_core::{DaemonConfig, ReadinessConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::readiness::{poll_until_ready, ProbeOutcome, ReadinessPolicy};
use crate::{build_messages, BackendError, ChatMessage, LlmBackend};

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    health_path: String,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl OllamaClient {
    pub fn new(daemon: &DaemonConfig, readiness: &ReadinessConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .connect_timeout(daemon.connect_timeout())
            .timeout(daemon.request_timeout())
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: daemon.url.trim_end_matches('/').to_string(),
            model: daemon.model.clone(),
            health_path: daemon.health_path.clone(),
            request_timeout: daemon.request_timeout(),
            probe_timeout: readiness.probe_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn classify(&self, error: reqwest::Error, timeout: Duration) -> BackendError {
        if error.is_connect() {
            BackendError::Unreachable {
                url: self.base_url.clone(),
                reason: error.to_string(),
            }
        } else if error.is_timeout() {
            BackendError::Timeout(timeout)
        } else if error.is_decode() {
            BackendError::InvalidResponse(error.to_string())
        } else {
            BackendError::Http(error.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Send a non-streaming chat request and return the reply text
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> Result<String, BackendError> {
        let model = model.unwrap_or(&self.model);
        let payload = OllamaChatRequest {
            model,
            messages,
            stream: false,
        };

        tracing::debug!("Sending {} messages to {} ({})", messages.len(), self.base_url, model);

        let response = self
            .http
            .post(self.url("/api/chat"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify(e, self.request_timeout))?;
        let response = Self::check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| self.classify(e, self.request_timeout))?;
        let parsed: OllamaChatResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("{}: {}", e, body)))?;

        let content = parsed
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| BackendError::InvalidResponse(format!("no content in response: {}", body)))?;

        tracing::debug!("Received {} chars from model daemon", content.len());
        Ok(content)
    }

    /// Names of models available on the daemon
    pub async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .http
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| self.classify(e, self.request_timeout))?;
        let response = Self::check_status(response).await?;

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Probe the daemon's health endpoint once
    pub async fn probe(&self) -> ProbeOutcome {
        let result = self
            .http
            .get(self.url(&self.health_path))
            .timeout(self.probe_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => ProbeOutcome::Ready,
            Ok(response) => ProbeOutcome::NotReady(format!("HTTP {}", response.status())),
            Err(e) => ProbeOutcome::Unreachable(e.to_string()),
        }
    }

    /// Poll the daemon until it is ready or `policy` gives up
    pub async fn wait_until_ready(&self, policy: &ReadinessPolicy) -> Result<(), BackendError> {
        poll_until_ready(&self.base_url, policy, || self.probe()).await
    }
}

#[async_trait]
impl LlmBackend for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        system_prompt: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, BackendError> {
        let messages = build_messages(prompt, history, system_prompt);
        self.chat(&messages, model).await
    }
}
