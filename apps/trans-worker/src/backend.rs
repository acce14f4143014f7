//! Language backend: an OpenAI-compatible chat-completions endpoint.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Anything that turns a prompt into a completion.
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

/// TLS settings for the backend client only. Nothing here touches
/// process-wide TLS state.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Skip certificate verification. Off unless explicitly enabled.
    pub accept_invalid_certs: bool,
    /// Extra PEM root certificate to trust.
    pub ca_cert_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub tls: TlsConfig,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [PromptMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Groq chat-completions client.
pub struct GroqBackend {
    http: reqwest::Client,
    api_url: String,
    authorization: String,
    model: String,
}

impl GroqBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);

        if config.tls.accept_invalid_certs {
            tracing::warn!(
                api_url = %config.api_url,
                "backend certificate verification disabled"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(path) = &config.tls.ca_cert_path {
            let pem = std::fs::read(path).map_err(|source| BackendError::CaCert {
                path: path.display().to_string(),
                source,
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        // Accept either a bare key or a full header value.
        let authorization = if config.api_key.starts_with("Bearer ") {
            config.api_key.clone()
        } else {
            format!("Bearer {}", config.api_key)
        };

        Ok(Self {
            http: builder.build()?,
            api_url: config.api_url.clone(),
            authorization,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageBackend for GroqBackend {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: [PromptMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(&self.api_url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        let completion: CompletionResponse = resp.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(BackendError::EmptyCompletion)
    }
}
