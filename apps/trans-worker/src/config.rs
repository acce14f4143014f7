use std::path::PathBuf;
use std::time::Duration;

use crate::backend::{BackendConfig, TlsConfig};

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Worker configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection string for the topic bus.
    pub redis_url: String,
    /// Consumer group joined on every request topic.
    pub consumer_group: String,
    pub backend: BackendConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            redis_url: required_var("REDIS_URL"),
            consumer_group: optional_var("CONSUMER_GROUP").unwrap_or_else(|| "chat-group".to_string()),
            backend: BackendConfig {
                api_url: optional_var("GROQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                api_key: required_var("GROQ_API_KEY"),
                model: optional_var("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                tls: TlsConfig {
                    accept_invalid_certs: optional_var("BACKEND_ACCEPT_INVALID_CERTS")
                        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                        .unwrap_or(false),
                    ca_cert_path: optional_var("BACKEND_CA_CERT").map(PathBuf::from),
                },
            },
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
