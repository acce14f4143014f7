use reqwest::StatusCode;

/// Failures talking to the language backend.
///
/// The worker never drops a request over these: the error text becomes the
/// response content.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("backend response had no completion")]
    EmptyCompletion,
    #[error("failed to read CA certificate {path}: {source}")]
    CaCert {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
