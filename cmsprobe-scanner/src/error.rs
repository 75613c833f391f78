use thiserror::Error;

/// Errors raised by the lookup client.
///
/// `Client` and `InvalidUrl` can only happen while building the client. The
/// rest are per-URL and never stop a run: the URL is recorded as unretrieved
/// and the client moves on to the next one.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API returned code {code}: {message}")]
    Status { code: i64, message: String },
}

pub type Result<T> = std::result::Result<T, ScanError>;
