use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the GitHub REST API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error ({status}): {body}")]
    Status { status: StatusCode, body: String },
    #[error("GitHub request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to decode GitHub response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures starting or reading a chat completion stream.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("OpenAI API key not configured")]
    MissingApiKey,
    #[error("Chat completion request failed with status {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("Chat completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
