use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcmapError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {0}: {1}")]
    Status(StatusCode, String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Insert rejected with {0}: {1}")]
    InsertRejected(StatusCode, String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("No account with code {0}")]
    RecordNotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AcmapError>;
