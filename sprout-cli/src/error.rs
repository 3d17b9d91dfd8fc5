use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Extractor error: {0}")]
    Extractor(#[from] sprout_parser::extractor::error::ExtractorError),

    #[error("Semaphore acquire error: {0}")]
    Semaphore(#[from] tokio::sync::AcquireError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No formats available for the provided URL")]
    NoFormatsAvailable,

    #[error("Format selection cancelled by user")]
    SelectionCancelled,

    #[error("Invalid format filter: {0}")]
    InvalidFilter(String),

    #[error("Timeout error: Operation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl CliError {
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    pub fn no_formats_found() -> Self {
        Self::NoFormatsAvailable
    }

    pub fn user_cancelled() -> Self {
        Self::SelectionCancelled
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
