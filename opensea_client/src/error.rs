use thiserror::Error;
use timeline_core::TimelineError;

#[derive(Error, Debug)]
pub enum OpenSeaError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication failed")]
    AuthError,

    #[error("Invalid wallet address: {address}")]
    InvalidAddress { address: String },

    #[error("Invalid collection contract address: {address}")]
    InvalidContract { address: String },

    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}
