use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i32, message: String },

    #[error("ws service: request id is not set")]
    RequestIdNotSet,

    #[error("ws service: api key is not set")]
    ApiKeyNotSet,

    #[error("ws service: secret key is not set")]
    SecretKeyNotSet,

    #[error("Request id {0} is already waiting for a response")]
    DuplicateRequestId(String),

    #[error("Unsupported key type: {0:?}")]
    UnsupportedKeyType(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("WebSocket not connected")]
    NotConnected,

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("No response for request {request_id} within {timeout:?}")]
    Timeout {
        request_id: String,
        timeout: Duration,
    },

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Other error: {0}")]
    Other(String),
}

impl ExchangeError {
    /// The exchange did not answer in time; the connection may still be healthy.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The transport failed underneath the request.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_)
                | Self::ConnectionTimeout(_)
                | Self::ConnectionClosed(_)
                | Self::NotConnected
        )
    }

    /// Validation failures are raised before any I/O and are never worth retrying.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::RequestIdNotSet | Self::ApiKeyNotSet | Self::SecretKeyNotSet
        )
    }
}
