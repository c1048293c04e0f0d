// Gateway Error Types
// Errors surfaced by the external generation service boundary

use thiserror::Error;

/// Marker the hosted API uses when a key cannot see the requested model
const ENTITY_NOT_FOUND_MARKER: &str = "requested entity was not found";

/// Generation Gateway Error
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Model or entity not found (the hosted API's signal for an unusable key)
    #[error("Requested entity was not found: {0}")]
    NotFound(String),

    /// Authentication failed
    #[error("Invalid or expired studio key: {0}")]
    AuthFailed(String),

    /// No studio key configured
    #[error("No studio key selected")]
    MissingCredential,

    /// Rate limited or quota exhausted
    #[error("Generation quota exceeded: {0}")]
    RateLimited(String),

    /// Connection failed
    #[error("Cannot connect to generation service: {0}")]
    ConnectionFailed(String),

    /// Request timeout
    #[error("Generation service response timeout")]
    Timeout,

    /// API error from provider
    #[error("Generation service error: {0}")]
    ApiError(String),

    /// Response could not be decoded
    #[error("Response parse error: {0}")]
    ParseError(String),

    /// Response decoded but carried no usable payload
    #[error("Generation service returned no {0}")]
    EmptyResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_connect() {
            GatewayError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            GatewayError::ParseError(err.to_string())
        } else {
            GatewayError::ApiError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::ParseError(err.to_string())
    }
}

impl From<base64::DecodeError> for GatewayError {
    fn from(err: base64::DecodeError) -> Self {
        GatewayError::ParseError(format!("invalid inline data: {}", err))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Io(err.to_string())
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error codes for the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorCode {
    NotFound,
    AuthFailed,
    MissingCredential,
    RateLimited,
    ConnectionFailed,
    Timeout,
    ApiError,
    ParseError,
    EmptyResponse,
    InvalidConfig,
    Io,
}

impl GatewayErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayErrorCode::NotFound => "GATEWAY_NOT_FOUND",
            GatewayErrorCode::AuthFailed => "GATEWAY_AUTH_FAILED",
            GatewayErrorCode::MissingCredential => "GATEWAY_MISSING_CREDENTIAL",
            GatewayErrorCode::RateLimited => "GATEWAY_RATE_LIMITED",
            GatewayErrorCode::ConnectionFailed => "GATEWAY_CONNECTION_FAILED",
            GatewayErrorCode::Timeout => "GATEWAY_TIMEOUT",
            GatewayErrorCode::ApiError => "GATEWAY_API_ERROR",
            GatewayErrorCode::ParseError => "GATEWAY_PARSE_ERROR",
            GatewayErrorCode::EmptyResponse => "GATEWAY_EMPTY_RESPONSE",
            GatewayErrorCode::InvalidConfig => "GATEWAY_INVALID_CONFIG",
            GatewayErrorCode::Io => "GATEWAY_IO_ERROR",
        }
    }
}

impl GatewayError {
    pub fn code(&self) -> GatewayErrorCode {
        match self {
            GatewayError::NotFound(_) => GatewayErrorCode::NotFound,
            GatewayError::AuthFailed(_) => GatewayErrorCode::AuthFailed,
            GatewayError::MissingCredential => GatewayErrorCode::MissingCredential,
            GatewayError::RateLimited(_) => GatewayErrorCode::RateLimited,
            GatewayError::ConnectionFailed(_) => GatewayErrorCode::ConnectionFailed,
            GatewayError::Timeout => GatewayErrorCode::Timeout,
            GatewayError::ApiError(_) => GatewayErrorCode::ApiError,
            GatewayError::ParseError(_) => GatewayErrorCode::ParseError,
            GatewayError::EmptyResponse(_) => GatewayErrorCode::EmptyResponse,
            GatewayError::InvalidConfig(_) => GatewayErrorCode::InvalidConfig,
            GatewayError::Io(_) => GatewayErrorCode::Io,
        }
    }

    /// Whether this error means the studio key is missing or unusable.
    ///
    /// Besides the dedicated variants, any provider message carrying a
    /// "not found" marker counts, since that is how the hosted API reports a
    /// key without access to the requested model.
    pub fn is_credential_error(&self) -> bool {
        match self {
            GatewayError::NotFound(_)
            | GatewayError::AuthFailed(_)
            | GatewayError::MissingCredential => true,
            GatewayError::ApiError(message) => {
                let lower = message.to_lowercase();
                lower.contains(ENTITY_NOT_FOUND_MARKER) || lower.contains("not found")
            }
            _ => false,
        }
    }
}

impl From<GatewayError> for String {
    fn from(err: GatewayError) -> Self {
        err.to_string()
    }
}
