//! Typed error handling for revops
//!
//! Errors are grouped by category so callers can match on what went wrong
//! instead of inspecting strings.
//!
//! # Error Categories
//!
//! - [`FilterError`]: a filter list that cannot be decoded or validated
//! - [`ConfigError`]: configuration parsing and validation
//! - [`ValidationError`]: other malformed input
//! - [`TransportError`]: failures talking to the backend
//! - [`RequestError`]: HTTP request problems on the server side
//!
//! The list controller, grouping engine and permission gate never surface
//! these for malformed input; they degrade instead. Errors flow out of the
//! REST client and the reference server.
//!
//! # Example
//!
//! ```rust,ignore
//! use revops::prelude::*;
//!
//! match client.list_accounts(&params).await {
//!     Ok(accounts) => render(accounts),
//!     Err(RevOpsError::Transport(TransportError::Timeout { .. })) => show_retry_banner(),
//!     Err(e) => eprintln!("load failed: {}", e),
//! }
//! ```

use crate::core::filter::FilterError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The main error type for revops
#[derive(Debug)]
pub enum RevOpsError {
    /// Filter list could not be decoded or validated
    Filter(FilterError),

    /// Configuration errors
    Config(ConfigError),

    /// Validation errors
    Validation(ValidationError),

    /// Backend communication errors
    Transport(TransportError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for RevOpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevOpsError::Filter(e) => write!(f, "{}", e),
            RevOpsError::Config(e) => write!(f, "{}", e),
            RevOpsError::Validation(e) => write!(f, "{}", e),
            RevOpsError::Transport(e) => write!(f, "{}", e),
            RevOpsError::Request(e) => write!(f, "{}", e),
            RevOpsError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for RevOpsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RevOpsError::Filter(e) => Some(e),
            RevOpsError::Config(e) => Some(e),
            RevOpsError::Validation(e) => Some(e),
            RevOpsError::Transport(e) => Some(e),
            RevOpsError::Request(e) => Some(e),
            RevOpsError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RevOpsError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RevOpsError::Filter(_) => StatusCode::BAD_REQUEST,
            RevOpsError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RevOpsError::Validation(_) => StatusCode::BAD_REQUEST,
            RevOpsError::Transport(e) => e.status_code(),
            RevOpsError::Request(e) => e.status_code(),
            RevOpsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            RevOpsError::Filter(_) => "INVALID_FILTER",
            RevOpsError::Config(_) => "CONFIG_ERROR",
            RevOpsError::Validation(_) => "VALIDATION_ERROR",
            RevOpsError::Transport(e) => e.error_code(),
            RevOpsError::Request(e) => e.error_code(),
            RevOpsError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            RevOpsError::Filter(FilterError::IncompatibleOperator {
                field,
                field_type,
                operator,
            }) => Some(serde_json::json!({
                "field": field,
                "type": field_type.as_str(),
                "operator": operator.as_str()
            })),
            RevOpsError::Request(RequestError::UnknownObjectType { object_type }) => {
                Some(serde_json::json!({ "objectType": object_type }))
            }
            RevOpsError::Transport(TransportError::Status { status, .. }) => {
                Some(serde_json::json!({ "status": status }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for RevOpsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, code = self.error_code(), "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<FilterError> for RevOpsError {
    fn from(err: FilterError) -> Self {
        RevOpsError::Filter(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    FileNotFound { path: String },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for RevOpsError {
    fn from(err: ConfigError) -> Self {
        RevOpsError::Config(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Invalid value for a named parameter
    InvalidParameter {
        parameter: String,
        value: String,
        message: String,
    },

    /// Invalid JSON format
    InvalidJson { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidParameter {
                parameter,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for parameter '{}': {}",
                    value, parameter, message
                )
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for RevOpsError {
    fn from(err: ValidationError) -> Self {
        RevOpsError::Validation(err)
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised while talking to the backend
#[derive(Debug)]
pub enum TransportError {
    /// The request did not complete within the configured timeout
    Timeout { url: String },

    /// The backend could not be reached
    Connect { url: String, message: String },

    /// The backend answered with a non-success status
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// The response body did not match the expected shape
    Decode { url: String, message: String },

    /// The request could not be built
    InvalidUrl { url: String, message: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout { url } => {
                write!(f, "Request to '{}' timed out", url)
            }
            TransportError::Connect { url, message } => {
                write!(f, "Failed to connect to '{}': {}", url, message)
            }
            TransportError::Status {
                url,
                status,
                message,
            } => {
                write!(f, "'{}' responded with {}: {}", url, status, message)
            }
            TransportError::Decode { url, message } => {
                write!(f, "Failed to decode response from '{}': {}", url, message)
            }
            TransportError::InvalidUrl { url, message } => {
                write!(f, "Invalid request URL '{}': {}", url, message)
            }
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TransportError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            TransportError::Connect { .. } => StatusCode::BAD_GATEWAY,
            TransportError::Status { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            TransportError::Decode { .. } => StatusCode::BAD_GATEWAY,
            TransportError::InvalidUrl { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Timeout { .. } => "UPSTREAM_TIMEOUT",
            TransportError::Connect { .. } => "UPSTREAM_UNREACHABLE",
            TransportError::Status { .. } => "UPSTREAM_STATUS",
            TransportError::Decode { .. } => "UPSTREAM_DECODE",
            TransportError::InvalidUrl { .. } => "INVALID_URL",
        }
    }

    /// Whether repeating the same idempotent request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout { .. } | TransportError::Connect { .. } => true,
            TransportError::Status { status, .. } => *status >= 500,
            TransportError::Decode { .. } | TransportError::InvalidUrl { .. } => false,
        }
    }
}

impl From<TransportError> for RevOpsError {
    fn from(err: TransportError) -> Self {
        RevOpsError::Transport(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// Missing required header
    MissingHeader { header: String },

    /// Unauthorized request
    Unauthorized { message: String },

    /// Object type has no field metadata
    UnknownObjectType { object_type: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MissingHeader { header } => {
                write!(f, "Missing required header: {}", header)
            }
            RequestError::Unauthorized { message } => {
                write!(f, "Unauthorized: {}", message)
            }
            RequestError::UnknownObjectType { object_type } => {
                write!(f, "Unknown object type: {}", object_type)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::MissingHeader { .. } => StatusCode::UNAUTHORIZED,
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RequestError::UnknownObjectType { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::MissingHeader { .. } => "MISSING_HEADER",
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::UnknownObjectType { .. } => "UNKNOWN_OBJECT_TYPE",
        }
    }
}

impl From<RequestError> for RevOpsError {
    fn from(err: RequestError) -> Self {
        RevOpsError::Request(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for RevOpsError {
    fn from(err: serde_json::Error) -> Self {
        RevOpsError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for RevOpsError {
    fn from(err: std::io::Error) -> Self {
        RevOpsError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for RevOpsError {
    fn from(err: serde_yaml::Error) -> Self {
        RevOpsError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<reqwest::Error> for RevOpsError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        let transport = if err.is_timeout() {
            TransportError::Timeout { url }
        } else if err.is_connect() {
            TransportError::Connect {
                url,
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            TransportError::Status {
                url,
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            TransportError::Decode {
                url,
                message: err.to_string(),
            }
        } else if err.is_builder() {
            TransportError::InvalidUrl {
                url,
                message: err.to_string(),
            }
        } else {
            TransportError::Connect {
                url,
                message: err.to_string(),
            }
        };
        RevOpsError::Transport(transport)
    }
}

/// Convert from anyhow::Error, keeping only the message
impl From<anyhow::Error> for RevOpsError {
    fn from(err: anyhow::Error) -> Self {
        RevOpsError::Internal(err.to_string())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for revops operations
pub type RevOpsResult<T> = Result<T, RevOpsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldType;
    use crate::core::filter::FilterOperator;

    #[test]
    fn test_filter_error_maps_to_bad_request() {
        let err: RevOpsError = FilterError::IncompatibleOperator {
            field: "Name".to_string(),
            field_type: FieldType::String,
            operator: FilterOperator::GreaterThan,
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_FILTER");

        let response = err.to_response();
        let details = response.details.unwrap();
        assert_eq!(details["operator"], "gt");
        assert_eq!(details["type"], "string");
    }

    #[test]
    fn test_request_error_status_codes() {
        let err = RequestError::MissingHeader {
            header: "x-user-id".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = RequestError::UnknownObjectType {
            object_type: "Lead".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("Lead"));
    }

    #[test]
    fn test_transport_retryability() {
        let timeout = TransportError::Timeout {
            url: "http://localhost/api/accounts".to_string(),
        };
        assert!(timeout.is_retryable());

        let unavailable = TransportError::Status {
            url: "http://localhost/api/accounts".to_string(),
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(unavailable.is_retryable());
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let bad_request = TransportError::Status {
            url: "http://localhost/api/accounts".to_string(),
            status: 400,
            message: "bad filter".to_string(),
        };
        assert!(!bad_request.is_retryable());

        let decode = TransportError::Decode {
            url: "http://localhost/api/accounts".to_string(),
            message: "expected array".to_string(),
        };
        assert!(!decode.is_retryable());
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: RevOpsError = json_err.into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            file: Some("dashboard.yaml".to_string()),
            message: "bad indent".to_string(),
        };
        assert!(err.to_string().contains("dashboard.yaml"));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: RevOpsError = anyhow::anyhow!("lock poisoned").into();
        assert!(matches!(err, RevOpsError::Internal(ref m) if m == "lock poisoned"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
