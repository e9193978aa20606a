//! Error types for OmniKassa operations.
//!
//! Every public operation returns [`OmnikassaError`]. Nothing in this crate
//! retries on its own; callers decide what to do with a failure, using
//! [`OmnikassaError::is_retryable`] as a hint.

use serde::{Deserialize, Serialize};

/// Maximum number of raw body characters kept on a transport failure.
pub const BODY_EXCERPT_LIMIT: usize = 500;

/// Error codes for FFI and logging integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum OmnikassaErrorCode {
    /// Missing or invalid configuration
    Configuration = 1000,
    /// Signature verification failed
    Authenticity = 2000,
    /// Notification expired or about to expire
    Freshness = 2001,
    /// Transport/protocol level failure without structured detail
    TransportFailure = 3000,
    /// Remote API rejected the request with a structured error body
    ApplicationFailure = 3001,
    /// Structured payload could not be decoded into the expected type
    Decode = 4000,
    /// Locally built input rejected before sending
    InvalidInput = 4001,
}

/// Structured error detail returned by the gateway on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Numeric error code assigned by the gateway.
    pub error_code: Option<i64>,
    /// Technical error message.
    pub error_message: Option<String>,
    /// Message suitable for showing to a consumer.
    pub consumer_message: Option<String>,
    /// The full parsed body.
    pub raw: serde_json::Value,
}

impl ApiErrorDetail {
    /// Pull the well-known fields out of a parsed error body.
    ///
    /// Unknown shapes are kept intact in `raw`.
    pub fn from_body(body: &serde_json::Value) -> Self {
        Self {
            error_code: body.get("errorCode").and_then(|v| {
                v.as_i64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            }),
            error_message: body
                .get("errorMessage")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            consumer_message: body
                .get("consumerMessage")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw: body.clone(),
        }
    }
}

/// Comprehensive error type for OmniKassa operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OmnikassaError {
    /// A required setting is missing or unusable.
    #[error("config setting '{setting}' {reason}")]
    Configuration {
        /// Name of the offending setting
        setting: String,
        /// What is wrong with it
        reason: String,
    },

    /// A signature did not verify.
    #[error("invalid signature on {subject}")]
    Authenticity {
        /// What carried the signature (e.g. "notification")
        subject: String,
    },

    /// A notification expired or is within the safety margin of expiring.
    #[error("notification expiring or expired (expiry {expiry})")]
    Freshness {
        /// The expiry as received
        expiry: String,
    },

    /// Non-2xx or timeout without a usable structured body.
    #[error("Status: {}: {status_text}\n{body_excerpt}", status_label(.status))]
    TransportFailure {
        /// HTTP status code, absent when no response arrived
        status: Option<u16>,
        /// HTTP reason phrase or transport error description
        status_text: String,
        /// Bounded description of the body (see [`BODY_EXCERPT_LIMIT`])
        body_excerpt: String,
    },

    /// Non-2xx with a structured error body.
    #[error("Status: {status}: {status_text}\nBody: {}", detail_body(.detail))]
    ApplicationFailure {
        /// HTTP status code
        status: u16,
        /// HTTP reason phrase
        status_text: String,
        /// Parsed error detail
        detail: ApiErrorDetail,
    },

    /// A payload parsed as JSON but not into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// A value built by the caller cannot be sent as is.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

fn detail_body(detail: &ApiErrorDetail) -> String {
    detail.raw.to_string()
}

impl OmnikassaError {
    /// Get the error code for FFI/logging integration.
    pub fn code(&self) -> OmnikassaErrorCode {
        match self {
            Self::Configuration { .. } => OmnikassaErrorCode::Configuration,
            Self::Authenticity { .. } => OmnikassaErrorCode::Authenticity,
            Self::Freshness { .. } => OmnikassaErrorCode::Freshness,
            Self::TransportFailure { .. } => OmnikassaErrorCode::TransportFailure,
            Self::ApplicationFailure { .. } => OmnikassaErrorCode::ApplicationFailure,
            Self::Decode(_) => OmnikassaErrorCode::Decode,
            Self::InvalidInput { .. } => OmnikassaErrorCode::InvalidInput,
        }
    }

    /// Get the error message as an owned String.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns true if repeating the same call might succeed.
    ///
    /// Only transport failures qualify. Signature and freshness failures never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportFailure { .. })
    }

    /// Whether the failure carries machine-readable detail from the gateway.
    pub fn api_detail(&self) -> Option<&ApiErrorDetail> {
        match self {
            Self::ApplicationFailure { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// Create a configuration error for a setting that was not supplied.
    pub fn missing_setting(setting: impl Into<String>) -> Self {
        Self::Configuration {
            setting: setting.into(),
            reason: "missing".to_string(),
        }
    }

    /// Create a configuration error for a setting that was supplied but is unusable.
    pub fn invalid_setting(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    /// Create an error for caller-supplied input that fails validation.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an authenticity error.
    pub fn authenticity(subject: impl Into<String>) -> Self {
        Self::Authenticity {
            subject: subject.into(),
        }
    }

    /// Create a transport failure for a call that never produced a response.
    pub fn transport(description: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: None,
            status_text: description.into(),
            body_excerpt: "Body: empty".to_string(),
        }
    }
}

impl From<serde_json::Error> for OmnikassaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
