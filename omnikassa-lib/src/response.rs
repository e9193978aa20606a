//! Response decoding and success/error classification.
//!
//! A response counts as successful only when the status is 2xx *and* the body
//! parses as JSON; callers rely on structured fields being present. Failures
//! are classified by [`classify_failure`], a pure function of the response
//! data:
//!
//! | status | body parses | outcome                                   |
//! |--------|-------------|-------------------------------------------|
//! | 2xx    | yes         | success                                   |
//! | 2xx    | no / empty  | [`OmnikassaError::TransportFailure`]      |
//! | other  | yes         | [`OmnikassaError::ApplicationFailure`]    |
//! | other  | no / empty  | [`OmnikassaError::TransportFailure`]      |

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

use crate::errors::{ApiErrorDetail, BODY_EXCERPT_LIMIT};
use crate::transport::HttpResponse;
use crate::{OmnikassaError, Result};

/// Decoded gateway response.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    status: u16,
    reason: String,
    raw_body: String,
    body: Option<Value>,
}

impl ApiResponse {
    /// Decode a raw response. Empty or non-JSON bodies leave `body` unset.
    pub fn from_http(response: HttpResponse) -> Self {
        let body = parse_body(&response.body);
        Self {
            status: response.status,
            reason: response.reason,
            raw_body: response.body,
            body,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// HTTP reason phrase.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Body exactly as received.
    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// Parsed JSON body, if the body was JSON.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Status is in the 2xx range.
    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 2xx with a structured body.
    pub fn is_success(&self) -> bool {
        self.is_http_success() && self.body.is_some()
    }

    /// The classified failure, or `None` for a successful response.
    pub fn error(&self) -> Option<OmnikassaError> {
        if self.is_success() {
            None
        } else {
            Some(classify_failure(
                self.status,
                &self.reason,
                self.body.as_ref(),
                &self.raw_body,
            ))
        }
    }

    /// The JSON body of a successful response, or the classified failure.
    pub fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error() {
            return Err(err);
        }
        self.body
            .ok_or_else(|| OmnikassaError::Decode("successful response without body".to_string()))
    }

    /// Decode the body of a successful response into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.into_result()?;
        serde_json::from_value(body).map_err(|e| OmnikassaError::Decode(e.to_string()))
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status: {}: {}\n{}",
            self.status,
            self.reason,
            describe_body(self.body.as_ref(), &self.raw_body)
        )
    }
}

fn parse_body(raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok().filter(|v: &Value| !v.is_null())
}

/// Body line used in failure messages.
fn describe_body(body: Option<&Value>, raw: &str) -> String {
    match body {
        Some(value) => format!("Body: {}", value),
        None if !raw.is_empty() => format!("Body (unparseable): {}", excerpt(raw)),
        None => "Body: empty".to_string(),
    }
}

/// At most [`BODY_EXCERPT_LIMIT`] characters of `raw`.
pub fn excerpt(raw: &str) -> String {
    raw.chars().take(BODY_EXCERPT_LIMIT).collect()
}

/// Choose the error kind for a response that is not a success.
///
/// Application failures require a non-2xx status with a structured body;
/// everything else is a transport failure.
pub fn classify_failure(
    status: u16,
    reason: &str,
    body: Option<&Value>,
    raw: &str,
) -> OmnikassaError {
    let http_success = (200..300).contains(&status);
    match body {
        Some(value) if !http_success => OmnikassaError::ApplicationFailure {
            status,
            status_text: reason.to_string(),
            detail: ApiErrorDetail::from_body(value),
        },
        _ => OmnikassaError::TransportFailure {
            status: Some(status),
            status_text: reason.to_string(),
            body_excerpt: describe_body(body, raw),
        },
    }
}
