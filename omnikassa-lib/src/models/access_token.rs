//! Bearer token issued by the refresh endpoint.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Deserialize;
use std::fmt;

use crate::timestamp::WireTimestamp;

/// Remaining lifetime below which a token is refreshed before use.
pub const EXPIRATION_MARGIN_SECONDS: i64 = 300;

/// Lifecycle of the single cached token slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
    /// Nothing cached yet.
    Absent,
    /// Cached and usable.
    Valid,
    /// Cached but within the safety margin of `valid_until`.
    Expiring,
}

/// An access token and its validity window. Never mutated after creation.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    token: String,
    valid_until: WireTimestamp,
    #[serde(default, rename = "durationInMillis")]
    duration_in_millis: Option<i64>,
}

impl AccessToken {
    /// Create a token valid until `valid_until`.
    pub fn new(token: impl Into<String>, valid_until: DateTime<FixedOffset>) -> Self {
        Self {
            token: token.into(),
            valid_until: WireTimestamp::from_datetime(valid_until),
            duration_in_millis: None,
        }
    }

    /// The opaque bearer value.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// End of validity.
    pub fn valid_until(&self) -> DateTime<FixedOffset> {
        self.valid_until.value()
    }

    /// Lifetime as announced by the gateway, if it sent one.
    pub fn duration(&self) -> Option<Duration> {
        self.duration_in_millis.map(Duration::milliseconds)
    }

    /// Whether the remaining lifetime at `now` is within `margin`.
    pub fn is_expiring_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.valid_until.value() <= now + margin
    }

    /// State of this token at `now` under `margin`.
    pub fn state_at(&self, now: DateTime<Utc>, margin: Duration) -> TokenState {
        if self.is_expiring_at(now, margin) {
            TokenState::Expiring
        } else {
            TokenState::Valid
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("valid_until", &self.valid_until.raw())
            .field("duration_in_millis", &self.duration_in_millis)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn margin() -> Duration {
        Duration::seconds(EXPIRATION_MARGIN_SECONDS)
    }

    #[test]
    fn test_parse_refresh_payload() {
        let token: AccessToken = serde_json::from_str(
            r#"{"token":"myAccEssT0ken","validUntil":"2099-12-31T23:59:59.999+0000","durationInMillis":28800000}"#,
        )
        .unwrap();
        assert_eq!(token.token(), "myAccEssT0ken");
        assert_eq!(token.duration(), Some(Duration::hours(8)));
    }

    #[test]
    fn test_expiry_states() {
        let now = Utc::now();
        let fresh = AccessToken::new("a", (now + Duration::hours(1)).fixed_offset());
        assert_eq!(fresh.state_at(now, margin()), TokenState::Valid);

        let close = AccessToken::new("b", (now + Duration::seconds(60)).fixed_offset());
        assert_eq!(close.state_at(now, margin()), TokenState::Expiring);

        let boundary = AccessToken::new("c", (now + margin()).fixed_offset());
        assert!(boundary.is_expiring_at(now, margin()));
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("s3cr3t", Utc::now().fixed_offset());
        assert!(!format!("{:?}", token).contains("s3cr3t"));
    }
}
