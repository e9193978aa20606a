//! Cached access token with single-flight refresh.
//!
//! The provider owns one token slot. A refresh is issued when the slot is empty
//! or the cached token is within the safety margin of its expiry. Concurrent
//! callers that find the slot stale queue on one async guard; the first one
//! refreshes and the rest pick up its outcome, success or failure, instead of
//! calling the gateway again.

use chrono::Duration;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::models::{AccessToken, TokenState, TOKEN_EXPIRATION_MARGIN_SECONDS};
use crate::pipeline::Gateway;
use crate::requests::RefreshRequest;
use crate::{OmnikassaError, Result};

#[derive(Default)]
struct TokenSlot {
    token: Option<AccessToken>,
    /// Bumped after every completed refresh attempt.
    generation: u64,
    /// Failure of the attempt that produced `generation`.
    last_failure: Option<OmnikassaError>,
}

/// Injectable access token cache.
pub struct AccessTokenProvider {
    gateway: Gateway,
    refresh_token: String,
    clock: Arc<dyn Clock>,
    margin: Duration,
    slot: RwLock<TokenSlot>,
    refresh_guard: Mutex<()>,
}

impl AccessTokenProvider {
    pub fn new(gateway: Gateway, refresh_token: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            refresh_token: refresh_token.into(),
            clock,
            margin: Duration::seconds(TOKEN_EXPIRATION_MARGIN_SECONDS),
            slot: RwLock::new(TokenSlot::default()),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Refresh this long before `valid_until` instead of the default margin.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub(crate) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// State of the slot right now.
    pub fn state(&self) -> TokenState {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        match &slot.token {
            None => TokenState::Absent,
            Some(token) => token.state_at(self.clock.now(), self.margin),
        }
    }

    /// Drop the cached token so the next caller refreshes.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.token = None;
    }

    /// A usable access token, refreshing first when needed.
    pub async fn current_token(&self) -> Result<AccessToken> {
        let seen = {
            let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(token) = self.usable(&slot) {
                return Ok(token);
            }
            slot.generation
        };

        let _guard = self.refresh_guard.lock().await;

        {
            let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            if slot.generation != seen {
                // Another caller completed a refresh while this one waited.
                if let Some(err) = &slot.last_failure {
                    return Err(err.clone());
                }
                if let Some(token) = self.usable(&slot) {
                    return Ok(token);
                }
            }
        }

        let outcome = self.refresh().await;

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        match outcome {
            Ok(token) => {
                slot.token = Some(token.clone());
                slot.last_failure = None;
                Ok(token)
            }
            Err(err) => {
                slot.last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    fn usable(&self, slot: &TokenSlot) -> Option<AccessToken> {
        slot.token
            .as_ref()
            .filter(|token| !token.is_expiring_at(self.clock.now(), self.margin))
            .cloned()
    }

    #[tracing::instrument(name = "token_refresh", skip(self))]
    async fn refresh(&self) -> Result<AccessToken> {
        tracing::debug!("refreshing access token");
        let result = self
            .gateway
            .dispatch(&RefreshRequest, Some(&self.refresh_token))
            .await
            .and_then(|response| response.decode::<AccessToken>());

        match &result {
            Ok(token) => tracing::debug!(valid_until = %token.valid_until(), "access token refreshed"),
            Err(e) => tracing::warn!(error = %e, "access token refresh failed"),
        }
        result
    }
}

impl fmt::Debug for AccessTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenProvider")
            .field("gateway", &self.gateway)
            .field("state", &self.state())
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::requests::REFRESH_PATH;
    use crate::test_utils::{fixtures, MockTransport};
    use crate::transport::{HttpMethod, HttpResponse};
    use crate::OmnikassaErrorCode;

    const NOW: &str = "2020-01-01T00:00:00Z";

    fn provider(transport: Arc<MockTransport>, clock: Arc<FixedClock>) -> Arc<AccessTokenProvider> {
        let gateway = Gateway::new("https://www.example.com/sandbox", transport);
        Arc::new(AccessTokenProvider::new(gateway, fixtures::REFRESH_TOKEN, clock))
    }

    #[tokio::test]
    async fn test_absent_then_valid() {
        let transport = Arc::new(MockTransport::new());
        transport.reply_json(
            HttpMethod::Get,
            REFRESH_PATH,
            200,
            fixtures::refresh_json(fixtures::ACCESS_TOKEN, fixtures::FAR_FUTURE_VALID_UNTIL),
        );
        let provider = provider(transport.clone(), Arc::new(FixedClock::at(NOW)));

        assert_eq!(provider.state(), TokenState::Absent);
        let token = provider.current_token().await.unwrap();
        assert_eq!(token.token(), fixtures::ACCESS_TOKEN);
        assert_eq!(provider.state(), TokenState::Valid);

        provider.current_token().await.unwrap();
        assert_eq!(transport.count(HttpMethod::Get, REFRESH_PATH), 1);
        assert_eq!(
            transport.requests()[0].header("Authorization"),
            Some(format!("Bearer {}", fixtures::REFRESH_TOKEN).as_str())
        );
    }

    #[tokio::test]
    async fn test_expiring_token_is_replaced() {
        let transport = Arc::new(MockTransport::new());
        transport
            .reply_json(
                HttpMethod::Get,
                REFRESH_PATH,
                200,
                fixtures::refresh_json("first", "2020-01-01T01:00:00.000+0000"),
            )
            .reply_json(
                HttpMethod::Get,
                REFRESH_PATH,
                200,
                fixtures::refresh_json("second", fixtures::FAR_FUTURE_VALID_UNTIL),
            );
        let clock = Arc::new(FixedClock::at(NOW));
        let provider = provider(transport.clone(), clock.clone());

        assert_eq!(provider.current_token().await.unwrap().token(), "first");

        clock.advance(Duration::minutes(56));
        assert_eq!(provider.state(), TokenState::Expiring);

        assert_eq!(provider.current_token().await.unwrap().token(), "second");
        assert_eq!(provider.state(), TokenState::Valid);
        assert_eq!(transport.count(HttpMethod::Get, REFRESH_PATH), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates() {
        let transport = Arc::new(MockTransport::new());
        transport.reply(
            HttpMethod::Get,
            REFRESH_PATH,
            HttpResponse::new(401, r#"{"errorCode":5001,"errorMessage":"invalid refresh token"}"#),
        );
        let provider = provider(transport, Arc::new(FixedClock::at(NOW)));

        let err = provider.current_token().await.unwrap_err();
        assert_eq!(err.code(), OmnikassaErrorCode::ApplicationFailure);
        assert_eq!(provider.state(), TokenState::Absent);
    }

    #[tokio::test]
    async fn test_incomplete_refresh_body_is_decode_error() {
        let transport = Arc::new(MockTransport::new());
        transport.reply_json(HttpMethod::Get, REFRESH_PATH, 200, serde_json::json!({"token": "x"}));
        let provider = provider(transport, Arc::new(FixedClock::at(NOW)));

        let err = provider.current_token().await.unwrap_err();
        assert_eq!(err.code(), OmnikassaErrorCode::Decode);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_refresh() {
        let transport = Arc::new(
            MockTransport::new().with_delay(std::time::Duration::from_millis(100)),
        );
        transport.reply_json(
            HttpMethod::Get,
            REFRESH_PATH,
            200,
            fixtures::refresh_json(fixtures::ACCESS_TOKEN, fixtures::FAR_FUTURE_VALID_UNTIL),
        );
        let provider = provider(transport.clone(), Arc::new(FixedClock::at(NOW)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.current_token().await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.token(), fixtures::ACCESS_TOKEN);
        }
        assert_eq!(transport.count(HttpMethod::Get, REFRESH_PATH), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_failure() {
        let transport = Arc::new(
            MockTransport::new().with_delay(std::time::Duration::from_millis(100)),
        );
        transport.reply(HttpMethod::Get, REFRESH_PATH, HttpResponse::new(503, ""));
        let provider = provider(transport.clone(), Arc::new(FixedClock::at(NOW)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.current_token().await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err.code(), OmnikassaErrorCode::TransportFailure);
        }
        assert_eq!(transport.count(HttpMethod::Get, REFRESH_PATH), 1);

        // A later caller starts a fresh attempt.
        let _ = provider.current_token().await;
        assert_eq!(transport.count(HttpMethod::Get, REFRESH_PATH), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let transport = Arc::new(MockTransport::new());
        transport.reply_json(
            HttpMethod::Get,
            REFRESH_PATH,
            200,
            fixtures::refresh_json(fixtures::ACCESS_TOKEN, fixtures::FAR_FUTURE_VALID_UNTIL),
        );
        let provider = provider(transport.clone(), Arc::new(FixedClock::at(NOW)));

        provider.current_token().await.unwrap();
        provider.invalidate();
        assert_eq!(provider.state(), TokenState::Absent);
        provider.current_token().await.unwrap();
        assert_eq!(transport.count(HttpMethod::Get, REFRESH_PATH), 2);
    }
}
