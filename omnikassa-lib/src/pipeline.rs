//! Declarative requests in, classified responses out.
//!
//! An [`ApiRequest`] describes one call. The [`Gateway`] turns it into an
//! [`HttpRequest`], sends it through the injected transport and decodes the
//! reply. The [`RequestPipeline`] adds credential resolution on top: the access
//! token is only fetched when a request that needs it is actually sent.

use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::response::ApiResponse;
use crate::token::AccessTokenProvider;
use crate::transport::{HttpMethod, HttpRequest, HttpTransport, TransportError};
use crate::{OmnikassaError, Result};

/// Which secret goes into the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthorizationMode {
    /// No header.
    None,
    /// The configured refresh token.
    RefreshToken,
    /// The cached access token, refreshed on demand.
    AccessToken,
    /// A token supplied by the request itself.
    CustomToken(String),
}

impl fmt::Debug for AuthorizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::RefreshToken => f.write_str("RefreshToken"),
            Self::AccessToken => f.write_str("AccessToken"),
            Self::CustomToken(_) => f.write_str("CustomToken([REDACTED])"),
        }
    }
}

/// Body encodings understood by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Json,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
        }
    }
}

/// Description of one gateway call.
pub trait ApiRequest: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    /// Path below the base URL, starting with `/`.
    fn path(&self) -> String;

    fn authorization(&self) -> AuthorizationMode {
        AuthorizationMode::None
    }

    fn content_type(&self) -> Option<ContentType> {
        None
    }

    /// Encoded body, if any.
    fn body(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Sends already authorized requests to one base URL.
#[derive(Clone)]
pub struct Gateway {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl Gateway {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Assemble the wire request for `request` with an optional bearer secret.
    pub fn build(&self, request: &dyn ApiRequest, bearer: Option<&str>) -> Result<HttpRequest> {
        let mut headers = Vec::new();
        if let Some(token) = bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        if let Some(content_type) = request.content_type() {
            headers.push(("Content-Type".to_string(), content_type.mime().to_string()));
        }

        Ok(HttpRequest {
            method: request.method(),
            url: format!("{}{}", self.base_url, request.path()),
            headers,
            body: request.body()?,
        })
    }

    /// Build, send and decode `request`. Only transport errors are raised here;
    /// the returned response may still be a failure.
    pub async fn dispatch(&self, request: &dyn ApiRequest, bearer: Option<&str>) -> Result<ApiResponse> {
        let http_request = self.build(request, bearer)?;
        tracing::debug!(
            request = request.name(),
            method = %http_request.method,
            url = %http_request.url,
            "sending gateway request"
        );

        let response = self
            .transport
            .send(http_request)
            .await
            .map_err(|e| map_transport_error(request.name(), e))?;

        let response = ApiResponse::from_http(response);
        if response.is_success() {
            tracing::debug!(request = request.name(), status = response.status(), "gateway request succeeded");
        } else {
            tracing::warn!(request = request.name(), status = response.status(), "gateway request failed");
        }
        Ok(response)
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn map_transport_error(name: &str, e: TransportError) -> OmnikassaError {
    tracing::warn!(request = name, error = %e, "transport error");
    match e {
        TransportError::Timeout(cause) => {
            OmnikassaError::transport(format!("Request to Rabobank timed out: {}", cause))
        }
        other => OmnikassaError::transport(other.to_string()),
    }
}

/// Resolves credentials and sends requests through a [`Gateway`].
#[derive(Clone, Debug)]
pub struct RequestPipeline {
    gateway: Gateway,
    tokens: Arc<AccessTokenProvider>,
}

impl RequestPipeline {
    pub fn new(gateway: Gateway, tokens: Arc<AccessTokenProvider>) -> Self {
        Self { gateway, tokens }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn tokens(&self) -> &Arc<AccessTokenProvider> {
        &self.tokens
    }

    /// Send `request`, returning the decoded response whatever its status.
    pub async fn send(&self, request: &dyn ApiRequest) -> Result<ApiResponse> {
        let bearer = match request.authorization() {
            AuthorizationMode::None => None,
            AuthorizationMode::RefreshToken => Some(self.tokens.refresh_token().to_string()),
            AuthorizationMode::AccessToken => Some(self.tokens.current_token().await?.token().to_string()),
            AuthorizationMode::CustomToken(token) => Some(token),
        };
        self.gateway.dispatch(request, bearer.as_deref()).await
    }

    /// Send `request` and decode a successful body into `T`.
    pub async fn send_expecting<T: DeserializeOwned>(&self, request: &dyn ApiRequest) -> Result<T> {
        self.send(request).await?.decode()
    }
}
