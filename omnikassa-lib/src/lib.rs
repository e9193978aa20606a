//! Rabobank OmniKassa 2.0 client.
//!
//! The crate covers the signing and credential core of the gateway:
//!
//! - **Canonical signing**: deterministic field serialization
//!   ([`canonical`]) and HMAC-SHA512 signatures ([`signature`])
//! - **Access tokens**: an injectable cache that single-flights refreshes
//!   ([`AccessTokenProvider`])
//! - **Requests**: declarative calls resolved through one pipeline
//!   ([`pipeline`]) with strict success/error classification ([`response`])
//! - **Status pulls**: verified, paginated result retrieval driven by webhook
//!   notifications ([`StatusPullCoordinator`])
//!
//! Network access goes through the [`transport::HttpTransport`] trait. With the
//! default `http-client` feature a reqwest-backed implementation is provided.
//!
//! # Example
//!
//! ```ignore
//! use omnikassa_lib::{Money, MerchantOrder, Omnikassa, OmnikassaConfig};
//!
//! let client = Omnikassa::new(OmnikassaConfig::from_env()?)?;
//!
//! let order = MerchantOrder::new("order-1", Money::eur(4999), "https://shop.example/return");
//! let redirect = client.announce_order(order).await?;
//! println!("pay at {}", redirect.redirect_url());
//!
//! // Later, in the webhook handler:
//! let notification = client.notification_from_json(&body)?;
//! client
//!     .status_pull(&notification, |result| println!("{}: {}", result.merchant_order_id(), result.order_status()))
//!     .await?;
//! ```

pub mod canonical;
pub mod client;
pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod prelude;
pub mod pull;
pub mod requests;
pub mod response;
pub mod signature;
pub mod timestamp;
pub mod token;
pub mod transport;

/// Test utilities: scripted transport, fixed clock and signed fixtures.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use canonical::{Canonical, CanonicalSerializer, FieldSpec, FieldValue};
pub use client::Omnikassa;
pub use clock::{Clock, SystemClock};
pub use config::{Environment, OmnikassaConfig};
pub use errors::{ApiErrorDetail, OmnikassaError, OmnikassaErrorCode};
pub use models::{
    AccessToken, Address, MerchantOrder, Money, Notification, OrderItem, OrderResult,
    OrderResultSet, OrderStatus, TokenState,
};
pub use pull::{PullSummary, StatusPullCoordinator};
pub use signature::{SignatureService, SigningKey};
pub use token::AccessTokenProvider;

/// Common result alias for OmniKassa operations.
pub type Result<T> = std::result::Result<T, OmnikassaError>;
