//! Test utilities for OmniKassa integrations.
//!
//! Available in test builds and with the `test-utils` feature:
//! - [`MockTransport`], a scripted [`HttpTransport`](crate::transport::HttpTransport)
//! - [`FixedClock`](crate::clock::FixedClock), a settable time source
//! - [`fixtures`], payloads signed with the sandbox test key
//!
//! ```rust,ignore
//! use omnikassa_lib::test_utils::{fixtures, MockTransport};
//! use omnikassa_lib::transport::HttpMethod;
//!
//! let transport = MockTransport::new();
//! transport.reply_json(
//!     HttpMethod::Get,
//!     "/gatekeeper/refresh",
//!     200,
//!     fixtures::refresh_json("token", fixtures::FAR_FUTURE_VALID_UNTIL),
//! );
//! ```

pub mod fixtures;
mod mock_transport;

pub use crate::clock::FixedClock;
pub use mock_transport::MockTransport;
