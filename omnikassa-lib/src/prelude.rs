//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use omnikassa_lib::prelude::*;
//! ```

// Client and configuration
pub use crate::client::Omnikassa;
pub use crate::config::{Environment, OmnikassaConfig};

// Error handling
pub use crate::errors::{OmnikassaError, OmnikassaErrorCode};
pub use crate::Result;

// Wire models
pub use crate::models::{MerchantOrder, Money, Notification, OrderResult, OrderStatus};

// Signing
pub use crate::signature::SignatureService;

// Transport
pub use crate::transport::HttpTransport;
