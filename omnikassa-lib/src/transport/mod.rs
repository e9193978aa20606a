//! Transport collaborator boundary.
//!
//! The library never talks to the network directly. Everything goes through an
//! [`HttpTransport`], so callers can substitute their own client (or a scripted
//! one in tests).

#[cfg(feature = "http-client")]
mod reqwest_transport;
mod traits;

#[cfg(feature = "http-client")]
pub use reqwest_transport::ReqwestTransport;
pub use traits::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
