//! The three calls made against the gateway.

mod order_announce;
mod refresh;
mod status_pull;

pub use order_announce::{OrderAnnounceRequest, OrderAnnounceResponse, ORDER_ANNOUNCE_PATH};
pub use refresh::{RefreshRequest, REFRESH_PATH};
pub use status_pull::{StatusPullRequest, STATUS_PULL_PATH};
