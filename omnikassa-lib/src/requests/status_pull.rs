use crate::models::Notification;
use crate::pipeline::{ApiRequest, AuthorizationMode};

/// Prefix of the results endpoint; the event name is appended.
pub const STATUS_PULL_PATH: &str = "/order/server/api/events/results/";

/// Fetch the next page of results for a notification.
///
/// Authorized with the notification's own `authentication` token.
#[derive(Clone)]
pub struct StatusPullRequest {
    event_name: String,
    authentication: String,
}

impl StatusPullRequest {
    pub fn new(notification: &Notification) -> Self {
        Self {
            event_name: notification.event_name().to_string(),
            authentication: notification.authentication().to_string(),
        }
    }
}

impl std::fmt::Debug for StatusPullRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPullRequest")
            .field("event_name", &self.event_name)
            .finish_non_exhaustive()
    }
}

impl ApiRequest for StatusPullRequest {
    fn name(&self) -> &'static str {
        "status_pull"
    }

    fn path(&self) -> String {
        format!("{}{}", STATUS_PULL_PATH, urlencoding::encode(&self.event_name))
    }

    fn authorization(&self) -> AuthorizationMode {
        AuthorizationMode::CustomToken(self.authentication.clone())
    }
}
