use crate::pipeline::{ApiRequest, AuthorizationMode};

pub const REFRESH_PATH: &str = "/gatekeeper/refresh";

/// Exchange the long-lived refresh token for an access token.
#[derive(Clone, Copy, Debug, Default)]
pub struct RefreshRequest;

impl ApiRequest for RefreshRequest {
    fn name(&self) -> &'static str {
        "refresh"
    }

    fn path(&self) -> String {
        REFRESH_PATH.to_string()
    }

    fn authorization(&self) -> AuthorizationMode {
        AuthorizationMode::RefreshToken
    }
}
