//! Client configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::signature::SignatureService;
use crate::{OmnikassaError, Result};

pub const PRODUCTION_BASE_URL: &str = "https://betalen.rabobank.nl/omnikassa-api";
pub const SANDBOX_BASE_URL: &str = "https://betalen.rabobank.nl/omnikassa-api-sandbox";

/// Gateway environment.
///
/// Serialized as `production`, `sandbox`, or the custom base URL itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    Production,
    Sandbox,
    /// Any other base URL, e.g. a local mock.
    Custom(String),
}

impl Environment {
    pub fn base_url(&self) -> &str {
        match self {
            Self::Production => PRODUCTION_BASE_URL,
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Custom(url) => url,
        }
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" => Self::Production,
            "sandbox" => Self::Sandbox,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Production => "production".to_string(),
            Environment::Sandbox => "sandbox".to_string(),
            Environment::Custom(url) => url,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Sandbox => f.write_str("sandbox"),
            Self::Custom(url) => f.write_str(url),
        }
    }
}

/// Credentials and endpoint of one webshop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmnikassaConfig {
    /// Long-lived refresh token from the dashboard.
    pub refresh_token: String,

    /// Signing key, base64 encoded as shown in the dashboard.
    pub signing_key: String,

    /// Environment or custom base URL.
    #[serde(rename = "base_url", alias = "environment")]
    pub environment: Environment,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl OmnikassaConfig {
    pub fn new(
        refresh_token: impl Into<String>,
        signing_key: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            signing_key: signing_key.into(),
            environment,
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Read `OMNIKASSA_REFRESH_TOKEN`, `OMNIKASSA_SIGNING_KEY`,
    /// `OMNIKASSA_BASE_URL` and optionally `OMNIKASSA_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str, setting: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| OmnikassaError::missing_setting(setting))
        };

        let mut config = Self::new(
            required("OMNIKASSA_REFRESH_TOKEN", "refresh_token")?,
            required("OMNIKASSA_SIGNING_KEY", "signing_key")?,
            Environment::from(required("OMNIKASSA_BASE_URL", "base_url")?),
        );

        if let Some(timeout) = lookup("OMNIKASSA_TIMEOUT_SECS") {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                OmnikassaError::invalid_setting("timeout_secs", format!("'{}' is not a number", timeout))
            })?;
            config = config.with_timeout(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| OmnikassaError::invalid_setting("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every required setting is present and usable.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_token.trim().is_empty() {
            return Err(OmnikassaError::missing_setting("refresh_token"));
        }
        if self.signing_key.trim().is_empty() {
            return Err(OmnikassaError::missing_setting("signing_key"));
        }
        if let Environment::Custom(url) = &self.environment {
            if url.trim().is_empty() {
                return Err(OmnikassaError::missing_setting("base_url"));
            }
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(OmnikassaError::invalid_setting(
                    "base_url",
                    format!("'{}' is not an http(s) URL", url),
                ));
            }
        }
        if self.timeout_secs == 0 {
            return Err(OmnikassaError::invalid_setting("timeout_secs", "must be positive"));
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.environment.base_url()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Decode the signing key.
    pub fn signature_service(&self) -> Result<SignatureService> {
        SignatureService::from_base64(&self.signing_key)
    }
}

impl fmt::Debug for OmnikassaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmnikassaConfig")
            .field("refresh_token", &"[REDACTED]")
            .field("signing_key", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use crate::OmnikassaErrorCode;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_environment_urls() {
        assert_eq!(Environment::Production.base_url(), PRODUCTION_BASE_URL);
        assert_eq!(Environment::from("sandbox"), Environment::Sandbox);
        assert_eq!(
            Environment::from("https://www.example.com/sandbox").base_url(),
            "https://www.example.com/sandbox"
        );
    }

    #[test]
    fn test_from_lookup() {
        let config = OmnikassaConfig::from_lookup(env(&[
            ("OMNIKASSA_REFRESH_TOKEN", fixtures::REFRESH_TOKEN),
            ("OMNIKASSA_SIGNING_KEY", fixtures::SIGNING_KEY_BASE64),
            ("OMNIKASSA_BASE_URL", "sandbox"),
            ("OMNIKASSA_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.signature_service().is_ok());
    }

    #[test]
    fn test_missing_setting_is_named() {
        let err = OmnikassaConfig::from_lookup(env(&[
            ("OMNIKASSA_REFRESH_TOKEN", fixtures::REFRESH_TOKEN),
            ("OMNIKASSA_BASE_URL", "sandbox"),
        ]))
        .unwrap_err();

        assert_eq!(err.code(), OmnikassaErrorCode::Configuration);
        assert_eq!(err.to_string(), "config setting 'signing_key' missing");
    }

    #[test]
    fn test_bad_timeout() {
        let err = OmnikassaConfig::from_lookup(env(&[
            ("OMNIKASSA_REFRESH_TOKEN", "r"),
            ("OMNIKASSA_SIGNING_KEY", fixtures::SIGNING_KEY_BASE64),
            ("OMNIKASSA_BASE_URL", "production"),
            ("OMNIKASSA_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert_eq!(err.code(), OmnikassaErrorCode::Configuration);
    }

    #[test]
    fn test_from_json() {
        let config = OmnikassaConfig::from_json(
            r#"{"refresh_token":"r","signing_key":"bXlTMWduaW5nSzN5","base_url":"production"}"#,
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.timeout_secs, 30);

        assert!(OmnikassaConfig::from_json(r#"{"refresh_token":"r","signing_key":"k"}"#).is_err());
        assert!(OmnikassaConfig::from_json(
            r#"{"refresh_token":"r","signing_key":"k","base_url":"ftp://nope"}"#
        )
        .is_err());
    }

    #[test]
    fn test_invalid_key_is_configuration_error() {
        let config = OmnikassaConfig::new("r", "***", Environment::Sandbox);
        let err = config.signature_service().unwrap_err();
        assert_eq!(err.code(), OmnikassaErrorCode::Configuration);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = OmnikassaConfig::new("topsecret", fixtures::SIGNING_KEY_BASE64, Environment::Sandbox);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains(fixtures::SIGNING_KEY_BASE64));
    }
}
