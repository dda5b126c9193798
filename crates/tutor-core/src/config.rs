//! Device configuration
//!
//! WiFi credentials are baked in at build time on the device; the simulator
//! can load the same structure from JSON. Everything except the credentials
//! has a default.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Card search endpoint. The percent-encoded query is appended to it.
pub const DEFAULT_SEARCH_URL: &str =
    "https://api.magicthegathering.io/v1/cards?contains=imageUrl&name=";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("WiFi SSID is empty")]
    MissingSsid,
    #[error("WiFi SSID longer than 32 bytes")]
    SsidTooLong,
    #[error("WiFi password longer than 64 bytes")]
    PasswordTooLong,
    #[error("search URL must start with http:// or https://")]
    InvalidSearchUrl,
    #[error("malformed configuration at line {line}, column {column}")]
    Malformed { line: usize, column: usize },
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct DeviceConfig<'a> {
    #[serde(default)]
    pub internet: InternetConfig<'a>,
    #[serde(default)]
    pub api: ApiConfig<'a>,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiConfig<'a> {
    pub search_url: &'a str,
}

impl Default for ApiConfig<'_> {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL,
        }
    }
}

/// Dwell times and input polling limits, all in milliseconds or polls
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// How long a red failure message stays up
    pub error_dwell_ms: u32,
    /// Pause after a progress bar reaches 100%
    pub done_dwell_ms: u32,
    /// Interval between scroll steps of the highlighted result
    pub scroll_step_ms: u32,
    /// Polls before a release wait gives up
    pub poll_limit: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            error_dwell_ms: 2000,
            done_dwell_ms: 300,
            scroll_step_ms: 1000,
            poll_limit: crate::input::DEFAULT_POLL_LIMIT,
        }
    }
}

impl<'a> DeviceConfig<'a> {
    /// Parse a JSON document, borrowing strings from `json`.
    pub fn from_json(json: &'a str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed {
            line: e.line(),
            column: e.column(),
        })
    }

    /// Configuration for credentials baked in at build time, with an
    /// optional search URL override. Validated before it is returned.
    pub fn baked(
        ssid: &'a str,
        password: &'a str,
        search_url: Option<&'a str>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            internet: InternetConfig { ssid, password },
            api: search_url.map_or_else(ApiConfig::default, |search_url| ApiConfig { search_url }),
            timing: TimingConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the WiFi credentials and API settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.internet.validate()?;
        self.api.validate()
    }
}

impl InternetConfig<'_> {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::MissingSsid);
        }
        if self.ssid.len() > 32 {
            return Err(ConfigError::SsidTooLong);
        }
        if self.password.len() > 64 {
            return Err(ConfigError::PasswordTooLong);
        }
        Ok(())
    }
}

impl ApiConfig<'_> {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_url.starts_with("https://") || self.search_url.starts_with("http://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidSearchUrl)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let config =
            DeviceConfig::from_json(r#"{"internet":{"ssid":"home","password":"hunter22"}}"#)
                .unwrap();

        assert_eq!(config.internet.ssid, "home");
        assert_eq!(config.api.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.timing, TimingConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_timing_keeps_other_defaults() {
        let config = DeviceConfig::from_json(r#"{"timing":{"error_dwell_ms":50}}"#).unwrap();
        assert_eq!(config.timing.error_dwell_ms, 50);
        assert_eq!(config.timing.done_dwell_ms, 300);
        assert_eq!(config.timing.scroll_step_ms, 1000);
    }

    #[test]
    fn malformed_json_reports_position() {
        let err = DeviceConfig::from_json("{\n  \"internet\": 5").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 2, .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = DeviceConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::MissingSsid));

        config.internet.ssid = "a-network-name-that-is-way-too-long";
        assert_eq!(config.validate(), Err(ConfigError::SsidTooLong));

        config.internet.ssid = "home";
        config.api.search_url = "ftp://example.com";
        assert_eq!(config.validate(), Err(ConfigError::InvalidSearchUrl));
    }

    #[test]
    fn baked_config_is_validated() {
        let config = DeviceConfig::baked("home", "hunter22", None).unwrap();
        assert_eq!(config.api.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.timing, TimingConfig::default());

        let config =
            DeviceConfig::baked("home", "hunter22", Some("http://cards.local/search?q=")).unwrap();
        assert_eq!(config.api.search_url, "http://cards.local/search?q=");

        assert_eq!(
            DeviceConfig::baked("", "hunter22", None).unwrap_err(),
            ConfigError::MissingSsid
        );
        assert_eq!(
            DeviceConfig::baked("home", "hunter22", Some("cards.local")).unwrap_err(),
            ConfigError::InvalidSearchUrl
        );
    }
}
