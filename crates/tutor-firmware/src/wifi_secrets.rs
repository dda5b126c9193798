//! WiFi credentials and API endpoint baked in by `build.rs`

use tutor_core::config::{ConfigError, DeviceConfig};

pub const WIFI_SSID: &str = env!("WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");

/// Optional override of the card search endpoint
pub const API_URL: Option<&str> = option_env!("API_URL");

/// Validated device configuration with default timing
pub fn device_config() -> Result<DeviceConfig<'static>, ConfigError> {
    DeviceConfig::baked(WIFI_SSID, WIFI_PASSWORD, API_URL)
}
