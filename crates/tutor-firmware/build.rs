//! Bakes the WiFi credentials into the firmware.
//!
//! `WIFI_SSID` and `WIFI_PASSWORD` come from the environment, falling back
//! to a `.env` file next to the workspace root. Missing values compile to
//! empty strings; the firmware reports them on the WiFi error screen.
//! `API_URL`, when set, replaces the default card search endpoint.

fn main() {
    println!("cargo:rerun-if-changed=../../.env");
    let _ = dotenvy::from_filename("../../.env").or_else(|_| dotenvy::dotenv());

    for key in ["WIFI_SSID", "WIFI_PASSWORD"] {
        println!("cargo:rerun-if-env-changed={key}");
        let value = std::env::var(key).unwrap_or_default();
        println!("cargo:rustc-env={key}={value}");
    }

    println!("cargo:rerun-if-env-changed=API_URL");
    if let Ok(url) = std::env::var("API_URL") {
        println!("cargo:rustc-env=API_URL={url}");
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
