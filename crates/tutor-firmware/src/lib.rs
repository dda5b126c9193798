//! ESP32-S3 firmware-specific modules for the Personal Tutor
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: WiFi bring-up, the embassy-net HTTP(S) client, the hardware RNG
//! and clock adapters, and build-time WiFi credentials.

#![no_std]

extern crate alloc;

pub mod clock;
pub mod net;
pub mod rng;
pub mod wifi;
pub mod wifi_secrets;
