//! Hardware-independent core library for the Personal Tutor handheld
//!
//! This crate contains all platform-agnostic logic for the card-search
//! device: the screen controller, page rendering, the card API client and
//! its HTTP layer, image decoding and resampling, the annotation canvas, and
//! the I2C/SPI drivers for the gamepad, touch controller and panel.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod api;
pub mod app;
pub mod app_state;
pub mod canvas;
pub mod config;
pub mod drivers;
pub mod framebuffer;
pub mod http;
pub mod image;
pub mod input;
pub mod pages;
pub mod timer;
pub mod touch;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
