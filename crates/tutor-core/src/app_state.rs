//! Application-wide state and error types for the Personal Tutor

use alloc::string::String;
use core::fmt::{Debug, Write};

use thiserror_no_std::Error;

use crate::api::CardResults;
use crate::config::ConfigError;
use crate::image::DecodeError;

/// Which full-screen mode runs next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Start,
    Search,
    /// Card view for the image at this URL
    Card(String),
}

/// The text typed on the search keyboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(text: &str) -> Self {
        Self(text.into())
    }

    pub fn push(&mut self, ch: char) {
        self.0.push(ch);
    }

    /// Remove the last character; no-op when empty
    pub fn pop(&mut self) -> Option<char> {
        self.0.pop()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// State that outlives a single screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub query: SearchQuery,
    /// Last search results, replaced wholesale by every search
    pub results: CardResults,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Start,
            query: SearchQuery::default(),
            results: CardResults::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("WiFi connection failed: {0}")]
    Wifi(heapless::String<64>),
    #[error("Gamepad error: {0}")]
    Input(heapless::String<64>),
    #[error("Touch controller error: {0}")]
    Touch(heapless::String<64>),
    #[error("Display error: {0}")]
    Display(heapless::String<64>),
    #[error("Image decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn wifi(err: impl Debug) -> Self {
        AppError::Wifi(FromUnchecked::from_unchecked(&err))
    }

    pub fn input(err: impl Debug) -> Self {
        AppError::Input(FromUnchecked::from_unchecked(&err))
    }

    pub fn touch(err: impl Debug) -> Self {
        AppError::Touch(FromUnchecked::from_unchecked(&err))
    }

    pub fn display(err: impl Debug) -> Self {
        AppError::Display(FromUnchecked::from_unchecked(&err))
    }
}

/// Lossy conversion into a fixed-capacity string; overflow is truncated.
pub trait FromUnchecked<T: ?Sized> {
    fn from_unchecked(value: &T) -> Self;
}

impl<const N: usize> FromUnchecked<str> for heapless::String<N> {
    fn from_unchecked(value: &str) -> Self {
        let mut out = heapless::String::new();
        let _ = Truncate(&mut out).write_str(value);
        out
    }
}

impl<T: Debug, const N: usize> FromUnchecked<T> for heapless::String<N> {
    fn from_unchecked(value: &T) -> Self {
        let mut out = heapless::String::new();
        let _ = write!(Truncate(&mut out), "{:?}", value);
        out
    }
}

/// Writer that keeps as much as fits and drops the rest
struct Truncate<'a, const N: usize>(&'a mut heapless::String<N>);

impl<const N: usize> Write for Truncate<'_, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}
