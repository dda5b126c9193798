//! Widgets shared by the device pages
//!
//! Everything here draws into any `DrawTarget<Color = Rgb565>` and keeps its
//! own dirty flag so pages can repaint only what changed.

pub mod colors;
pub mod core;
pub mod grid;
pub mod label;
pub mod progress;

pub use core::Drawable;
pub use grid::GridLayout;
pub use label::{Label, ScrollingLabel};
pub use progress::ProgressOverlay;

/// Panel width in portrait orientation
pub const DISPLAY_WIDTH_PX: u16 = 320;

/// Panel height in portrait orientation
pub const DISPLAY_HEIGHT_PX: u16 = 480;
