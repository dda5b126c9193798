// src/pages/mod.rs
//! Full-screen pages
//!
//! Exactly one page owns the display at a time. Each page keeps its own
//! layout and dirty tracking; the controller calls [`Page::draw_page`] after
//! every state change and then presents the surface.

pub mod card;
pub mod search;
pub mod start;
pub mod wifi_error;

pub use card::CardPage;
pub use search::SearchPage;
pub use start::StartPage;
pub use wifi_error::WifiErrorPage;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Page identifier used in logs and transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageId {
    Start,
    Search,
    Card,
    WifiError,
}

/// Trait that all full-screen pages implement.
///
/// 1. **`on_activate`** once, when the page takes over the display.
/// 2. **`draw_page`** after each change; draws only dirty parts.
/// 3. **`on_deactivate`** once, when another page takes over.
pub trait Page {
    /// Unique identifier used for navigation and logging.
    fn id(&self) -> PageId;

    /// Human-readable title for debug logs.
    fn title(&self) -> &str;

    /// Called once when this page becomes the active page.
    fn on_activate(&mut self) {
        self.mark_dirty();
    }

    /// Called once when this page is no longer the active page.
    fn on_deactivate(&mut self) {}

    /// Render whatever changed since the last call.
    fn draw_page<D: DrawTarget<Color = Rgb565>>(&mut self, display: &mut D)
        -> Result<(), D::Error>;

    /// Bounding rectangle of this page (the full screen).
    fn bounds(&self) -> Rectangle {
        crate::ui::core::screen_bounds()
    }

    /// Whether the page has regions that need redrawing.
    fn is_dirty(&self) -> bool;

    /// Mark every region as clean after a successful draw.
    fn mark_clean(&mut self);

    /// Force a full redraw on the next `draw_page`.
    fn mark_dirty(&mut self);
}
