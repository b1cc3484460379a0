//! Overlay text and shape rendering.
//!
//! [`Canvas`] is the boundary to whatever actually draws (an engine HUD, a
//! terminal, a test recorder). [`CanvasContext`] sits on top of it and owns
//! the cursor: markup-aware printing, line wrapping into a second column
//! when the screen runs out of vertical space, and projected shape labels.

mod context;
pub mod markup;

pub use context::{CanvasContext, CanvasPadding};
pub use markup::{TextRun, parse_markup, strip_markup};

use dna_debugger_shared::{Color, Shape};
use glam::{Vec2, Vec3};

/// Markup fragments shared by the overlay header and addon descriptions.
pub mod strings {
    pub const COLOR_INPUT: &str = "white";
    pub const COLOR_ENABLED: &str = "green";
    pub const COLOR_DISABLED: &str = "grey";
    pub const COLOR_ENABLED_ACTIVE_ROW: &str = "green";
    pub const COLOR_DISABLED_ACTIVE_ROW: &str = "black";

    pub const SEPARATOR: &str = "{white} | ";
    pub const SEPARATOR_SPACE: &str = "  ";
}

/// Drawing backend.
pub trait Canvas {
    fn draw_text(&mut self, position: Vec2, text: &str, color: Color);

    /// Width and height of `text` in the current font.
    fn text_size(&self, text: &str) -> Vec2;

    fn line_height(&self) -> f32;

    /// Drawable area in pixels.
    fn clip_size(&self) -> Vec2;

    /// World location to screen position.
    fn project(&self, location: Vec3) -> Vec2;

    /// Whether a world location is in front of the camera and on screen.
    fn is_location_visible(&self, location: Vec3) -> bool;

    /// Draw a well-formed shape into the 3D view.
    fn draw_shape(&mut self, shape: &Shape);
}
