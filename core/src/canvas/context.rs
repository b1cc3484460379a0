use dna_debugger_shared::{Color, Shape};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::Canvas;
use super::markup::parse_markup;

/// Screen margins around the overlay text area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPadding {
    #[serde(default = "default_padding")]
    pub left: f32,
    #[serde(default = "default_padding")]
    pub right: f32,
    #[serde(default = "default_padding")]
    pub top: f32,
    #[serde(default = "default_padding")]
    pub bottom: f32,
}

fn default_padding() -> f32 {
    10.0
}

impl Default for CanvasPadding {
    fn default() -> Self {
        Self {
            left: default_padding(),
            right: default_padding(),
            top: default_padding(),
            bottom: default_padding(),
        }
    }
}

/// Cursor state over a [`Canvas`].
///
/// A detached context (no canvas) accepts every call and draws nothing.
pub struct CanvasContext<'a> {
    canvas: Option<&'a mut dyn Canvas>,
    pub cursor: Vec2,
    /// Left edge new lines return to; moves right when wrapping to a new column
    pub default_x: f32,
    /// Top edge a new column starts from
    pub default_y: f32,
    pub color: Color,
    padding: CanvasPadding,
}

impl<'a> CanvasContext<'a> {
    pub fn new(canvas: &'a mut dyn Canvas, padding: CanvasPadding) -> Self {
        Self {
            canvas: Some(canvas),
            cursor: Vec2::new(padding.left, padding.top),
            default_x: padding.left,
            default_y: padding.top,
            color: Color::WHITE,
            padding,
        }
    }

    pub fn detached() -> Self {
        Self {
            canvas: None,
            cursor: Vec2::ZERO,
            default_x: 0.0,
            default_y: 0.0,
            color: Color::WHITE,
            padding: CanvasPadding::default(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn line_height(&self) -> f32 {
        self.canvas.as_ref().map_or(0.0, |c| c.line_height())
    }

    /// Print marked-up text at the cursor in the context's color, then move
    /// to a new line.
    pub fn print(&mut self, text: &str) {
        self.print_colored(self.color, text);
    }

    pub fn print_colored(&mut self, color: Color, text: &str) {
        self.print_runs(color, text, true);
    }

    /// Print at an explicit position without disturbing the cursor.
    pub fn print_at(&mut self, position: Vec2, color: Color, text: &str) {
        let saved = (self.cursor, self.default_x);
        self.cursor = position;
        self.default_x = position.x;
        self.print_runs(color, text, false);
        (self.cursor, self.default_x) = saved;
    }

    fn print_runs(&mut self, color: Color, text: &str, wrap: bool) {
        let Some(canvas) = self.canvas.as_deref_mut() else {
            return;
        };
        let line_height = canvas.line_height();
        let clip = canvas.clip_size();
        let bottom = clip.y - self.padding.bottom;

        for (index, run) in parse_markup(text, color).into_iter().enumerate() {
            if run.line_start {
                self.cursor.x = self.default_x;
                self.cursor.y += line_height;
            }
            let starts_line = run.line_start || index == 0;
            let overflows = self.cursor.y + line_height > bottom;
            if wrap && starts_line && overflows && self.cursor.y > self.default_y {
                self.default_x += clip.x / 2.0;
                self.cursor = Vec2::new(self.default_x, self.default_y);
                trace!(column_x = self.default_x, "overlay text wrapped to next column");
            }
            if run.text.is_empty() {
                continue;
            }
            canvas.draw_text(self.cursor, &run.text, run.color);
            self.cursor.x += canvas.text_size(&run.text).x;
        }

        self.move_to_new_line();
    }

    pub fn move_to_new_line(&mut self) {
        let line_height = self.line_height();
        self.cursor.x = self.default_x;
        self.cursor.y += line_height;
    }

    /// Size of marked-up text with tags removed.
    pub fn measure_string(&self, text: &str) -> Vec2 {
        let Some(canvas) = self.canvas.as_deref() else {
            return Vec2::ZERO;
        };
        let line_height = canvas.line_height();
        let mut size = Vec2::ZERO;
        let mut line_width = 0.0f32;
        let mut lines = 0;

        for run in parse_markup(text, self.color) {
            if run.line_start || lines == 0 {
                size.x = size.x.max(line_width);
                line_width = 0.0;
                lines += 1;
            }
            if !run.text.is_empty() {
                line_width += canvas.text_size(&run.text).x;
            }
        }
        size.x = size.x.max(line_width);
        size.y = lines as f32 * line_height;
        size
    }

    /// Draw a shape and, if its anchor is on screen, its description.
    ///
    /// Malformed shapes are skipped.
    pub fn draw_shape(&mut self, shape: &Shape) {
        let Some(anchor) = shape.anchor() else {
            trace!(kind = ?shape.kind, "skipping malformed debug shape");
            return;
        };
        let Some(canvas) = self.canvas.as_deref_mut() else {
            return;
        };
        canvas.draw_shape(shape);

        if shape.description.is_empty() || !canvas.is_location_visible(anchor) {
            return;
        }
        let position = canvas.project(anchor);
        self.print_at(position, shape.color, &shape.description);
    }
}
