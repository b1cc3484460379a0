//! Inline color markup for overlay text.
//!
//! `{name}` switches the active color for the text that follows. The name
//! is looked up in the lowercase color table first, then parsed as a
//! literal color (`{R=255,G=0,B=0}`, `{#ff0000}`). Tags that resolve to
//! neither are kept as literal text. `\n` starts a new line that keeps the
//! active color and `\t` expands to a fixed run of spaces.

use dna_debugger_shared::Color;

/// Expansion of a tab character
pub const TAB_SPACES: &str = "     ";

/// A span of text drawn in one color.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub color: Color,
    /// The run begins a new line
    pub line_start: bool,
}

impl TextRun {
    fn new(color: Color, line_start: bool) -> Self {
        Self {
            text: String::new(),
            color,
            line_start,
        }
    }

    fn is_blank(&self) -> bool {
        self.text.is_empty() && !self.line_start
    }
}

fn resolve_tag(tag: &str) -> Option<Color> {
    Color::from_name(&tag.to_lowercase()).or_else(|| Color::parse(tag))
}

/// Split marked-up text into colored runs.
pub fn parse_markup(input: &str, default_color: Color) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut current = TextRun::new(default_color, false);
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut tag = String::new();
                let mut closed = false;
                for t in chars.by_ref() {
                    if t == '}' {
                        closed = true;
                        break;
                    }
                    tag.push(t);
                }

                if !closed {
                    current.text.push('{');
                    current.text.push_str(&tag);
                    continue;
                }

                match resolve_tag(&tag) {
                    Some(color) if current.text.is_empty() => current.color = color,
                    Some(color) => {
                        let next = TextRun::new(color, false);
                        runs.push(std::mem::replace(&mut current, next));
                    }
                    None => {
                        current.text.push('{');
                        current.text.push_str(&tag);
                        current.text.push('}');
                    }
                }
            }
            '\n' => {
                let next = TextRun::new(current.color, true);
                let finished = std::mem::replace(&mut current, next);
                if !finished.is_blank() {
                    runs.push(finished);
                }
            }
            '\t' => current.text.push_str(TAB_SPACES),
            _ => current.text.push(c),
        }
    }

    if !current.is_blank() {
        runs.push(current);
    }
    runs
}

/// Text with all recognized tags removed.
pub fn strip_markup(input: &str) -> String {
    let mut out = String::new();
    for run in parse_markup(input, Color::WHITE) {
        if run.line_start && !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&run.text);
    }
    out
}
