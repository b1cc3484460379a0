//! Debugger key handling
//!
//! Addons bind named key chords through an [`InputBinder`] while they are
//! being constructed. The [`InputRouter`] owned by each local viewer turns
//! key presses into debugger actions: toggling the overlay, paging through
//! category rows, toggling slots and invoking addon handlers.

mod binder;
pub mod keys;
mod router;

#[cfg(test)]
mod tests;

pub use binder::{ConfigAccess, InputBinder};
pub use router::{InputAction, InputRouter, KeyEvent, SLOTS_PER_ROW};

use std::ops::Add;

use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// Modifier keys that must be held for a chord to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InputModifier {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub cmd: bool,
}

impl InputModifier {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        cmd: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };
    pub const CMD: Self = Self {
        cmd: true,
        ..Self::NONE
    };
}

impl Add for InputModifier {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            shift: self.shift || other.shift,
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            cmd: self.cmd || other.cmd,
        }
    }
}

/// Where a handler runs when its chord is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    /// On the viewer that pressed the key
    #[default]
    Local,
    /// Forwarded to the authority copy of the addon
    Replicated,
}

/// A bound key chord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputHandler {
    /// Name used for config overrides; empty for fixed bindings
    pub config_name: String,
    pub key: KeyCode,
    pub modifier: InputModifier,
    pub mode: InputMode,
}

impl InputHandler {
    pub fn matches(&self, key: KeyCode, modifier: InputModifier) -> bool {
        self.key == key && self.modifier == modifier
    }

    /// Human-readable chord, modifiers first (`Ctrl+Shift+P`).
    pub fn describe(&self) -> String {
        let mut description = keys::key_name(self.key).to_string();
        if self.modifier.shift {
            description = format!("Shift+{description}");
        }
        if self.modifier.alt {
            description = format!("Alt+{description}");
        }
        if self.modifier.ctrl {
            description = format!("Ctrl+{description}");
        }
        if self.modifier.cmd {
            description = format!("Cmd+{description}");
        }
        description
    }
}
