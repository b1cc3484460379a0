//! Debugger extensions
//!
//! Extensions are always-on helpers that live next to the categories, such
//! as the game HUD toggle. They only react to input and describe their own
//! key bindings on the overlay header.

mod hud;

pub use hud::{GAME_HUD_EXTENSION, HudControl, HudExtension};

use crate::input::{InputBinder, InputHandler};

/// Builds an extension. Called once at registration and once per replicator.
pub type ExtensionFactory = Box<dyn Fn(&mut ExtensionSetup<'_>) -> Box<dyn Extension>>;

pub trait Extension {
    fn on_input(&mut self, _handler_id: usize) {}

    /// Marked-up summary for the overlay header, empty to show nothing.
    fn description(&mut self) -> String {
        String::new()
    }

    fn on_activated(&mut self) {}

    fn on_deactivated(&mut self) {}
}

/// Handed to an [`ExtensionFactory`] to bind keys.
pub struct ExtensionSetup<'a> {
    pub input: InputBinder<'a>,
    is_local: bool,
}

impl<'a> ExtensionSetup<'a> {
    pub fn new(input: InputBinder<'a>, is_local: bool) -> Self {
        Self { input, is_local }
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }
}

pub struct ExtensionInstance {
    id: usize,
    name: String,
    handlers: Vec<InputHandler>,
    producer: Box<dyn Extension>,
}

impl ExtensionInstance {
    pub fn new(
        id: usize,
        name: impl Into<String>,
        producer: Box<dyn Extension>,
        setup: ExtensionSetup<'_>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            handlers: setup.input.into_handlers(),
            producer,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handlers(&self) -> &[InputHandler] {
        &self.handlers
    }

    pub fn handle_input(&mut self, handler_id: usize) {
        self.producer.on_input(handler_id);
    }

    pub fn description(&mut self) -> String {
        self.producer.description()
    }

    pub fn on_activated(&mut self) {
        self.producer.on_activated();
    }

    pub fn on_deactivated(&mut self) {
        self.producer.on_deactivated();
    }
}
