use std::cell::RefCell;
use std::rc::Rc;

use winit::keyboard::KeyCode;

use super::{Extension, ExtensionFactory, ExtensionSetup};
use crate::canvas::strings;
use crate::input::{InputHandler, InputMode, InputModifier};

/// Registration name of [`HudExtension`]
pub const GAME_HUD_EXTENSION: &str = "GameHUD";

/// Engine switches the HUD extension flips.
pub trait HudControl {
    fn set_game_hud_visible(&mut self, visible: bool);

    fn set_debug_messages_enabled(&mut self, enabled: bool);

    fn debug_messages_enabled(&self) -> bool;
}

/// Hides the game HUD and on-screen debug messages while the debugger is
/// active, with keys to bring either back.
pub struct HudExtension {
    control: Rc<RefCell<dyn HudControl>>,
    hud_binding: Option<(usize, InputHandler)>,
    messages_binding: Option<(usize, InputHandler)>,
    wants_hud_enabled: bool,
    is_game_hud_enabled: bool,
    are_debug_messages_enabled: bool,
    prev_debug_messages_enabled: bool,
    cached_description: Option<String>,
}

impl HudExtension {
    pub fn new(setup: &mut ExtensionSetup<'_>, control: Rc<RefCell<dyn HudControl>>) -> Self {
        let mut bind = |name: &str, key: KeyCode| {
            let id = setup
                .input
                .bind_configurable_key(name, key, InputModifier::CTRL, InputMode::Local)?;
            Some((id, setup.input.handlers()[id].clone()))
        };
        let hud_binding = bind("ToggleHUD", KeyCode::Backquote);
        let messages_binding = bind("ToggleMessages", KeyCode::Tab);
        let prev_debug_messages_enabled = control.borrow().debug_messages_enabled();

        Self {
            control,
            hud_binding,
            messages_binding,
            wants_hud_enabled: false,
            is_game_hud_enabled: false,
            are_debug_messages_enabled: false,
            prev_debug_messages_enabled,
            cached_description: None,
        }
    }

    pub fn factory(control: Rc<RefCell<dyn HudControl>>) -> ExtensionFactory {
        Box::new(move |setup| Box::new(HudExtension::new(setup, control.clone())))
    }

    pub fn is_game_hud_enabled(&self) -> bool {
        self.is_game_hud_enabled
    }

    pub fn are_debug_messages_enabled(&self) -> bool {
        self.are_debug_messages_enabled
    }

    fn set_game_hud_enabled(&mut self, enable: bool) {
        self.control.borrow_mut().set_game_hud_visible(enable);
        self.is_game_hud_enabled = enable;
        self.cached_description = None;
    }

    fn set_debug_messages_enabled(&mut self, enable: bool) {
        self.control.borrow_mut().set_debug_messages_enabled(enable);
        self.are_debug_messages_enabled = enable;
        self.cached_description = None;
    }

    fn build_description(&self) -> String {
        let entry = |(_, handler): &(usize, InputHandler), enabled: bool, label: &str| {
            let state = if enabled {
                strings::COLOR_ENABLED
            } else {
                strings::COLOR_DISABLED
            };
            format!(
                "{{{}}}{}:{{{state}}}{label}",
                strings::COLOR_INPUT,
                handler.describe()
            )
        };
        let parts: Vec<String> = [
            self.hud_binding
                .as_ref()
                .map(|b| entry(b, self.is_game_hud_enabled, "HUD")),
            self.messages_binding
                .as_ref()
                .map(|b| entry(b, self.are_debug_messages_enabled, "DebugMessages")),
        ]
        .into_iter()
        .flatten()
        .collect();
        parts.join(strings::SEPARATOR_SPACE)
    }
}

impl Extension for HudExtension {
    fn on_input(&mut self, handler_id: usize) {
        if self.hud_binding.as_ref().is_some_and(|(id, _)| *id == handler_id) {
            self.wants_hud_enabled = !self.is_game_hud_enabled;
            self.set_game_hud_enabled(self.wants_hud_enabled);
        } else if self
            .messages_binding
            .as_ref()
            .is_some_and(|(id, _)| *id == handler_id)
        {
            self.set_debug_messages_enabled(!self.are_debug_messages_enabled);
        }
    }

    fn description(&mut self) -> String {
        if let Some(cached) = &self.cached_description {
            return cached.clone();
        }
        let description = self.build_description();
        self.cached_description = Some(description.clone());
        description
    }

    fn on_activated(&mut self) {
        self.set_game_hud_enabled(self.wants_hud_enabled);
        self.set_debug_messages_enabled(false);
    }

    fn on_deactivated(&mut self) {
        self.set_game_hud_enabled(true);
        self.set_debug_messages_enabled(self.prev_debug_messages_enabled);
    }
}
