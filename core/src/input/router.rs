use winit::keyboard::KeyCode;

use super::InputModifier;
use super::keys::parse_key;
use crate::canvas::{CanvasContext, strings};
use crate::config::DebuggerConfig;
use crate::replicator::Replicator;

/// Category slots reachable with the slot keys at once.
pub const SLOTS_PER_ROW: usize = 10;

/// A key press with the modifiers held at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifier: InputModifier,
}

impl KeyEvent {
    pub fn new(key: KeyCode, modifier: InputModifier) -> Self {
        Self { key, modifier }
    }

    pub fn plain(key: KeyCode) -> Self {
        Self::new(key, InputModifier::NONE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    ToggleDebugger,
    NextRow,
    PrevRow,
    /// Absolute slot index
    ToggleSlot(usize),
    Category { category_id: usize, handler_id: usize },
    Extension { extension_id: usize, handler_id: usize },
}

/// Local viewer input: global debugger keys plus addon handlers.
pub struct InputRouter {
    activation_key: Option<KeyCode>,
    activation_name: String,
    next_row_key: Option<KeyCode>,
    prev_row_key: Option<KeyCode>,
    slot_keys: Vec<Option<KeyCode>>,
    active_row: usize,
}

fn configured_key(name: &str, purpose: &str) -> Option<KeyCode> {
    let key = parse_key(name);
    if key.is_none() {
        log::warn!("unknown key '{name}' configured for {purpose}, binding skipped");
    }
    key
}

impl InputRouter {
    pub fn from_config(config: &DebuggerConfig) -> Self {
        let slot_keys = config
            .category_slot_keys
            .iter()
            .take(SLOTS_PER_ROW)
            .map(|name| configured_key(name, "category slot"))
            .collect();
        Self {
            activation_key: configured_key(&config.activation_key, "activation"),
            activation_name: config.activation_key.clone(),
            next_row_key: configured_key(&config.category_row_next_key, "next category row"),
            prev_row_key: configured_key(&config.category_row_prev_key, "previous category row"),
            slot_keys,
            active_row: 0,
        }
    }

    pub fn active_row(&self) -> usize {
        self.active_row
    }

    fn row_count(replicator: &Replicator) -> usize {
        replicator.layout().slot_count().div_ceil(SLOTS_PER_ROW).max(1)
    }

    /// Action bound to a key press, if any.
    ///
    /// Only the activation key works while the overlay is hidden. Addon
    /// handlers of disabled categories are skipped.
    pub fn resolve(&self, event: KeyEvent, replicator: &Replicator) -> Option<InputAction> {
        let plain = event.modifier == InputModifier::NONE;
        let is = |key: Option<KeyCode>| plain && key == Some(event.key);

        if is(self.activation_key) {
            return Some(InputAction::ToggleDebugger);
        }
        if !replicator.is_enabled() {
            return None;
        }
        if is(self.next_row_key) {
            return Some(InputAction::NextRow);
        }
        if is(self.prev_row_key) {
            return Some(InputAction::PrevRow);
        }
        if let Some(index) = self.slot_keys.iter().position(|key| is(*key)) {
            let slot = self.active_row * SLOTS_PER_ROW + index;
            return (slot < replicator.layout().slot_count()).then_some(InputAction::ToggleSlot(slot));
        }

        for category in replicator.categories().iter().filter(|c| c.is_enabled()) {
            if let Some(handler_id) = category
                .handlers()
                .iter()
                .position(|h| h.matches(event.key, event.modifier))
            {
                return Some(InputAction::Category {
                    category_id: category.id(),
                    handler_id,
                });
            }
        }
        for extension in replicator.extensions() {
            if let Some(handler_id) = extension
                .handlers()
                .iter()
                .position(|h| h.matches(event.key, event.modifier))
            {
                return Some(InputAction::Extension {
                    extension_id: extension.id(),
                    handler_id,
                });
            }
        }
        None
    }

    /// Resolve a key press and carry out its action.
    pub fn handle_key(&mut self, event: KeyEvent, replicator: &mut Replicator) -> Option<InputAction> {
        let action = self.resolve(event, replicator)?;
        match action {
            InputAction::ToggleDebugger => replicator.set_enabled(!replicator.is_enabled()),
            InputAction::NextRow => {
                self.active_row = (self.active_row + 1) % Self::row_count(replicator);
            }
            InputAction::PrevRow => {
                let rows = Self::row_count(replicator);
                self.active_row = (self.active_row + rows - 1) % rows;
            }
            InputAction::ToggleSlot(slot) => self.toggle_slot(slot, replicator),
            InputAction::Category {
                category_id,
                handler_id,
            } => replicator.send_category_input_event(category_id, handler_id),
            InputAction::Extension {
                extension_id,
                handler_id,
            } => replicator.send_extension_input_event(extension_id, handler_id),
        }
        Some(action)
    }

    /// Shared slots toggle together: all on turns them off, otherwise on.
    fn toggle_slot(&self, slot: usize, replicator: &mut Replicator) {
        let ids = replicator.layout().categories_in_slot(slot).to_vec();
        let all_enabled = ids
            .iter()
            .all(|id| replicator.category(*id).is_some_and(|c| c.is_enabled()));
        for id in ids {
            replicator.set_category_enabled(id, !all_enabled);
        }
    }

    /// Overlay header: activation hint, debug actor, slot rows and
    /// extension descriptions.
    pub fn draw_header(&self, replicator: &mut Replicator, canvas: &mut CanvasContext<'_>) {
        if !replicator.is_enabled() {
            return;
        }

        let actor = &replicator.debug_actor().name;
        let actor = if actor.is_empty() {
            format!("{{{}}}none", strings::COLOR_DISABLED)
        } else {
            format!("{{cyan}}{actor}")
        };
        canvas.print(&format!(
            "{{white}}[{{yellow}}{}{{white}}]: close{}Debug actor: {actor}",
            self.activation_name,
            strings::SEPARATOR_SPACE
        ));

        let layout = replicator.layout();
        let rows = Self::row_count(replicator);
        for row in 0..rows {
            let active = row == self.active_row;
            let first = row * SLOTS_PER_ROW;
            let last = (first + SLOTS_PER_ROW).min(layout.slot_count());
            let mut entries = Vec::new();
            for slot in first..last {
                let ids = layout.categories_in_slot(slot);
                if ids.is_empty() {
                    continue;
                }
                let enabled = ids
                    .iter()
                    .any(|id| replicator.category(*id).is_some_and(|c| c.is_enabled()));
                let color = match (active, enabled) {
                    (true, true) => strings::COLOR_ENABLED_ACTIVE_ROW,
                    (true, false) => strings::COLOR_DISABLED_ACTIVE_ROW,
                    (false, true) => strings::COLOR_ENABLED,
                    (false, false) => strings::COLOR_DISABLED,
                };
                let entry = if active {
                    format!(
                        "{{{}}}{}:{{{color}}}{}",
                        strings::COLOR_INPUT,
                        slot - first,
                        layout.slot_name(slot)
                    )
                } else {
                    format!("{{{color}}}{}", layout.slot_name(slot))
                };
                entries.push(entry);
            }
            if entries.is_empty() {
                continue;
            }
            let marker = if active && rows > 1 { "{yellow}> " } else { "" };
            canvas.print(&format!("{marker}{}", entries.join(strings::SEPARATOR)));
        }

        let descriptions: Vec<String> = replicator
            .extensions_mut()
            .iter_mut()
            .map(|e| e.description())
            .filter(|d| !d.is_empty())
            .collect();
        if !descriptions.is_empty() {
            canvas.print(&descriptions.join(strings::SEPARATOR));
        }
    }
}
