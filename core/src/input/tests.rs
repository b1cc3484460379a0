//! Tests for key bindings and input routing

#![cfg(test)]

use std::cell::RefCell;
use std::rc::Rc;

use dna_debugger_shared::{ControllerId, DataPackPolicy};
use winit::keyboard::KeyCode;

use super::*;
use crate::canvas::{CanvasContext, CanvasPadding};
use crate::category::CategoryState;
use crate::config::{DebuggerConfig, InputOwner};
use crate::extension::{GAME_HUD_EXTENSION, HudControl, HudExtension};
use crate::registry::{AddonRegistry, NO_SLOT, SessionContext};
use crate::replicator::Replicator;
use crate::test_utils::{FakeHud, ProbeCategory, ProbeLog, RecordingCanvas, quiet_category};
use crate::world::NetMode;

fn replicator_for(registry: &AddonRegistry) -> Replicator {
    Replicator::new(
        ControllerId(1),
        registry,
        SessionContext {
            net_mode: NetMode::Standalone,
            simulating: false,
        },
        true,
    )
}

fn slotted(slots: &[(&str, i32)]) -> AddonRegistry {
    let mut registry = AddonRegistry::new(DebuggerConfig::default());
    for (name, slot) in slots {
        registry.register_category(name, quiet_category(), CategoryState::default(), *slot);
    }
    registry.recompute_category_layout();
    registry
}

#[test]
fn test_describe_orders_modifiers() {
    let handler = InputHandler {
        config_name: String::new(),
        key: KeyCode::KeyP,
        modifier: InputModifier::SHIFT + InputModifier::CTRL + InputModifier::ALT + InputModifier::CMD,
        mode: InputMode::Local,
    };
    assert_eq!(handler.describe(), "Cmd+Ctrl+Alt+Shift+P");
    assert!(handler.matches(KeyCode::KeyP, handler.modifier));
    assert!(!handler.matches(KeyCode::KeyP, InputModifier::SHIFT));
}

#[test]
fn test_unknown_key_is_not_bound() {
    let mut binder = InputBinder::detached();
    assert_eq!(
        binder.bind_key_press("NotAKey", InputModifier::NONE, InputMode::Local),
        None
    );
    assert_eq!(
        binder.bind_key_press("F3", InputModifier::NONE, InputMode::Local),
        Some(0)
    );
    assert_eq!(binder.into_handlers().len(), 1);
}

#[test]
fn test_record_binder_writes_defaults() {
    let mut config = DebuggerConfig::default();
    let mut slot = NO_SLOT;
    let mut state = CategoryState::default();
    config.update_category_config("AI", &mut slot, &mut state);

    let mut binder = InputBinder::new(InputOwner::Category("AI"), ConfigAccess::Record(&mut config));
    binder.bind_configurable_key("Cycle", KeyCode::KeyC, InputModifier::ALT, InputMode::Replicated);
    drop(binder);

    let input = config.find_input(InputOwner::Category("AI"), "Cycle").unwrap();
    assert_eq!(input.key, "C");
    assert!(input.alt);
}

#[test]
fn test_activation_key_toggles_overlay() {
    let registry = slotted(&[("AI", NO_SLOT)]);
    let mut replicator = replicator_for(&registry);
    let mut router = InputRouter::from_config(registry.config());

    let numpad0 = KeyEvent::plain(KeyCode::Numpad0);
    assert_eq!(router.handle_key(numpad0, &mut replicator), None);

    let shifted = KeyEvent::new(KeyCode::Quote, InputModifier::SHIFT);
    assert_eq!(router.handle_key(shifted, &mut replicator), None);

    let quote = KeyEvent::plain(KeyCode::Quote);
    assert_eq!(
        router.handle_key(quote, &mut replicator),
        Some(InputAction::ToggleDebugger)
    );
    assert!(replicator.is_enabled());

    router.handle_key(quote, &mut replicator);
    assert!(!replicator.is_enabled());
}

#[test]
fn test_shared_slot_toggles_together() {
    let registry = slotted(&[("A", 2), ("B", NO_SLOT), ("C", 2)]);
    let mut replicator = replicator_for(&registry);
    let mut router = InputRouter::from_config(registry.config());
    replicator.set_enabled(true);

    let numpad2 = KeyEvent::plain(KeyCode::Numpad2);
    assert_eq!(
        router.handle_key(numpad2, &mut replicator),
        Some(InputAction::ToggleSlot(2))
    );
    assert!(!replicator.category(0).unwrap().is_enabled());
    assert!(!replicator.category(2).unwrap().is_enabled());
    assert!(replicator.category(1).unwrap().is_enabled());

    replicator.set_category_enabled(0, true);
    router.handle_key(numpad2, &mut replicator);
    assert!(replicator.category(0).unwrap().is_enabled());
    assert!(replicator.category(2).unwrap().is_enabled());

    // past the last slot
    assert_eq!(
        router.handle_key(KeyEvent::plain(KeyCode::Numpad5), &mut replicator),
        None
    );
}

#[test]
fn test_row_paging_wraps() {
    let registry = slotted(&[("First", 0), ("Far", 11)]);
    let mut replicator = replicator_for(&registry);
    let mut router = InputRouter::from_config(registry.config());
    replicator.set_enabled(true);

    let next = KeyEvent::plain(KeyCode::NumpadAdd);
    let prev = KeyEvent::plain(KeyCode::NumpadSubtract);
    router.handle_key(next, &mut replicator);
    assert_eq!(router.active_row(), 1);
    assert_eq!(
        router.handle_key(KeyEvent::plain(KeyCode::Numpad1), &mut replicator),
        Some(InputAction::ToggleSlot(11))
    );
    assert!(!replicator.category(1).unwrap().is_enabled());

    router.handle_key(next, &mut replicator);
    assert_eq!(router.active_row(), 0);
    router.handle_key(prev, &mut replicator);
    assert_eq!(router.active_row(), 1);
}

#[test]
fn test_addon_handlers_are_routed() {
    let log = Rc::new(RefCell::new(ProbeLog::default()));
    let hud = Rc::new(RefCell::new(FakeHud::default()));
    let mut registry = AddonRegistry::new(DebuggerConfig::default());
    registry.register_category(
        "Probe",
        ProbeCategory::factory(log.clone(), DataPackPolicy::Persistent),
        CategoryState::default(),
        NO_SLOT,
    );
    let control: Rc<RefCell<dyn HudControl>> = hud.clone();
    registry.register_extension(GAME_HUD_EXTENSION, HudExtension::factory(control));
    registry.recompute_category_layout();

    let mut replicator = replicator_for(&registry);
    let mut router = InputRouter::from_config(registry.config());
    replicator.set_enabled(true);

    let poke = KeyEvent::new(KeyCode::KeyP, InputModifier::SHIFT);
    assert_eq!(
        router.handle_key(poke, &mut replicator),
        Some(InputAction::Category {
            category_id: 0,
            handler_id: 0
        })
    );
    assert_eq!(log.borrow().inputs, vec![0]);

    let toggle_messages = KeyEvent::new(KeyCode::Tab, InputModifier::CTRL);
    assert_eq!(
        router.handle_key(toggle_messages, &mut replicator),
        Some(InputAction::Extension {
            extension_id: 0,
            handler_id: 1
        })
    );
    assert!(hud.borrow().messages_enabled);

    replicator.set_category_enabled(0, false);
    assert_eq!(router.handle_key(poke, &mut replicator), None);
}

#[test]
fn test_header_lists_slots_and_extensions() {
    let hud = Rc::new(RefCell::new(FakeHud::default()));
    let mut registry = slotted(&[("A", 2), ("B", NO_SLOT), ("C", 2)]);
    let control: Rc<RefCell<dyn HudControl>> = hud.clone();
    registry.register_extension(GAME_HUD_EXTENSION, HudExtension::factory(control));
    registry.notify_extensions_changed();

    let mut replicator = replicator_for(&registry);
    let router = InputRouter::from_config(registry.config());
    replicator.set_enabled(true);
    replicator.set_category_enabled(1, false);

    let mut canvas = RecordingCanvas::new();
    {
        let mut ctx = CanvasContext::new(&mut canvas, CanvasPadding::default());
        router.draw_header(&mut replicator, &mut ctx);
    }

    assert_eq!(
        canvas.lines(),
        vec![
            "[Quote]: close  Debug actor: none",
            "0:B | 2:A+C",
            "Ctrl+Backquote:HUD  Ctrl+Tab:DebugMessages",
        ]
    );
    let b = canvas.texts.iter().find(|t| t.text == "B").unwrap();
    assert_eq!(b.color, dna_debugger_shared::Color::BLACK);
    let shared = canvas.texts.iter().find(|t| t.text == "A+C").unwrap();
    assert_eq!(shared.color, dna_debugger_shared::Color::GREEN);
}
