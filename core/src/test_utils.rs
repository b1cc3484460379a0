//! Shared test utilities for integration and unit tests

use std::cell::RefCell;
use std::rc::Rc;

use dna_debugger_shared::{ActorId, Color, ControllerId, DataPackPolicy, Shape};
use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use winit::keyboard::KeyCode;

use crate::canvas::{Canvas, CanvasContext};
use crate::category::{Category, CategoryControl, CategoryFactory, CollectContext};
use crate::extension::{Extension, ExtensionFactory, HudControl};
use crate::input::{InputMode, InputModifier};
use crate::world::{NetMode, World, WorldId};

// ============================================================================
// World
// ============================================================================

/// World whose controllers, actors and clock are set by the test.
pub struct ScriptedWorld {
    pub id: WorldId,
    pub net_mode: NetMode,
    pub time: f64,
    pub simulating: bool,
    pub controllers: Vec<ControllerId>,
    pub local_controllers: Vec<ControllerId>,
    pub actors: HashMap<ActorId, String>,
}

impl ScriptedWorld {
    pub fn new(net_mode: NetMode) -> Self {
        Self {
            id: WorldId(1),
            net_mode,
            time: 0.0,
            simulating: false,
            controllers: Vec::new(),
            local_controllers: Vec::new(),
            actors: HashMap::new(),
        }
    }

    pub fn with_controller(mut self, controller: ControllerId, local: bool) -> Self {
        self.add_controller(controller, local);
        self
    }

    pub fn add_controller(&mut self, controller: ControllerId, local: bool) {
        self.controllers.push(controller);
        if local {
            self.local_controllers.push(controller);
        }
    }

    pub fn remove_controller(&mut self, controller: ControllerId) {
        self.controllers.retain(|c| *c != controller);
        self.local_controllers.retain(|c| *c != controller);
    }

    pub fn spawn_actor(&mut self, actor: ActorId, name: &str) {
        self.actors.insert(actor, name.to_string());
    }

    pub fn destroy_actor(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
    }

    pub fn advance(&mut self, seconds: f64) {
        self.time += seconds;
    }
}

impl World for ScriptedWorld {
    fn id(&self) -> WorldId {
        self.id
    }

    fn net_mode(&self) -> NetMode {
        self.net_mode
    }

    fn time_seconds(&self) -> f64 {
        self.time
    }

    fn is_simulating(&self) -> bool {
        self.simulating
    }

    fn controllers(&self) -> Vec<ControllerId> {
        self.controllers.clone()
    }

    fn is_local_controller(&self, controller: ControllerId) -> bool {
        self.local_controllers.contains(&controller)
    }

    fn actor_name(&self, actor: ActorId) -> Option<String> {
        self.actors.get(&actor).cloned()
    }
}

// ============================================================================
// Canvas
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnText {
    pub position: Vec2,
    pub text: String,
    pub color: Color,
}

/// Canvas with an 8px monospace font that records every draw call.
///
/// Projection drops z; locations with negative z count as off screen.
pub struct RecordingCanvas {
    pub texts: Vec<DrawnText>,
    pub shapes: Vec<Shape>,
    clip: Vec2,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self {
            texts: Vec::new(),
            shapes: Vec::new(),
            clip: Vec2::new(800.0, 600.0),
        }
    }

    pub fn with_clip(mut self, width: f32, height: f32) -> Self {
        self.clip = Vec2::new(width, height);
        self
    }

    /// Drawn text joined per screen row, in draw order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<(f32, String)> = Vec::new();
        for text in &self.texts {
            match lines.last_mut() {
                Some((y, line)) if *y == text.position.y => line.push_str(&text.text),
                _ => lines.push((text.position.y, text.text.clone())),
            }
        }
        lines.into_iter().map(|(_, line)| line).collect()
    }

    /// Everything drawn, one row per line.
    pub fn transcript(&self) -> String {
        self.lines().join("\n")
    }
}

impl Canvas for RecordingCanvas {
    fn draw_text(&mut self, position: Vec2, text: &str, color: Color) {
        self.texts.push(DrawnText {
            position,
            text: text.to_string(),
            color,
        });
    }

    fn text_size(&self, text: &str) -> Vec2 {
        Vec2::new(text.chars().count() as f32 * 8.0, 10.0)
    }

    fn line_height(&self) -> f32 {
        10.0
    }

    fn clip_size(&self) -> Vec2 {
        self.clip
    }

    fn project(&self, location: Vec3) -> Vec2 {
        Vec2::new(location.x, location.y)
    }

    fn is_location_visible(&self, location: Vec3) -> bool {
        location.z >= 0.0
    }

    fn draw_shape(&mut self, shape: &Shape) {
        self.shapes.push(shape.clone());
    }
}

// ============================================================================
// Addons
// ============================================================================

/// Engine switches seen by the HUD extension.
#[derive(Debug, Default)]
pub struct FakeHud {
    pub hud_visible: bool,
    pub messages_enabled: bool,
}

impl HudControl for FakeHud {
    fn set_game_hud_visible(&mut self, visible: bool) {
        self.hud_visible = visible;
    }

    fn set_debug_messages_enabled(&mut self, enabled: bool) {
        self.messages_enabled = enabled;
    }

    fn debug_messages_enabled(&self) -> bool {
        self.messages_enabled
    }
}

struct QuietCategory;

impl Category for QuietCategory {}

/// Category that does nothing.
pub fn quiet_category() -> CategoryFactory {
    Box::new(|_| Box::new(QuietCategory))
}

struct QuietExtension;

impl Extension for QuietExtension {}

pub fn quiet_extension() -> ExtensionFactory {
    Box::new(|_| Box::new(QuietExtension))
}

/// Everything a [`ProbeCategory`] was asked to do.
#[derive(Debug, Default)]
pub struct ProbeLog {
    pub collects: usize,
    /// Contents written into data pack 0 on every collection
    pub payload: Vec<u8>,
    pub resets: Vec<usize>,
    /// Payloads handed over by replication
    pub received: Vec<Vec<u8>>,
    pub replicated: Vec<usize>,
    pub inputs: Vec<usize>,
    pub activated: usize,
    pub deactivated: usize,
    pub draws: usize,
}

/// Category with one data pack and two key bindings, logging every call.
///
/// Handler 0 ("Poke", Shift+P) runs on the authority, handler 1 ("Peek", L)
/// runs locally.
pub struct ProbeCategory {
    log: Rc<RefCell<ProbeLog>>,
}

impl ProbeCategory {
    pub fn factory(log: Rc<RefCell<ProbeLog>>, policy: DataPackPolicy) -> CategoryFactory {
        Box::new(move |setup| {
            setup.add_data_pack(policy);
            setup.input.bind_configurable_key(
                "Poke",
                KeyCode::KeyP,
                InputModifier::SHIFT,
                InputMode::Replicated,
            );
            setup
                .input
                .bind_configurable_key("Peek", KeyCode::KeyL, InputModifier::NONE, InputMode::Local);
            setup.settings.show_only_with_debug_actor = false;
            Box::new(ProbeCategory { log: log.clone() })
        })
    }
}

impl Category for ProbeCategory {
    fn collect(&mut self, ctx: &mut CollectContext<'_>) {
        let mut log = self.log.borrow_mut();
        log.collects += 1;
        ctx.add_text_line(format!("{{white}}payload: {{yellow}}{}", log.payload.len()));
        if let Some(actor) = ctx.debug_actor {
            ctx.add_text_line(format!("actor: {}", actor.name));
        }
    }

    fn draw(&mut self, _owner: ControllerId, _canvas: &mut CanvasContext<'_>) {
        self.log.borrow_mut().draws += 1;
    }

    fn write_data_pack(&self, _pack_id: usize, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.log.borrow().payload);
    }

    fn read_data_pack(&mut self, _pack_id: usize, bytes: &[u8]) {
        self.log.borrow_mut().received.push(bytes.to_vec());
    }

    fn reset_data_pack(&mut self, pack_id: usize) {
        self.log.borrow_mut().resets.push(pack_id);
    }

    fn on_data_pack_replicated(&mut self, pack_id: usize) {
        self.log.borrow_mut().replicated.push(pack_id);
    }

    fn on_input(&mut self, handler_id: usize, control: &mut CategoryControl) {
        self.log.borrow_mut().inputs.push(handler_id);
        control.mark_data_pack_dirty(0);
    }

    fn on_debugger_activated(&mut self) {
        self.log.borrow_mut().activated += 1;
    }

    fn on_debugger_deactivated(&mut self) {
        self.log.borrow_mut().deactivated += 1;
    }
}

/// Deterministic payload that compresses poorly.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    use rand::{RngCore, SeedableRng};
    let mut rng = rand_pcg::Pcg64::seed_from_u64(seed);
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    bytes
}
