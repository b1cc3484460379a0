//! Debug categories
//!
//! A category is one pluggable source of debug information (AI state,
//! navigation, perception, ...). Addon code implements [`Category`]; the
//! debugger wraps each instance in a [`CategoryInstance`] that owns the
//! replicated text lines, shapes and data packs, tracks the collection
//! interval, and drives the per-category transfer state machine.

mod instance;
mod setup;


pub use instance::{CategoryInstance, CategoryPhase, SceneProxy};
pub use setup::{CategoryFactory, CategorySettings, CategorySetup};

use dna_debugger_shared::{ControllerId, Shape};
use serde::{Deserialize, Serialize};

use crate::canvas::CanvasContext;
use crate::world::DebugActor;

/// Where a category is active by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryState {
    #[default]
    EnabledInGameAndSimulate,
    EnabledInGame,
    EnabledInSimulate,
    Disabled,
    /// Never listed on the overlay
    Hidden,
}

impl CategoryState {
    pub fn active_in_game(self) -> bool {
        matches!(self, Self::EnabledInGameAndSimulate | Self::EnabledInGame)
    }

    pub fn active_in_simulate(self) -> bool {
        matches!(self, Self::EnabledInGameAndSimulate | Self::EnabledInSimulate)
    }

    pub fn is_hidden(self) -> bool {
        self == Self::Hidden
    }

    pub fn from_flags(in_game: bool, in_simulate: bool, hidden: bool) -> Self {
        match (hidden, in_game, in_simulate) {
            (true, _, _) => Self::Hidden,
            (false, true, true) => Self::EnabledInGameAndSimulate,
            (false, true, false) => Self::EnabledInGame,
            (false, false, true) => Self::EnabledInSimulate,
            (false, false, false) => Self::Disabled,
        }
    }

    /// Enabled when a world starts in the given mode.
    pub fn is_enabled_for(self, simulating: bool) -> bool {
        if simulating {
            self.active_in_simulate()
        } else {
            self.active_in_game()
        }
    }
}

/// Collection input for [`Category::collect`].
pub struct CollectContext<'a> {
    pub owner: ControllerId,
    pub debug_actor: Option<&'a DebugActor>,
    pub world_time: f64,
    has_authority: bool,
    lines: &'a mut Vec<String>,
    shapes: &'a mut Vec<Shape>,
}

impl<'a> CollectContext<'a> {
    pub(crate) fn new(
        owner: ControllerId,
        debug_actor: Option<&'a DebugActor>,
        world_time: f64,
        has_authority: bool,
        lines: &'a mut Vec<String>,
        shapes: &'a mut Vec<Shape>,
    ) -> Self {
        Self {
            owner,
            debug_actor,
            world_time,
            has_authority,
            lines,
            shapes,
        }
    }

    /// Append a replicated line of marked-up text. Ignored without authority.
    pub fn add_text_line(&mut self, line: impl Into<String>) {
        if self.has_authority {
            self.lines.push(line.into());
        }
    }

    /// Append a replicated shape. Ignored without authority.
    pub fn add_shape(&mut self, shape: Shape) {
        if self.has_authority {
            self.shapes.push(shape);
        }
    }
}

/// Requests a category can make from an input handler.
#[derive(Debug, Default)]
pub struct CategoryControl {
    dirty_packs: Vec<usize>,
    collect_now: bool,
}

impl CategoryControl {
    /// Replicate the pack on the next collection even if unchanged.
    pub fn mark_data_pack_dirty(&mut self, pack_id: usize) {
        self.dirty_packs.push(pack_id);
    }

    /// Skip the remaining collection interval.
    pub fn force_collect(&mut self) {
        self.collect_now = true;
    }
}

/// Addon-side behaviour of a category. Every method has an empty default.
pub trait Category {
    /// Authority only: gather lines, shapes and pack contents.
    fn collect(&mut self, _ctx: &mut CollectContext<'_>) {}

    /// Extra drawing after the replicated lines and shapes.
    fn draw(&mut self, _owner: ControllerId, _canvas: &mut CanvasContext<'_>) {}

    /// Serialize a data pack. Leaving `out` empty tells viewers to reset it.
    fn write_data_pack(&self, _pack_id: usize, _out: &mut Vec<u8>) {}

    /// Viewer: deserialize a completed data pack.
    fn read_data_pack(&mut self, _pack_id: usize, _bytes: &[u8]) {}

    /// Clear a data pack's contents.
    fn reset_data_pack(&mut self, _pack_id: usize) {}

    fn on_data_pack_replicated(&mut self, _pack_id: usize) {}

    fn on_input(&mut self, _handler_id: usize, _control: &mut CategoryControl) {}

    fn on_debugger_activated(&mut self) {}

    fn on_debugger_deactivated(&mut self) {}

    /// Optional 3D scene drawable.
    fn create_scene_proxy(&self) -> Option<SceneProxy> {
        None
    }
}
