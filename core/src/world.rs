//! Boundary to the hosting game world.

use dna_debugger_shared::{ActorId, ControllerId, DebugActorState};

/// Identity of a game world, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u64);

/// Network role of the process running a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetMode {
    #[default]
    Standalone,
    DedicatedServer,
    ListenServer,
    Client,
}

impl NetMode {
    /// Addons created here own the data they collect.
    pub fn has_authority(self) -> bool {
        self != NetMode::Client
    }

    /// A local viewer can exist in this process.
    pub fn is_local(self) -> bool {
        self != NetMode::DedicatedServer
    }
}

/// What the debugger needs to know about the world it runs in.
pub trait World {
    fn id(&self) -> WorldId;

    fn net_mode(&self) -> NetMode;

    /// Game time in seconds
    fn time_seconds(&self) -> f64;

    /// Running in an editor simulation rather than regular play
    fn is_simulating(&self) -> bool {
        false
    }

    fn controllers(&self) -> Vec<ControllerId>;

    fn is_controller_valid(&self, controller: ControllerId) -> bool {
        self.controllers().contains(&controller)
    }

    /// Controller is driven by a player on this machine.
    fn is_local_controller(&self, controller: ControllerId) -> bool;

    /// Display name of a live actor, `None` once it has been destroyed.
    fn actor_name(&self, actor: ActorId) -> Option<String>;
}

/// The actor currently being inspected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DebugActor {
    pub actor: Option<ActorId>,
    /// Kept after the actor dies so the overlay can still name it
    pub name: String,
    /// Bumped on every selection change
    pub sync_counter: i16,
}

impl DebugActor {
    pub fn is_selected(&self) -> bool {
        self.actor.is_some()
    }

    pub fn to_state(&self) -> DebugActorState {
        DebugActorState {
            actor: self.actor,
            name: self.name.clone(),
            sync_counter: self.sync_counter,
        }
    }

    pub fn from_state(state: &DebugActorState) -> Self {
        Self {
            actor: state.actor,
            name: state.name.clone(),
            sync_counter: state.sync_counter,
        }
    }
}
