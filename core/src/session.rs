//! Per-world session bookkeeping
//!
//! A [`SessionManager`] keeps one [`Replicator`] per player controller in a
//! world, plus an [`InputRouter`] for each controller driven from this
//! process. [`DebuggerModule`] owns the process-wide addon registry and
//! hands out one manager per world.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use dna_debugger_shared::{ControllerId, ReplicatorMessage};
use hashbrown::HashMap;

use crate::canvas::{Canvas, CanvasContext};
use crate::config::{self, ConfigError, DebuggerConfig};
use crate::input::{InputAction, InputRouter, KeyEvent};
use crate::registry::{AddonRegistry, SessionContext};
use crate::replicator::Replicator;
use crate::world::{World, WorldId};

/// Housekeeping interval while no session exists
pub const FAST_TICK_INTERVAL: f64 = 0.5;
/// Housekeeping interval once at least one session exists
pub const SLOW_TICK_INTERVAL: f64 = 5.0;
/// Bookkeeping map size above which dead entries are purged
pub const PURGE_THRESHOLD: usize = 5;

/// Everything kept for one player controller.
pub struct PlayerSession {
    pub replicator: Replicator,
    /// Present when the controller is driven from this process
    pub router: Option<InputRouter>,
}

pub struct SessionManager {
    registry: Rc<RefCell<AddonRegistry>>,
    world_id: Option<WorldId>,
    context: SessionContext,
    has_authority: bool,
    is_local: bool,
    initialized: bool,
    tick_interval: f64,
    next_housekeeping: f64,
    sessions: Vec<PlayerSession>,
    pending: Vec<Replicator>,
}

impl SessionManager {
    pub fn new(registry: Rc<RefCell<AddonRegistry>>) -> Self {
        Self {
            registry,
            world_id: None,
            context: SessionContext::default(),
            has_authority: false,
            is_local: false,
            initialized: false,
            tick_interval: FAST_TICK_INTERVAL,
            next_housekeeping: 0.0,
            sessions: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Bind to `world` and register replicators that arrived early.
    pub fn begin_play(&mut self, world: &dyn World) {
        let net_mode = world.net_mode();
        self.world_id = Some(world.id());
        self.context = SessionContext {
            net_mode,
            simulating: world.is_simulating(),
        };
        self.has_authority = net_mode.has_authority();
        self.is_local = net_mode.is_local();
        self.initialized = true;
        log::debug!("session manager started for {:?} ({net_mode:?})", world.id());

        if self.has_authority {
            self.update_auth_replicators(world);
        }
        for replicator in std::mem::take(&mut self.pending) {
            self.register_replicator(replicator, world);
        }
    }

    /// Drop every session, closing open overlays first.
    pub fn end_play(&mut self) {
        for session in &mut self.sessions {
            if session.replicator.is_enabled() {
                session.replicator.set_enabled(false);
            }
        }
        self.sessions.clear();
        self.pending.clear();
        self.initialized = false;
    }

    pub fn world_id(&self) -> Option<WorldId> {
        self.world_id
    }

    pub fn tick_interval(&self) -> f64 {
        self.tick_interval
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn sessions(&self) -> &[PlayerSession] {
        &self.sessions
    }

    pub fn controllers(&self) -> Vec<ControllerId> {
        self.sessions.iter().map(|s| s.replicator.owner()).collect()
    }

    pub fn session(&self, controller: ControllerId) -> Option<&PlayerSession> {
        self.sessions
            .iter()
            .find(|s| s.replicator.owner() == controller)
    }

    pub fn session_mut(&mut self, controller: ControllerId) -> Option<&mut PlayerSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.replicator.owner() == controller)
    }

    pub fn replicator(&self, controller: ControllerId) -> Option<&Replicator> {
        self.session(controller).map(|s| &s.replicator)
    }

    pub fn replicator_mut(&mut self, controller: ControllerId) -> Option<&mut Replicator> {
        self.session_mut(controller).map(|s| &mut s.replicator)
    }

    /// Authority housekeeping: tear down sessions of vanished controllers
    /// and spawn a replicator for every controller without one.
    pub fn update_auth_replicators(&mut self, world: &dyn World) {
        let before = self.sessions.len();
        self.sessions
            .retain(|s| world.is_controller_valid(s.replicator.owner()));
        if self.sessions.len() != before {
            log::debug!("removed {} stale debugger sessions", before - self.sessions.len());
        }

        for controller in world.controllers() {
            if self.session(controller).is_some() {
                continue;
            }
            let replicator = {
                let registry = self.registry.borrow();
                Replicator::new(
                    controller,
                    &registry,
                    self.context,
                    world.is_local_controller(controller),
                )
            };
            self.register_replicator(replicator, world);
        }

        self.tick_interval = if self.sessions.is_empty() {
            FAST_TICK_INTERVAL
        } else {
            SLOW_TICK_INTERVAL
        };
    }

    /// Adopt a replicator, queueing it until [`Self::begin_play`] ran.
    pub fn register_replicator(&mut self, replicator: Replicator, world: &dyn World) {
        if !self.initialized {
            self.pending.push(replicator);
            return;
        }
        let controller = replicator.owner();
        if self.session(controller).is_some() {
            log::warn!("{controller:?} already has a debugger session, ignoring");
            return;
        }

        let router = (self.is_local && world.is_local_controller(controller))
            .then(|| InputRouter::from_config(self.registry.borrow().config()));
        tracing::debug!(?controller, local = router.is_some(), "debugger session registered");
        self.sessions.push(PlayerSession { replicator, router });
    }

    /// Rebuild the key bindings of `controller` from the current config.
    pub fn refresh_input_bindings(&mut self, controller: ControllerId) {
        let registry = self.registry.clone();
        if let Some(session) = self.session_mut(controller) {
            if session.router.is_some() {
                session.router = Some(InputRouter::from_config(registry.borrow().config()));
            }
        }
    }

    /// Per-frame driver: housekeeping when due, then registry sync and
    /// authority collection for every session.
    pub fn tick(&mut self, world: &dyn World) {
        if !self.initialized {
            return;
        }
        let now = world.time_seconds();
        if self.has_authority && now >= self.next_housekeeping {
            self.update_auth_replicators(world);
            self.next_housekeeping = now + self.tick_interval;
        }

        let registry = self.registry.clone();
        let registry = registry.borrow();
        for session in &mut self.sessions {
            if session.replicator.sync_with_registry(&registry) && session.router.is_some() {
                session.router = Some(InputRouter::from_config(registry.config()));
            }
            if session.replicator.has_authority() {
                session.replicator.tick(world);
            }
        }
    }

    /// Route a key press from a local player.
    pub fn handle_key(&mut self, controller: ControllerId, event: KeyEvent) -> Option<InputAction> {
        let session = self.session_mut(controller)?;
        let router = session.router.as_mut()?;
        router.handle_key(event, &mut session.replicator)
    }

    /// Apply a message received from the other side of `controller`'s session.
    pub fn handle_message(&mut self, controller: ControllerId, from: ControllerId, message: ReplicatorMessage) {
        match self.replicator_mut(controller) {
            Some(replicator) => replicator.handle_message(from, message),
            None => tracing::debug!(?controller, "message for unknown session dropped"),
        }
    }

    /// Everything every session wants to send, tagged with its controller.
    pub fn drain_outgoing(&mut self) -> Vec<(ControllerId, ReplicatorMessage)> {
        let mut out = Vec::new();
        for session in &mut self.sessions {
            let owner = session.replicator.owner();
            out.extend(session.replicator.drain_outgoing().into_iter().map(|m| (owner, m)));
        }
        out
    }

    /// Draw the overlay of a local player: header first, then categories.
    pub fn draw(&mut self, controller: ControllerId, canvas: &mut dyn Canvas, now: f64) {
        let padding = self.registry.borrow().config().canvas_padding;
        let Some(session) = self.session_mut(controller) else {
            return;
        };
        let Some(router) = &session.router else {
            return;
        };
        let mut ctx = CanvasContext::new(canvas, padding);
        router.draw_header(&mut session.replicator, &mut ctx);
        session.replicator.draw(&mut ctx, now);
    }
}

/// Process-wide debugger state: the addon registry and one session
/// manager per live world.
pub struct DebuggerModule {
    registry: Rc<RefCell<AddonRegistry>>,
    managers: HashMap<WorldId, Weak<RefCell<SessionManager>>>,
}

impl DebuggerModule {
    pub fn new(config: DebuggerConfig) -> Self {
        Self {
            registry: Rc::new(RefCell::new(AddonRegistry::new(config))),
            managers: HashMap::new(),
        }
    }

    /// Start with the configuration stored in the platform config directory.
    pub fn with_stored_config() -> Self {
        Self::new(config::load())
    }

    pub fn registry(&self) -> Rc<RefCell<AddonRegistry>> {
        self.registry.clone()
    }

    /// Session manager of `world`, created and started on first use.
    ///
    /// The module only keeps a weak reference; the caller owns the manager
    /// for as long as the world lives.
    pub fn session_manager(&mut self, world: &dyn World) -> Rc<RefCell<SessionManager>> {
        if self.managers.len() > PURGE_THRESHOLD {
            self.managers.retain(|_, manager| manager.strong_count() > 0);
        }

        if let Some(manager) = self.managers.get(&world.id()).and_then(Weak::upgrade) {
            return manager;
        }

        let manager = Rc::new(RefCell::new(SessionManager::new(self.registry.clone())));
        manager.borrow_mut().begin_play(world);
        self.managers.insert(world.id(), Rc::downgrade(&manager));
        manager
    }

    /// Worlds with a manager entry, live or not yet purged.
    pub fn tracked_worlds(&self) -> usize {
        self.managers.len()
    }

    /// Prune unregistered names and persist the configuration.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(self.registry.borrow_mut().config_mut())
    }
}
