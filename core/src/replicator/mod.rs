//! Per-viewer debugger session
//!
//! A [`Replicator`] exists once per player controller on the authority and
//! once on the viewer that owns that controller. The authority copy runs
//! category collection and streams records and data pack chunks; the
//! viewer copy rebuilds the same categories from that stream and forwards
//! user requests back as RPC messages.
//!
//! When the viewer lives in the same process as the authority (standalone
//! or listen server host) a single replicator plays both roles and data
//! packs are delivered without going through the message queue.


use dna_debugger_shared::{
    ActorId, CategoryRecord, ControllerId, DataPackAck, DataPackChunk, DataPackPolicy,
    ReplicatorMessage, is_newer_version,
};
use hashbrown::HashMap;
use tracing::{debug, info, trace, warn};

use crate::canvas::CanvasContext;
use crate::category::{CategoryInstance, SceneProxy};
use crate::extension::ExtensionInstance;
use crate::input::InputMode;
use crate::registry::{AddonRegistry, CategoryLayout, SessionContext};
use crate::world::{DebugActor, World};

/// Flushes between full resends of every category record.
pub const KEYFRAME_INTERVAL: u32 = 30;

pub struct Replicator {
    owner: ControllerId,
    context: SessionContext,
    has_authority: bool,
    is_local: bool,
    /// Authority whose viewer shares this instance
    deliver_locally: bool,
    enabled: bool,
    debug_actor: DebugActor,
    categories: Vec<CategoryInstance>,
    extensions: Vec<ExtensionInstance>,
    layout: CategoryLayout,
    registry_generation: u64,
    outbox: Vec<ReplicatorMessage>,
    sent_records: HashMap<usize, CategoryRecord>,
    sent_enabled: Option<bool>,
    sent_debug_actor: Option<DebugActor>,
    keyframe_countdown: u32,
    /// Viewer selection waiting for the next tick to resolve its name
    pending_debug_actor: Option<Option<ActorId>>,
    render_dirty: bool,
}

impl Replicator {
    /// `owner_is_local` marks a controller driven from this process.
    pub fn new(
        owner: ControllerId,
        registry: &AddonRegistry,
        context: SessionContext,
        owner_is_local: bool,
    ) -> Self {
        let has_authority = context.net_mode.has_authority();
        let is_local = context.net_mode.is_local();
        let mut replicator = Self {
            owner,
            context,
            has_authority,
            is_local,
            deliver_locally: has_authority && owner_is_local,
            enabled: false,
            debug_actor: DebugActor::default(),
            categories: Vec::new(),
            extensions: Vec::new(),
            layout: CategoryLayout::default(),
            registry_generation: 0,
            outbox: Vec::new(),
            sent_records: HashMap::new(),
            sent_enabled: None,
            sent_debug_actor: None,
            keyframe_countdown: 0,
            pending_debug_actor: None,
            render_dirty: false,
        };
        replicator.rebuild(registry);
        replicator
    }

    pub fn owner(&self) -> ControllerId {
        self.owner
    }

    pub fn has_authority(&self) -> bool {
        self.has_authority
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn delivers_locally(&self) -> bool {
        self.deliver_locally
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn debug_actor(&self) -> &DebugActor {
        &self.debug_actor
    }

    /// Categories in slot order.
    pub fn categories(&self) -> &[CategoryInstance] {
        &self.categories
    }

    pub fn category(&self, category_id: usize) -> Option<&CategoryInstance> {
        self.categories.iter().find(|c| c.id() == category_id)
    }

    fn category_mut(&mut self, category_id: usize) -> Option<&mut CategoryInstance> {
        self.categories.iter_mut().find(|c| c.id() == category_id)
    }

    pub fn extensions(&self) -> &[ExtensionInstance] {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut [ExtensionInstance] {
        &mut self.extensions
    }

    pub fn layout(&self) -> &CategoryLayout {
        &self.layout
    }

    /// Rebuild addons if the registry changed since the last call.
    pub fn sync_with_registry(&mut self, registry: &AddonRegistry) -> bool {
        if registry.generation() == self.registry_generation {
            return false;
        }
        self.rebuild(registry);
        true
    }

    fn rebuild(&mut self, registry: &AddonRegistry) {
        if self.enabled {
            self.notify_activation(false);
        }
        self.categories = registry.instantiate_categories(self.context);
        self.extensions = registry.instantiate_extensions(self.context);
        self.layout = registry.effective_layout().into_owned();
        self.registry_generation = registry.generation();
        self.sent_records.clear();
        self.keyframe_countdown = 0;
        if self.enabled {
            self.notify_activation(true);
        }
        if self.has_authority {
            for category in &mut self.categories {
                category.on_debug_actor_changed();
            }
        }
        self.render_dirty = true;
        debug!(
            owner = self.owner.0,
            categories = self.categories.len(),
            extensions = self.extensions.len(),
            "replicator rebuilt"
        );
    }

    /// Turn the overlay on or off for this viewer.
    pub fn set_enabled(&mut self, enable: bool) {
        if !self.has_authority {
            self.outbox.push(ReplicatorMessage::SetEnabled(enable));
        }
        self.apply_enabled(enable);
    }

    fn apply_enabled(&mut self, enable: bool) {
        if self.enabled == enable {
            return;
        }
        self.enabled = enable;
        self.notify_activation(enable);
        self.render_dirty = true;
        info!(owner = self.owner.0, enable, "debugger toggled");
    }

    fn notify_activation(&mut self, active: bool) {
        for category in &mut self.categories {
            if active {
                category.on_debugger_activated();
            } else {
                category.on_debugger_deactivated();
            }
        }
        if !self.is_local {
            return;
        }
        for extension in &mut self.extensions {
            if active {
                extension.on_activated();
            } else {
                extension.on_deactivated();
            }
        }
    }

    pub fn set_category_enabled(&mut self, category_id: usize, enable: bool) {
        if !self.has_authority {
            self.outbox.push(ReplicatorMessage::SetCategoryEnabled {
                category_id: category_id as u32,
                enable,
            });
        }
        let Some(category) = self.category_mut(category_id) else {
            debug!(category_id, "set_category_enabled for unknown category");
            return;
        };
        if category.set_enabled(enable) {
            self.render_dirty = true;
        }
    }

    /// Select the actor to inspect, `None` to clear the selection.
    ///
    /// Viewers forward the request; the authority resolves the name and
    /// bumps the sync counter so packs tied to the old actor are dropped.
    pub fn set_debug_actor(&mut self, actor: Option<ActorId>, world: &dyn World) {
        if !self.has_authority {
            self.outbox.push(ReplicatorMessage::SetDebugActor(actor));
            return;
        }
        if self.debug_actor.actor == actor {
            return;
        }

        let name = actor
            .and_then(|a| world.actor_name(a))
            .unwrap_or_default();
        self.debug_actor = DebugActor {
            actor,
            name,
            sync_counter: self.debug_actor.sync_counter.wrapping_add(1),
        };
        debug!(
            owner = self.owner.0,
            actor = ?actor,
            sync_counter = self.debug_actor.sync_counter,
            "debug actor changed"
        );
        for category in &mut self.categories {
            category.on_debug_actor_changed();
        }
        self.render_dirty = true;
    }

    /// Run a category key handler here or on the authority, per its mode.
    pub fn send_category_input_event(&mut self, category_id: usize, handler_id: usize) {
        let has_authority = self.has_authority;
        let Some(category) = self.category_mut(category_id) else {
            debug!(category_id, "input for unknown category");
            return;
        };
        let Some(handler) = category.handlers().get(handler_id) else {
            debug!(category_id, handler_id, "input for unknown handler");
            return;
        };
        if has_authority || handler.mode == InputMode::Local {
            category.handle_input(handler_id);
            self.render_dirty = true;
        } else {
            self.outbox.push(ReplicatorMessage::CategoryInput {
                category_id: category_id as u32,
                handler_id: handler_id as u32,
            });
        }
    }

    pub fn send_extension_input_event(&mut self, extension_id: usize, handler_id: usize) {
        let has_authority = self.has_authority;
        let Some(extension) = self.extensions.get_mut(extension_id) else {
            debug!(extension_id, "input for unknown extension");
            return;
        };
        let Some(handler) = extension.handlers().get(handler_id) else {
            debug!(extension_id, handler_id, "input for unknown handler");
            return;
        };
        if has_authority || handler.mode == InputMode::Local {
            extension.handle_input(handler_id);
            self.render_dirty = true;
        } else {
            self.outbox.push(ReplicatorMessage::ExtensionInput {
                extension_id: extension_id as u32,
                handler_id: handler_id as u32,
            });
        }
    }

    /// One authority update: apply viewer requests, collect, then queue
    /// replication traffic. Viewers have nothing to do per tick.
    pub fn tick(&mut self, world: &dyn World) {
        if !self.has_authority {
            return;
        }
        if let Some(actor) = self.pending_debug_actor.take() {
            self.set_debug_actor(actor, world);
        }
        self.collect_category_data(world, false);
        self.flush_replication();
    }

    /// Authority: collect every category whose interval elapsed.
    ///
    /// A selected actor that no longer exists in the world counts as no
    /// selection for this pass; its name stays on the overlay.
    pub fn collect_category_data(&mut self, world: &dyn World, force: bool) {
        if !self.has_authority || !self.enabled {
            return;
        }
        let now = world.time_seconds();
        let mut actor = self.debug_actor.clone();
        if let Some(id) = actor.actor.filter(|id| world.actor_name(*id).is_none()) {
            trace!(actor = ?id, "debug actor is gone, collecting without it");
            actor.actor = None;
        }

        for category in &mut self.categories {
            if category.collect(self.owner, &actor, now, force, self.deliver_locally) {
                trace!(category = category.name(), "data packs queued");
            }
            if category.take_render_dirty() {
                self.render_dirty = true;
            }
        }
    }

    /// Authority: queue state, changed records and due chunks for the viewer.
    pub fn flush_replication(&mut self) {
        if !self.has_authority || self.deliver_locally {
            return;
        }

        let keyframe = self.keyframe_countdown == 0;
        self.keyframe_countdown = if keyframe {
            KEYFRAME_INTERVAL
        } else {
            self.keyframe_countdown - 1
        };

        if self.sent_enabled != Some(self.enabled) {
            self.sent_enabled = Some(self.enabled);
            self.outbox.push(ReplicatorMessage::ReplicatorState {
                enabled: self.enabled,
            });
        }
        if self.sent_debug_actor.as_ref() != Some(&self.debug_actor) {
            self.sent_debug_actor = Some(self.debug_actor.clone());
            self.outbox
                .push(ReplicatorMessage::DebugActor(self.debug_actor.to_state()));
        }

        let mut records = Vec::new();
        for category in &self.categories {
            let record = category.to_record();
            let changed = self
                .sent_records
                .get(&category.id())
                .is_none_or(|sent| !sent.same_replicated_state(&record));
            if keyframe || changed {
                self.sent_records.insert(category.id(), record.clone());
                records.push(record);
            }
        }
        if !records.is_empty() {
            self.outbox.push(ReplicatorMessage::CategoryRecords(records));
        }

        for category in &mut self.categories {
            let category_id = category.id() as u32;
            for (pack_id, header, bytes) in category.outgoing_chunks() {
                trace!(
                    category = category.name(),
                    pack_id,
                    version = header.version,
                    offset = header.offset,
                    "sending chunk"
                );
                self.outbox
                    .push(ReplicatorMessage::DataPackChunk(DataPackChunk {
                        category_id,
                        pack_id: pack_id as u32,
                        header,
                        bytes,
                    }));
            }
        }
    }

    /// Apply one message from the other side of the session.
    ///
    /// On the authority, `from` must be the owning controller and every id
    /// is range checked; anything else is dropped with a log entry.
    pub fn handle_message(&mut self, from: ControllerId, message: ReplicatorMessage) {
        if self.has_authority {
            self.handle_rpc(from, message);
        } else {
            self.handle_replicated(message);
        }
    }

    fn handle_rpc(&mut self, from: ControllerId, message: ReplicatorMessage) {
        if from != self.owner {
            warn!(
                owner = self.owner.0,
                from = from.0,
                "rejected message from a controller that does not own this replicator"
            );
            return;
        }
        match message {
            ReplicatorMessage::SetEnabled(enable) => self.apply_enabled(enable),
            ReplicatorMessage::SetDebugActor(actor) => {
                self.pending_debug_actor = Some(actor);
            }
            ReplicatorMessage::SetCategoryEnabled {
                category_id,
                enable,
            } => {
                if self.category(category_id as usize).is_none() {
                    debug!(category_id, "rejected set_category_enabled");
                    return;
                }
                self.set_category_enabled(category_id as usize, enable);
            }
            ReplicatorMessage::CategoryInput {
                category_id,
                handler_id,
            } => {
                let accepted = self
                    .category(category_id as usize)
                    .and_then(|c| c.handlers().get(handler_id as usize))
                    .is_some_and(|h| h.mode == InputMode::Replicated);
                if !accepted {
                    debug!(category_id, handler_id, "rejected category input");
                    return;
                }
                self.send_category_input_event(category_id as usize, handler_id as usize);
            }
            ReplicatorMessage::ExtensionInput {
                extension_id,
                handler_id,
            } => {
                let accepted = self
                    .extensions
                    .get(extension_id as usize)
                    .and_then(|e| e.handlers().get(handler_id as usize))
                    .is_some_and(|h| h.mode == InputMode::Replicated);
                if !accepted {
                    debug!(extension_id, handler_id, "rejected extension input");
                    return;
                }
                self.send_extension_input_event(extension_id as usize, handler_id as usize);
            }
            ReplicatorMessage::DataPackAck(ack) => self.on_ack(ack),
            other => debug!(?other, "viewer-bound message received by authority"),
        }
    }

    fn on_ack(&mut self, ack: DataPackAck) {
        let Some(category) = self.category_mut(ack.category_id as usize) else {
            debug!(category_id = ack.category_id, "ack for unknown category");
            return;
        };
        category.on_chunk_ack(ack.pack_id as usize, ack.version, ack.offset);
    }

    fn handle_replicated(&mut self, message: ReplicatorMessage) {
        match message {
            ReplicatorMessage::ReplicatorState { enabled } => self.apply_enabled(enabled),
            ReplicatorMessage::DebugActor(state) => {
                let actor = DebugActor::from_state(&state);
                if actor != self.debug_actor {
                    self.debug_actor = actor;
                    self.render_dirty = true;
                }
            }
            ReplicatorMessage::CategoryRecords(records) => {
                for record in &records {
                    let Some(category) = self.category_mut(record.category_id as usize) else {
                        debug!(category_id = record.category_id, "record for unknown category");
                        continue;
                    };
                    category.apply_record(record);
                    if category.take_render_dirty() {
                        self.render_dirty = true;
                    }
                }
            }
            ReplicatorMessage::DataPackChunk(chunk) => self.on_chunk(chunk),
            other => debug!(?other, "authority-bound message received by viewer"),
        }
    }

    fn on_chunk(&mut self, chunk: DataPackChunk) {
        let sync_counter = self.debug_actor.sync_counter;
        let Some(category) = self.category_mut(chunk.category_id as usize) else {
            debug!(category_id = chunk.category_id, "chunk for unknown category");
            return;
        };
        let pack_id = chunk.pack_id as usize;
        let stale = category.data_packs().get(pack_id).is_some_and(|pack| {
            pack.policy() == DataPackPolicy::ResetOnActorChange
                && is_newer_version(sync_counter, chunk.header.sync_counter)
        });
        if stale {
            debug!(
                category = category.name(),
                pack_id,
                sync_counter = chunk.header.sync_counter,
                "dropping chunk for a previous debug actor"
            );
            return;
        }

        let Some(receipt) = category.on_chunk_received(pack_id, chunk.header, &chunk.bytes) else {
            return;
        };
        if category.take_render_dirty() {
            self.render_dirty = true;
        }
        self.outbox.push(ReplicatorMessage::DataPackAck(DataPackAck {
            category_id: chunk.category_id,
            pack_id: chunk.pack_id,
            version: receipt.ack_version,
            offset: receipt.ack_offset,
        }));
    }

    /// Take everything queued for the other side.
    pub fn drain_outgoing(&mut self) -> Vec<ReplicatorMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Returns `true` once after anything visible changed.
    pub fn take_render_dirty(&mut self) -> bool {
        let categories_dirty = self
            .categories
            .iter_mut()
            .fold(false, |dirty, c| c.take_render_dirty() || dirty);
        std::mem::take(&mut self.render_dirty) || categories_dirty
    }

    /// Draw every enabled category in slot order.
    pub fn draw(&mut self, canvas: &mut CanvasContext<'_>, now: f64) {
        if !self.enabled {
            return;
        }
        for category in &mut self.categories {
            if category.is_enabled() {
                category.draw(self.owner, canvas, now);
            }
        }
    }

    /// 3D drawables of enabled categories.
    pub fn scene_proxies(&self) -> Vec<SceneProxy> {
        if !self.enabled {
            return Vec::new();
        }
        self.categories
            .iter()
            .filter(|c| c.is_enabled())
            .filter_map(CategoryInstance::scene_proxy)
            .collect()
    }
}
