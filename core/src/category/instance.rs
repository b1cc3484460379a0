use dna_debugger_shared::{
    CategoryRecord, ControllerId, DataPackHeader, DataPackPolicy, Shape, is_newer_version,
};
use tracing::{debug, trace};

use super::{Category, CategoryControl, CategorySettings, CategorySetup, CollectContext};
use crate::canvas::CanvasContext;
use crate::input::InputHandler;
use crate::pack::{ChunkReceipt, DataPack, Replicated};
use crate::world::DebugActor;

/// Per-category transfer state.
///
/// ```text
/// Idle -> Collecting -> PendingReplication -> InFlight -> Synced
///              ^                                            |
///              +--------------------------------------------+
/// ```
///
/// Collecting falls straight through to Synced when no pack changed.
/// Viewers move from Idle/Synced to InFlight when a chunk arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryPhase {
    #[default]
    Idle,
    Collecting,
    PendingReplication,
    InFlight,
    Synced,
}

/// 3D drawable handed to the scene renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneProxy {
    /// Scene show-flag the proxy is tied to
    pub view_flag: &'static str,
    pub shapes: Vec<Shape>,
}

impl SceneProxy {
    pub fn view_flag_for(simulating: bool) -> &'static str {
        if simulating { "DebugAI" } else { "Game" }
    }
}

/// A category owned by one replicator.
pub struct CategoryInstance {
    id: usize,
    name: String,
    settings: CategorySettings,
    has_authority: bool,
    is_local: bool,
    enabled: bool,
    phase: CategoryPhase,
    text_lines: Vec<String>,
    shapes: Vec<Shape>,
    packs: Vec<DataPack>,
    /// Viewer: headers last announced by the authority
    remote_headers: Vec<DataPackHeader>,
    handlers: Vec<InputHandler>,
    last_collect_time: Option<f64>,
    render_dirty: bool,
    producer: Box<dyn Category>,
}

impl CategoryInstance {
    pub fn new(
        id: usize,
        name: impl Into<String>,
        producer: Box<dyn Category>,
        setup: CategorySetup<'_>,
        enabled: bool,
    ) -> Self {
        let packs: Vec<DataPack> = setup.data_packs.iter().map(|p| DataPack::new(*p)).collect();
        Self {
            id,
            name: name.into(),
            settings: setup.settings,
            has_authority: setup.has_authority(),
            is_local: setup.is_local(),
            enabled,
            phase: CategoryPhase::Idle,
            text_lines: Vec::new(),
            shapes: Vec::new(),
            remote_headers: vec![DataPackHeader::default(); packs.len()],
            packs,
            handlers: setup.input.into_handlers(),
            last_collect_time: None,
            render_dirty: false,
            producer,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &CategorySettings {
        &self.settings
    }

    pub fn has_authority(&self) -> bool {
        self.has_authority
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> CategoryPhase {
        self.phase
    }

    pub fn text_lines(&self) -> &[String] {
        &self.text_lines
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn data_packs(&self) -> &[DataPack] {
        &self.packs
    }

    pub fn handlers(&self) -> &[InputHandler] {
        &self.handlers
    }

    pub fn producer(&self) -> &dyn Category {
        self.producer.as_ref()
    }

    /// Returns `true` once after anything visible changed.
    pub fn take_render_dirty(&mut self) -> bool {
        std::mem::take(&mut self.render_dirty)
    }

    /// Returns whether the flag changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        self.render_dirty = true;
        if enabled {
            // collect right away instead of waiting out the interval
            self.last_collect_time = None;
        }
        true
    }

    pub fn should_collect(&self, now: f64, force: bool) -> bool {
        if !self.has_authority || !self.enabled {
            return false;
        }
        force
            || self
                .last_collect_time
                .is_none_or(|last| now - last >= self.settings.collect_interval)
    }

    /// Authority: run the producer and queue changed data packs.
    ///
    /// With `deliver_locally` the viewer shares this instance, so queued
    /// packs count as received immediately. Returns whether any pack was
    /// queued for replication.
    pub fn collect(
        &mut self,
        owner: ControllerId,
        debug_actor: &DebugActor,
        now: f64,
        force: bool,
        deliver_locally: bool,
    ) -> bool {
        if !self.should_collect(now, force) {
            return false;
        }
        self.last_collect_time = Some(now);
        self.phase = CategoryPhase::Collecting;

        let previous_lines = std::mem::take(&mut self.text_lines);
        let previous_shapes = std::mem::take(&mut self.shapes);
        for (pack_id, pack) in self.packs.iter().enumerate() {
            if pack.policy() == DataPackPolicy::ResetOnTick {
                self.producer.reset_data_pack(pack_id);
            }
        }

        let actor = debug_actor.is_selected().then_some(debug_actor);
        if actor.is_some() || !self.settings.show_only_with_debug_actor {
            let mut ctx = CollectContext::new(
                owner,
                actor,
                now,
                self.has_authority,
                &mut self.text_lines,
                &mut self.shapes,
            );
            self.producer.collect(&mut ctx);
        }
        if self.text_lines != previous_lines || self.shapes != previous_shapes {
            self.render_dirty = true;
        }

        let mut queued = false;
        for pack_id in 0..self.packs.len() {
            let mut payload = Vec::new();
            self.producer.write_data_pack(pack_id, &mut payload);
            let pack = &mut self.packs[pack_id];
            if !pack.request_replication(payload, debug_actor.sync_counter) {
                continue;
            }
            queued = true;
            if deliver_locally {
                pack.mark_delivered_locally();
                self.producer.on_data_pack_replicated(pack_id);
                self.render_dirty = true;
            }
        }

        self.phase = if queued && !deliver_locally {
            CategoryPhase::PendingReplication
        } else if self.packs.iter().any(|p| !p.is_received()) {
            CategoryPhase::InFlight
        } else {
            CategoryPhase::Synced
        };
        trace!(category = %self.name, phase = ?self.phase, "collected");
        queued
    }

    /// Authority: reset packs tied to the debug actor and collect again soon.
    pub fn on_debug_actor_changed(&mut self) {
        for (pack_id, pack) in self.packs.iter_mut().enumerate() {
            if pack.policy() == DataPackPolicy::ResetOnActorChange {
                self.producer.reset_data_pack(pack_id);
                pack.cancel_transfer();
            }
        }
        self.last_collect_time = None;
    }

    /// Authority: chunks due for sending, as `(pack_id, header, bytes)`.
    pub fn outgoing_chunks(&mut self) -> Vec<(usize, DataPackHeader, Vec<u8>)> {
        let mut chunks = Vec::new();
        for (pack_id, pack) in self.packs.iter_mut().enumerate() {
            if let Some((header, bytes)) = pack.next_chunk_to_send() {
                chunks.push((pack_id, header, bytes));
            }
        }
        if self.packs.iter().any(|p| !p.is_received()) {
            self.phase = CategoryPhase::InFlight;
        }
        chunks
    }

    /// Authority: viewer confirmed a chunk.
    pub fn on_chunk_ack(&mut self, pack_id: usize, version: i16, offset: i32) {
        let Some(pack) = self.packs.get_mut(pack_id) else {
            debug!(category = %self.name, pack_id, "ack for unknown data pack");
            return;
        };
        pack.on_chunk_ack(version, offset);
        if self.packs.iter().all(DataPack::is_received) {
            self.phase = CategoryPhase::Synced;
        }
    }

    /// Viewer: store a chunk, handing completed payloads to the producer.
    pub fn on_chunk_received(
        &mut self,
        pack_id: usize,
        header: DataPackHeader,
        bytes: &[u8],
    ) -> Option<ChunkReceipt> {
        let Some(pack) = self.packs.get_mut(pack_id) else {
            debug!(category = %self.name, pack_id, "chunk for unknown data pack");
            return None;
        };
        let receipt = pack.on_chunk_received(header, bytes)?;
        self.phase = CategoryPhase::InFlight;

        if receipt.completed {
            match pack.replicated_payload() {
                Some(Replicated::Reset) => self.producer.reset_data_pack(pack_id),
                Some(Replicated::Apply(payload)) => {
                    self.producer.read_data_pack(pack_id, &payload)
                }
                None => return Some(receipt),
            }
            self.producer.on_data_pack_replicated(pack_id);
            self.render_dirty = true;
        }
        if self.packs.iter().all(|p| !p.is_in_progress()) {
            self.phase = CategoryPhase::Synced;
        }
        Some(receipt)
    }

    pub fn to_record(&self) -> CategoryRecord {
        CategoryRecord {
            category_id: self.id as u32,
            enabled: self.enabled,
            text_lines: self.text_lines.clone(),
            shapes: self.shapes.clone(),
            data_packs: self.packs.iter().map(|p| p.header).collect(),
        }
    }

    /// Viewer: take over replicated lines, shapes and flags.
    pub fn apply_record(&mut self, record: &CategoryRecord) {
        if self.text_lines != record.text_lines || self.shapes != record.shapes {
            self.text_lines.clone_from(&record.text_lines);
            self.shapes.clone_from(&record.shapes);
            self.render_dirty = true;
        }
        self.set_enabled(record.enabled);
        for (remote, header) in self.remote_headers.iter_mut().zip(&record.data_packs) {
            *remote = *header;
        }
    }

    /// Transfer progress shown on the overlay, `None` when idle.
    pub fn pack_progress(&self, pack_id: usize) -> Option<(f32, i16)> {
        let pack = self.packs.get(pack_id)?;
        let remote = self.remote_headers.get(pack_id).copied().unwrap_or_default();
        if !self.has_authority && is_newer_version(remote.version, pack.header.version) {
            return Some((0.0, remote.version));
        }
        pack.is_in_progress()
            .then(|| (pack.progress(), pack.header.version))
    }

    pub fn handle_input(&mut self, handler_id: usize) {
        let mut control = CategoryControl::default();
        self.producer.on_input(handler_id, &mut control);
        for pack_id in control.dirty_packs {
            if let Some(pack) = self.packs.get_mut(pack_id) {
                pack.mark_dirty();
            }
        }
        if control.collect_now {
            self.last_collect_time = None;
        }
        self.render_dirty = true;
    }

    pub fn on_debugger_activated(&mut self) {
        self.producer.on_debugger_activated();
    }

    pub fn on_debugger_deactivated(&mut self) {
        self.producer.on_debugger_deactivated();
    }

    pub fn scene_proxy(&self) -> Option<SceneProxy> {
        self.producer.create_scene_proxy()
    }

    /// Draw status lines, replicated content and producer extras.
    pub fn draw(&mut self, owner: ControllerId, canvas: &mut CanvasContext<'_>, now: f64) {
        let prefix = if self.settings.show_category_name {
            canvas.print(&format!("\n{{green}}[CATEGORY: {}]", self.name));
            String::new()
        } else {
            format!("{{green}}[{}]{{white}}  ", self.name)
        };

        if self.settings.show_update_timer && self.has_authority {
            let elapsed = self.last_collect_time.map_or(0.0, |last| now - last);
            let remaining = (self.settings.collect_interval - elapsed).max(0.0);
            canvas.print(&format!("{prefix}Next update in: {{yellow}}{remaining:.0}s"));
        }

        if self.settings.show_data_pack_replication {
            let count = self.packs.len();
            for pack_id in 0..count {
                let Some((progress, version)) = self.pack_progress(pack_id) else {
                    continue;
                };
                let percent = progress * 100.0;
                let line = if count == 1 {
                    format!("{prefix}Replicating: {{red}}{percent:.0}% {{white}}(ver:{version})")
                } else {
                    format!(
                        "{prefix}Replicating data[{pack_id}]: {{red}}{percent:.0}% {{white}}(ver:{version})"
                    )
                };
                canvas.print(&line);
            }
        }

        for line in &self.text_lines {
            canvas.print(line);
        }
        for shape in &self.shapes {
            canvas.draw_shape(shape);
        }
        self.producer.draw(owner, canvas);
    }
}
