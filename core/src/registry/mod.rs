//! Addon registry
//!
//! Catalog of every category and extension known to the process, their
//! default and resolved states, and the slot layout shown on the overlay
//! header. Replicators build their live addon instances from it.


use std::borrow::Cow;

use smallvec::SmallVec;

use crate::category::{CategoryFactory, CategoryInstance, CategorySetup, CategoryState};
use crate::config::{DebuggerConfig, InputOwner};
use crate::extension::{ExtensionFactory, ExtensionInstance, ExtensionSetup};
use crate::input::{ConfigAccess, InputBinder};
use crate::world::NetMode;

/// Highest slot a category can occupy.
pub const MAX_SLOT: i32 = 100;

/// Slot hint meaning "pick the lowest free slot".
pub const NO_SLOT: i32 = -1;

/// What changed in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    CategoriesChanged,
    ExtensionsChanged,
}

type Listener = Box<dyn FnMut(RegistryEvent)>;

struct CategoryEntry {
    name: String,
    factory: CategoryFactory,
    default_slot: i32,
    default_state: CategoryState,
    slot: i32,
    state: CategoryState,
}

struct ExtensionEntry {
    name: String,
    factory: ExtensionFactory,
    default_enabled: bool,
    enabled: bool,
}

/// Slot assignment of the visible categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryLayout {
    slot_map: Vec<SmallVec<[usize; 2]>>,
    slot_names: Vec<String>,
}

impl CategoryLayout {
    pub fn slot_count(&self) -> usize {
        self.slot_map.len()
    }

    /// Category ids sharing a slot; empty for unused or out-of-range slots.
    pub fn categories_in_slot(&self, slot: usize) -> &[usize] {
        self.slot_map.get(slot).map_or(&[], |ids| ids.as_slice())
    }

    /// Display name of a slot, shared names joined with `+`.
    pub fn slot_name(&self, slot: usize) -> &str {
        self.slot_names.get(slot).map_or("", String::as_str)
    }

    pub fn slot_of(&self, category_id: usize) -> Option<usize> {
        self.slot_map.iter().position(|ids| ids.contains(&category_id))
    }

    /// Category ids in slot order.
    pub fn draw_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.slot_map.iter().flat_map(|ids| ids.iter().copied())
    }
}

/// Everything a replicator needs to build its addons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionContext {
    pub net_mode: NetMode,
    pub simulating: bool,
}

/// Process-wide catalog of categories and extensions.
pub struct AddonRegistry {
    categories: Vec<CategoryEntry>,
    extensions: Vec<ExtensionEntry>,
    config: DebuggerConfig,
    layout: CategoryLayout,
    layout_dirty: bool,
    generation: u64,
    listeners: Vec<Listener>,
}

impl AddonRegistry {
    pub fn new(config: DebuggerConfig) -> Self {
        Self {
            categories: Vec::new(),
            extensions: Vec::new(),
            config,
            layout: CategoryLayout::default(),
            layout_dirty: false,
            generation: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a category under a unique name, replacing any previous one.
    ///
    /// Builds one throwaway instance so its key bindings are recorded in the
    /// config before any replicator exists. Call
    /// [`recompute_category_layout`](Self::recompute_category_layout) once
    /// a batch of registrations is done.
    pub fn register_category(
        &mut self,
        name: &str,
        factory: CategoryFactory,
        default_state: CategoryState,
        slot_hint: i32,
    ) {
        let mut slot = slot_hint;
        let mut state = default_state;
        self.config.update_category_config(name, &mut slot, &mut state);

        {
            let binder = InputBinder::new(
                InputOwner::Category(name),
                ConfigAccess::Record(&mut self.config),
            );
            let mut setup = CategorySetup::new(binder, true, true);
            let _ = factory(&mut setup);
        }

        let entry = CategoryEntry {
            name: name.to_string(),
            factory,
            default_slot: slot_hint,
            default_state,
            slot,
            state,
        };
        match self.categories.iter().position(|c| c.name == name) {
            Some(index) => {
                log::warn!("category '{name}' registered twice, replacing previous factory");
                self.categories[index] = entry;
            }
            None => self.categories.push(entry),
        }
        self.layout_dirty = true;
    }

    /// Live replicators keep their instances until they rebuild.
    pub fn unregister_category(&mut self, name: &str) {
        let before = self.categories.len();
        self.categories.retain(|c| c.name != name);
        if self.categories.len() != before {
            self.config.forget_category(name);
            self.layout_dirty = true;
        }
    }

    pub fn register_extension(&mut self, name: &str, factory: ExtensionFactory) {
        let default_enabled = true;
        let mut enabled = default_enabled;
        self.config.update_extension_config(name, &mut enabled);

        {
            let binder = InputBinder::new(
                InputOwner::Extension(name),
                ConfigAccess::Record(&mut self.config),
            );
            let mut setup = ExtensionSetup::new(binder, true);
            let _ = factory(&mut setup);
        }

        let entry = ExtensionEntry {
            name: name.to_string(),
            factory,
            default_enabled,
            enabled,
        };
        match self.extensions.iter().position(|e| e.name == name) {
            Some(index) => {
                log::warn!("extension '{name}' registered twice, replacing previous factory");
                self.extensions[index] = entry;
            }
            None => self.extensions.push(entry),
        }
    }

    pub fn unregister_extension(&mut self, name: &str) {
        let before = self.extensions.len();
        self.extensions.retain(|e| e.name != name);
        if self.extensions.len() != before {
            self.config.forget_extension(name);
        }
    }

    /// Announce a changed extension set to listeners.
    pub fn notify_extensions_changed(&mut self) {
        self.generation += 1;
        self.notify(RegistryEvent::ExtensionsChanged);
    }

    /// Reassign slots and announce the new layout.
    pub fn recompute_category_layout(&mut self) {
        self.layout = self.compute_layout();
        self.layout_dirty = false;
        self.generation += 1;
        self.notify(RegistryEvent::CategoriesChanged);
    }

    /// Slot layout from the current entries.
    ///
    /// Explicit slots are clamped to [`MAX_SLOT`]. Unassigned categories
    /// take the lowest free slot, visiting them in name order.
    fn compute_layout(&self) -> CategoryLayout {
        let mut candidates: Vec<(i32, &str, usize)> = Vec::new();
        let mut occupied: SmallVec<[i32; 16]> = SmallVec::new();

        for (category_id, entry) in self.visible_categories().enumerate() {
            let slot = if entry.slot < 0 {
                NO_SLOT
            } else {
                entry.slot.min(MAX_SLOT)
            };
            if slot != NO_SLOT && !occupied.contains(&slot) {
                occupied.push(slot);
            }
            candidates.push((slot, entry.name.as_str(), category_id));
        }

        candidates.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.to_ascii_lowercase().cmp(&b.1.to_ascii_lowercase()))
                .then_with(|| a.1.cmp(b.1))
        });

        for candidate in &mut candidates {
            if candidate.0 != NO_SLOT {
                continue;
            }
            let free = (0..).find(|slot| !occupied.contains(slot)).unwrap_or(0);
            occupied.push(free);
            candidate.0 = free;
        }

        let slot_count = candidates
            .iter()
            .map(|c| c.0 as usize + 1)
            .max()
            .unwrap_or(0);
        let mut layout = CategoryLayout {
            slot_map: vec![SmallVec::new(); slot_count],
            slot_names: vec![String::new(); slot_count],
        };
        for (slot, name, category_id) in candidates {
            let slot = slot as usize;
            layout.slot_map[slot].push(category_id);
            let slot_name = &mut layout.slot_names[slot];
            if !slot_name.is_empty() {
                slot_name.push('+');
            }
            slot_name.push_str(name);
        }
        layout
    }

    fn visible_categories(&self) -> impl Iterator<Item = &CategoryEntry> {
        self.categories.iter().filter(|c| !c.state.is_hidden())
    }

    /// Layout live sessions should use: the stored one, or a fresh one when
    /// registrations happened since the last recompute.
    pub fn effective_layout(&self) -> Cow<'_, CategoryLayout> {
        if self.layout_dirty {
            log::debug!("using a layout computed ahead of recompute_category_layout");
            Cow::Owned(self.compute_layout())
        } else {
            Cow::Borrowed(&self.layout)
        }
    }

    /// Build live categories for a replicator, in slot order.
    ///
    /// Ids follow registration order among visible categories, matching
    /// the ids stored in the layout.
    pub fn instantiate_categories(&self, context: SessionContext) -> Vec<CategoryInstance> {
        let has_authority = context.net_mode.has_authority();
        let is_local = context.net_mode.is_local();

        let mut unsorted: Vec<Option<CategoryInstance>> = self
            .visible_categories()
            .enumerate()
            .map(|(category_id, entry)| {
                let binder = InputBinder::new(
                    InputOwner::Category(&entry.name),
                    ConfigAccess::Read(&self.config),
                );
                let mut setup = CategorySetup::new(binder, has_authority, is_local);
                let producer = (entry.factory)(&mut setup);
                let enabled = entry.state.is_enabled_for(context.simulating);
                Some(CategoryInstance::new(
                    category_id,
                    entry.name.clone(),
                    producer,
                    setup,
                    enabled,
                ))
            })
            .collect();

        self.effective_layout()
            .draw_order()
            .filter_map(|category_id| unsorted.get_mut(category_id).and_then(Option::take))
            .collect()
    }

    /// Build live extensions for a replicator, skipping disabled ones.
    pub fn instantiate_extensions(&self, context: SessionContext) -> Vec<ExtensionInstance> {
        let is_local = context.net_mode.is_local();
        self.extensions
            .iter()
            .filter(|e| e.enabled)
            .enumerate()
            .map(|(extension_id, entry)| {
                let binder = InputBinder::new(
                    InputOwner::Extension(&entry.name),
                    ConfigAccess::Read(&self.config),
                );
                let mut setup = ExtensionSetup::new(binder, is_local);
                let producer = (entry.factory)(&mut setup);
                ExtensionInstance::new(extension_id, entry.name.clone(), producer, setup)
            })
            .collect()
    }

    /// Adopt a reloaded config, re-resolving every entry against it.
    ///
    /// Listeners hear about categories or extensions only if a resolved
    /// slot, state or enabled flag actually changed.
    pub fn reconcile_with_config(&mut self, mut config: DebuggerConfig) {
        config.adopt_known_names(&self.config);
        self.config = config;

        let mut categories_changed = false;
        for entry in &mut self.categories {
            let mut slot = entry.default_slot;
            let mut state = entry.default_state;
            self.config
                .update_category_config(&entry.name, &mut slot, &mut state);
            categories_changed |= slot != entry.slot || state != entry.state;
            entry.slot = slot;
            entry.state = state;
        }

        let mut extensions_changed = false;
        for entry in &mut self.extensions {
            let mut enabled = entry.default_enabled;
            self.config.update_extension_config(&entry.name, &mut enabled);
            extensions_changed |= enabled != entry.enabled;
            entry.enabled = enabled;
        }

        if categories_changed {
            log::info!("category config changed, rebuilding layout");
            self.recompute_category_layout();
        }
        if extensions_changed {
            log::info!("extension config changed");
            self.notify_extensions_changed();
        }
    }

    /// Observe layout and extension changes.
    pub fn add_listener(&mut self, listener: impl FnMut(RegistryEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, event: RegistryEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    pub fn layout(&self) -> &CategoryLayout {
        &self.layout
    }

    /// Bumped on every notification; replicators rebuild when it moves.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &DebuggerConfig {
        &self.config
    }

    /// Mutable access for persisting (`config::save` prunes unknown names).
    pub fn config_mut(&mut self) -> &mut DebuggerConfig {
        &mut self.config
    }

    pub fn category_state(&self, name: &str) -> Option<CategoryState> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.state)
    }

    pub fn category_slot(&self, name: &str) -> Option<i32> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.slot)
    }

    pub fn is_extension_enabled(&self, name: &str) -> Option<bool> {
        self.extensions
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.enabled)
    }

    /// Name behind a layout id.
    pub fn category_name(&self, category_id: usize) -> Option<&str> {
        self.visible_categories()
            .nth(category_id)
            .map(|c| c.name.as_str())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }
}
