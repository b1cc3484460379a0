use dna_debugger_shared::DataPackPolicy;

use super::Category;
use crate::input::InputBinder;

/// Builds a category. Called once at registration (to record key bindings)
/// and once per replicator.
pub type CategoryFactory = Box<dyn Fn(&mut CategorySetup<'_>) -> Box<dyn Category>>;

/// Presentation and collection settings of a category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategorySettings {
    /// Minimum seconds between collections, 0 collects every tick
    pub collect_interval: f64,
    pub show_data_pack_replication: bool,
    pub show_update_timer: bool,
    pub show_category_name: bool,
    /// Skip collection while no debug actor is selected
    pub show_only_with_debug_actor: bool,
}

impl Default for CategorySettings {
    fn default() -> Self {
        Self {
            collect_interval: 0.0,
            show_data_pack_replication: false,
            show_update_timer: false,
            show_category_name: true,
            show_only_with_debug_actor: true,
        }
    }
}

/// Handed to a [`CategoryFactory`] to declare data packs, settings and keys.
pub struct CategorySetup<'a> {
    pub settings: CategorySettings,
    pub input: InputBinder<'a>,
    pub(crate) data_packs: Vec<DataPackPolicy>,
    has_authority: bool,
    is_local: bool,
}

impl<'a> CategorySetup<'a> {
    pub fn new(input: InputBinder<'a>, has_authority: bool, is_local: bool) -> Self {
        Self {
            settings: CategorySettings::default(),
            input,
            data_packs: Vec::new(),
            has_authority,
            is_local,
        }
    }

    /// Declare a data pack; returns its id.
    pub fn add_data_pack(&mut self, policy: DataPackPolicy) -> usize {
        self.data_packs.push(policy);
        self.data_packs.len() - 1
    }

    pub fn set_collect_interval(&mut self, seconds: f64) {
        self.settings.collect_interval = seconds.max(0.0);
    }

    pub fn has_authority(&self) -> bool {
        self.has_authority
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }
}
