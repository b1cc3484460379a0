//! Persistent debugger configuration
//!
//! The config file stores the global key layout and per-category /
//! per-extension overrides. Addons are recorded the first time they
//! register, so the file doubles as a list of everything that can be
//! tweaked. Entries whose addon no longer registers are pruned on save.

use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::CanvasPadding;
use crate::category::CategoryState;
use crate::input::InputModifier;

/// Config file name inside [`config_dir`]
pub const CONFIG_FILE_NAME: &str = "dna_debugger.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no config directory available on this platform")]
    NoConfigDir,
}

/// Tri-state override for a default chosen by addon code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverrideMode {
    #[default]
    UseDefault,
    Enable,
    Disable,
}

impl OverrideMode {
    pub fn resolve(self, default: bool) -> bool {
        match self {
            Self::UseDefault => default,
            Self::Enable => true,
            Self::Disable => false,
        }
    }
}

/// Key override for one named input handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub cmd: bool,
}

impl InputConfig {
    pub fn modifier(&self) -> InputModifier {
        InputModifier {
            shift: self.shift,
            ctrl: self.ctrl,
            alt: self.alt,
            cmd: self.cmd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    /// Slot the category asked for, or the user's choice when `override_slot` is set
    #[serde(default = "default_slot")]
    pub slot: i32,
    #[serde(default)]
    pub override_slot: bool,
    #[serde(default)]
    pub active_in_game: OverrideMode,
    #[serde(default)]
    pub active_in_simulate: OverrideMode,
    #[serde(default)]
    pub hidden: OverrideMode,
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    pub name: String,
    #[serde(default)]
    pub use_extension: OverrideMode,
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
}

/// Names registered during this run, used to prune stale entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KnownNames {
    categories: HashSet<String>,
    extensions: HashSet<String>,
    category_inputs: HashSet<(String, String)>,
    extension_inputs: HashSet<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebuggerConfig {
    #[serde(default = "default_activation_key")]
    pub activation_key: String,
    #[serde(default = "default_row_next_key")]
    pub category_row_next_key: String,
    #[serde(default = "default_row_prev_key")]
    pub category_row_prev_key: String,
    #[serde(default = "default_slot_keys")]
    pub category_slot_keys: Vec<String>,
    #[serde(default)]
    pub canvas_padding: CanvasPadding,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub extensions: Vec<ExtensionConfig>,
    #[serde(skip)]
    known: KnownNames,
}

fn default_slot() -> i32 {
    -1
}

fn default_activation_key() -> String {
    "Quote".to_string()
}

fn default_row_next_key() -> String {
    "NumpadAdd".to_string()
}

fn default_row_prev_key() -> String {
    "NumpadSubtract".to_string()
}

fn default_slot_keys() -> Vec<String> {
    (0..10).map(|i| format!("Numpad{i}")).collect()
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            activation_key: default_activation_key(),
            category_row_next_key: default_row_next_key(),
            category_row_prev_key: default_row_prev_key(),
            category_slot_keys: default_slot_keys(),
            canvas_padding: CanvasPadding::default(),
            categories: Vec::new(),
            extensions: Vec::new(),
            known: KnownNames::default(),
        }
    }
}

/// Which addon an input entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOwner<'a> {
    Category(&'a str),
    Extension(&'a str),
}

impl DebuggerConfig {
    /// Merge a category's defaults with its config entry, adding the entry
    /// if missing. `slot` and `state` are updated in place.
    pub fn update_category_config(&mut self, name: &str, slot: &mut i32, state: &mut CategoryState) {
        self.known.categories.insert(name.to_string());
        let entry = match self.categories.iter().position(|c| c.name == name) {
            Some(index) => &mut self.categories[index],
            None => {
                self.categories.push(CategoryConfig {
                    name: name.to_string(),
                    slot: *slot,
                    override_slot: false,
                    active_in_game: OverrideMode::UseDefault,
                    active_in_simulate: OverrideMode::UseDefault,
                    hidden: OverrideMode::UseDefault,
                    inputs: Vec::new(),
                });
                let last = self.categories.len() - 1;
                &mut self.categories[last]
            }
        };

        if entry.override_slot {
            *slot = entry.slot;
        } else {
            entry.slot = *slot;
        }

        let in_game = entry.active_in_game.resolve(state.active_in_game());
        let in_simulate = entry.active_in_simulate.resolve(state.active_in_simulate());
        let hidden = entry.hidden.resolve(*state == CategoryState::Hidden);
        *state = CategoryState::from_flags(in_game, in_simulate, hidden);
    }

    /// Apply an extension's enable override.
    pub fn update_extension_config(&mut self, name: &str, use_extension: &mut bool) {
        self.known.extensions.insert(name.to_string());
        match self.extensions.iter().find(|e| e.name == name) {
            Some(entry) => *use_extension = entry.use_extension.resolve(*use_extension),
            None => self.extensions.push(ExtensionConfig {
                name: name.to_string(),
                use_extension: OverrideMode::UseDefault,
                inputs: Vec::new(),
            }),
        }
    }

    /// Apply a stored key override, recording the default when none exists.
    pub fn update_input_config(
        &mut self,
        owner: InputOwner<'_>,
        input_name: &str,
        key: &mut String,
        modifier: &mut InputModifier,
    ) {
        let inputs = match owner {
            InputOwner::Category(name) => {
                self.known
                    .category_inputs
                    .insert((name.to_string(), input_name.to_string()));
                self.categories
                    .iter_mut()
                    .find(|c| c.name == name)
                    .map(|c| &mut c.inputs)
            }
            InputOwner::Extension(name) => {
                self.known
                    .extension_inputs
                    .insert((name.to_string(), input_name.to_string()));
                self.extensions
                    .iter_mut()
                    .find(|e| e.name == name)
                    .map(|e| &mut e.inputs)
            }
        };
        let Some(inputs) = inputs else {
            log::warn!("input '{input_name}' registered for unknown addon {owner:?}");
            return;
        };

        match inputs.iter().find(|i| i.name == input_name) {
            Some(entry) => {
                *key = entry.key.clone();
                *modifier = entry.modifier();
            }
            None => inputs.push(InputConfig {
                name: input_name.to_string(),
                key: key.clone(),
                shift: modifier.shift,
                ctrl: modifier.ctrl,
                alt: modifier.alt,
                cmd: modifier.cmd,
            }),
        }
    }

    /// Stored key override without recording anything.
    pub fn find_input(&self, owner: InputOwner<'_>, input_name: &str) -> Option<&InputConfig> {
        let inputs = match owner {
            InputOwner::Category(name) => &self.categories.iter().find(|c| c.name == name)?.inputs,
            InputOwner::Extension(name) => &self.extensions.iter().find(|e| e.name == name)?.inputs,
        };
        inputs.iter().find(|i| i.name == input_name)
    }

    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn extension(&self, name: &str) -> Option<&ExtensionConfig> {
        self.extensions.iter().find(|e| e.name == name)
    }

    /// Forget that an addon registered, so its entry is pruned on save.
    pub fn forget_category(&mut self, name: &str) {
        self.known.categories.remove(name);
    }

    pub fn forget_extension(&mut self, name: &str) {
        self.known.extensions.remove(name);
    }

    /// Drop entries for addons and inputs that did not register in this run.
    pub fn prune_unknown(&mut self) {
        let known = &self.known;
        self.categories.retain(|c| known.categories.contains(&c.name));
        for category in &mut self.categories {
            category.inputs.retain(|i| {
                known
                    .category_inputs
                    .contains(&(category.name.clone(), i.name.clone()))
            });
        }

        self.extensions.retain(|e| known.extensions.contains(&e.name));
        for extension in &mut self.extensions {
            extension.inputs.retain(|i| {
                known
                    .extension_inputs
                    .contains(&(extension.name.clone(), i.name.clone()))
            });
        }
    }

    /// Carry registration bookkeeping over from another config (reloads).
    pub(crate) fn adopt_known_names(&mut self, other: &DebuggerConfig) {
        self.known = other.known.clone();
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Prune unknown entries and write the file, creating its directory.
    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        self.prune_unknown();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Returns the platform-specific configuration directory.
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.dna", "", "DnaDebugger")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> DebuggerConfig {
    let Some(path) = config_path() else {
        return DebuggerConfig::default();
    };
    match DebuggerConfig::load_from(&path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            DebuggerConfig::default()
        }
        Err(e) => {
            log::warn!("ignoring {}: {e}", path.display());
            DebuggerConfig::default()
        }
    }
}

/// Saves the configuration to the platform config directory.
pub fn save(config: &mut DebuggerConfig) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    config.save_to(&path)
}
