use winit::keyboard::KeyCode;

use super::keys::{key_name, parse_key};
use super::{InputHandler, InputMode, InputModifier};
use crate::config::{DebuggerConfig, InputOwner};

/// How a binder consults the config for key overrides.
pub enum ConfigAccess<'a> {
    /// Registration pass: record defaults and apply overrides
    Record(&'a mut DebuggerConfig),
    /// Instantiation: apply overrides only
    Read(&'a DebuggerConfig),
    Detached,
}

/// Collects the key bindings of one addon while it is being constructed.
pub struct InputBinder<'a> {
    owner: Option<InputOwner<'a>>,
    config: ConfigAccess<'a>,
    handlers: Vec<InputHandler>,
}

impl<'a> InputBinder<'a> {
    pub fn new(owner: InputOwner<'a>, config: ConfigAccess<'a>) -> Self {
        Self {
            owner: Some(owner),
            config,
            handlers: Vec::new(),
        }
    }

    /// Binder that ignores config overrides.
    pub fn detached() -> Self {
        Self {
            owner: None,
            config: ConfigAccess::Detached,
            handlers: Vec::new(),
        }
    }

    /// Bind a fixed chord. Returns the handler id, or `None` if the key
    /// name is not recognized.
    pub fn bind_key_press(
        &mut self,
        key: &str,
        modifier: InputModifier,
        mode: InputMode,
    ) -> Option<usize> {
        self.push(String::new(), key, modifier, mode)
    }

    /// Bind a chord the user can override in the config file under `config_name`.
    pub fn bind_configurable_key(
        &mut self,
        config_name: &str,
        default_key: KeyCode,
        default_modifier: InputModifier,
        mode: InputMode,
    ) -> Option<usize> {
        let mut key = key_name(default_key).to_string();
        let mut modifier = default_modifier;

        if let Some(owner) = self.owner {
            match &mut self.config {
                ConfigAccess::Record(config) => {
                    config.update_input_config(owner, config_name, &mut key, &mut modifier);
                }
                ConfigAccess::Read(config) => {
                    if let Some(entry) = config.find_input(owner, config_name) {
                        key = entry.key.clone();
                        modifier = entry.modifier();
                    }
                }
                ConfigAccess::Detached => {}
            }
        }

        self.push(config_name.to_string(), &key, modifier, mode)
    }

    fn push(
        &mut self,
        config_name: String,
        key: &str,
        modifier: InputModifier,
        mode: InputMode,
    ) -> Option<usize> {
        let Some(key) = parse_key(key) else {
            log::warn!(
                "unknown key '{key}' for input '{config_name}' of {:?}, binding skipped",
                self.owner
            );
            return None;
        };
        self.handlers.push(InputHandler {
            config_name,
            key,
            modifier,
            mode,
        });
        Some(self.handlers.len() - 1)
    }

    pub fn handlers(&self) -> &[InputHandler] {
        &self.handlers
    }

    pub fn into_handlers(self) -> Vec<InputHandler> {
        self.handlers
    }
}
