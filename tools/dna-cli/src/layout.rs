//! Layout command - print category slots

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dna_debugger_core::config::{self, DebuggerConfig};
use dna_debugger_core::registry::AddonRegistry;

use crate::demo::{console_hud, register_demo_addons};

/// Arguments for the layout command
#[derive(Args)]
pub struct LayoutArgs {
    /// Config file to read instead of the platform default
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn execute(args: LayoutArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => DebuggerConfig::load_from(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => config::load(),
    };
    let mut registry = AddonRegistry::new(config);
    register_demo_addons(&mut registry, console_hud());

    for line in describe_layout(&registry) {
        println!("{line}");
    }
    Ok(())
}

/// One line per occupied slot: number, combined name, default state of each member.
pub fn describe_layout(registry: &AddonRegistry) -> Vec<String> {
    let layout = registry.layout();
    let mut lines = Vec::new();
    for slot in 0..layout.slot_count() {
        let ids = layout.categories_in_slot(slot);
        if ids.is_empty() {
            continue;
        }
        let states: Vec<String> = ids
            .iter()
            .filter_map(|id| registry.category_name(*id))
            .map(|name| {
                let state = registry
                    .category_state(name)
                    .map_or_else(|| "?".to_string(), |s| format!("{s:?}"));
                format!("{name}={state}")
            })
            .collect();
        lines.push(format!("{slot:>3}  {:<24} {}", layout.slot_name(slot), states.join(", ")));
    }
    lines
}
