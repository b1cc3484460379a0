//! Config command - write defaults for every registered addon

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use dna_debugger_core::config::{self, DebuggerConfig};
use dna_debugger_core::registry::AddonRegistry;

use crate::demo::{console_hud, register_demo_addons};

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Output file (defaults to the platform config directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: ConfigArgs) -> Result<()> {
    let path = match args.output {
        Some(path) => path,
        None => config::config_path().context("No config directory available")?,
    };
    if path.exists() && !args.force {
        bail!("{} already exists, pass --force to overwrite", path.display());
    }

    write_defaults(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn write_defaults(path: &std::path::Path) -> Result<()> {
    let mut registry = AddonRegistry::new(DebuggerConfig::default());
    register_demo_addons(&mut registry, console_hud());
    registry
        .config_mut()
        .save_to(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_debugger_core::config::InputOwner;

    #[test]
    fn test_defaults_list_every_addon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dna_debugger.toml");
        write_defaults(&path).unwrap();

        let config = DebuggerConfig::load_from(&path).unwrap();
        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["AI", "Perception", "Navigation", "Net"]);
        assert_eq!(config.category("Perception").unwrap().slot, 2);
        let cycle = config.find_input(InputOwner::Category("AI"), "CyclePath").unwrap();
        assert_eq!(cycle.key, "C");
        assert!(config.find_input(InputOwner::Extension("GameHUD"), "ToggleHUD").is_some());
    }
}
