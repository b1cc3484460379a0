//! DNA CLI - command line harness for the DNA debugger
//!
//! # Commands
//!
//! - `dna simulate` - Run a listen server and a client side by side and
//!   print the client's overlay
//! - `dna layout` - Show how the sample categories are laid out in slots
//! - `dna config` - Write a config file listing every tweakable setting
//!
//! # Usage
//!
//! ```bash
//! # 30 seconds of game time, a quarter of unreliable traffic lost
//! dna simulate --steps 300 --loss 0.25
//!
//! # Same, over real sockets on localhost
//! dna simulate --udp
//! ```

mod config;
mod demo;
mod layout;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// DNA CLI - command line harness for the DNA debugger
#[derive(Parser)]
#[command(name = "dna")]
#[command(about = "Command line harness for the DNA debugger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replicate the sample categories from a server to a client
    Simulate(simulate::SimulateArgs),

    /// Print the category slot layout
    Layout(layout::LayoutArgs),

    /// Write a config file with defaults for every registered addon
    Config(config::ConfigArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate::execute(args),
        Commands::Layout(args) => layout::execute(args),
        Commands::Config(args) => config::execute(args),
    }
}
