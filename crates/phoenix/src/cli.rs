//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};

/// Phoenix - a command-line tool that keeps itself up to date
#[derive(Parser, Debug)]
#[command(name = "phoenix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Upgrade the CLI to the latest release
    Upgrade(UpgradeArgs),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Upgrade command
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Only check whether an update is available
    #[arg(long)]
    pub check: bool,

    /// Repository to update from (owner/name)
    #[arg(long, env = "PHOENIX_SLUG")]
    pub slug: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable the download progress bar
    #[arg(long)]
    pub no_progress: bool,
}
