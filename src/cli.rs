//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the bootstrap engine.
#[derive(Parser, Debug)]
#[command(
    name = "bootstrap",
    about = "Idempotent developer-machine bootstrap: packages, dotfiles, shell frameworks",
    version
)]
pub struct Cli {
    /// Subcommand; without one an interactive install starts
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options shared by every subcommand
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override repository root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Append the run log here instead of ~/.bootstrap/<os>.log
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Per-command timeout in seconds (overrides conf/bootstrap.toml)
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Never prompt; fail instead of asking
    #[arg(short = 'y', long, global = true)]
    pub non_interactive: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Converge the selected catalog (default mode: everything)
    Install(InstallOpts),
    /// Re-probe the health targets and print a PASS/FAIL table
    Validate,
    /// Move real files out of the way of dotfile links, without linking
    Backup,
    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct InstallOpts {
    /// Selection mode
    #[arg(
        long,
        value_parser = ["essential", "full-dev", "everything", "custom"],
        conflicts_with = "categories"
    )]
    pub mode: Option<String>,

    /// Install exactly these categories (comma separated)
    #[arg(long, value_name = "LIST")]
    pub categories: Option<String>,

    /// Skip the network reachability check
    #[arg(long)]
    pub offline: bool,

    /// Skip the post-run validator
    #[arg(long)]
    pub no_validate: bool,

    /// Git user name for the identity file
    #[arg(long, value_name = "NAME")]
    pub git_name: Option<String>,

    /// Git email for the identity file
    #[arg(long, value_name = "EMAIL")]
    pub git_email: Option<String>,
}
