//! Idempotent developer-machine provisioning engine.
//!
//! Converges a machine toward a catalog of targets: packages from the
//! platform's package managers, symlinked dotfiles, cloned shell frameworks,
//! and a rendered git identity file. Every target is probed before it is
//! applied, so re-running is safe and only does the missing work.
//!
//! The public API is organised into these layers:
//!
//! - **[`platform`]**: OS and shell detection, the per-run context
//! - **[`config`]**: the TOML catalog and run settings
//! - **[`backends`]**: one adapter per package manager
//! - **[`resources`]**: probe-then-apply primitives (packages, links, clones, templates)
//! - **[`select`]**: mode and category selection, with prompts
//! - **[`converge`]**: the driver, backup pass, and validator
//! - **[`commands`]**: subcommand orchestration (`install`, `validate`, `backup`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod backends;
pub mod cli;
pub mod commands;
pub mod config;
pub mod converge;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod select;
