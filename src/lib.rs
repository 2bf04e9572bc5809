//! Nightly AppImage updater for OrcaSlicer.
//!
//! Resolves the newest nightly release across candidate repositories, picks
//! the best-matching AppImage, installs it behind a stable symlink, and
//! registers it with the desktop menu.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: load and validate the TOML configuration, resolve the [`config::Layout`]
//! - **[`release`]** and **[`select`]**: find a release and choose its asset
//! - **[`install`]** and **[`desktop`]**: filesystem changes, built on [`resources`]
//! - **[`commands`]**: top-level subcommand orchestration (`update`, `status`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod desktop;
pub mod error;
pub mod exec;
pub mod install;
pub mod launch;
pub mod logging;
pub mod preflight;
pub mod release;
pub mod resources;
pub mod select;
