//! # ianai (library root)
//!
//! This crate provides the core plumbing for the **ianai** CLI (`ai`), a
//! command-line assistant that turns natural-language requests into shell
//! commands by delegating to a configurable AI chat provider:
//!
//! - Provider registry and interactive configuration (`providers`).
//! - The persisted settings document, its defaults and validation (`settings`).
//! - Settings persistence at the active storage location (`store`).
//! - Local vs. iCloud-synced storage resolution and migration (`sync`).
//! - The `config` command surface and the first-run flow (`config`).
//! - Thin HTTP bindings for the supported providers (`api`).
//! - CLI parsing (`commands`) and the prompting capability (`prompt`).
//!
//! ## Settings layout & discovery
//!
//! Settings live in a single `settings.json` document. Its directory is
//! resolved on every access by [`sync::SyncLocator`]:
//!
//! - local: `~/.ianai/settings.json`
//! - iCloud (macOS, once sync is enabled):
//!   `~/Library/Mobile Documents/com~apple~CloudDocs/ianai/settings.json`
//!
//! The iCloud directory wins whenever sync is both supported on the host and
//! already enabled; the local directory is the universal fallback. Enabling
//! or disabling sync migrates the settings file between the two locations,
//! asking for confirmation before anything destructive happens.
//!
//! ## Modules
//! - [`api`], [`commands`], [`config`], [`prompt`], [`providers`],
//!   [`settings`], [`store`], [`sync`]

pub mod api;
pub mod commands;
pub mod config;
pub mod prompt;
pub mod providers;
pub mod settings;
pub mod store;
pub mod sync;
