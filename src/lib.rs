//! TabShell, a minimal tabbed web browser shell.
//!
//! The core (tabs, the tab collection, bookmarks, session persistence and the
//! shell controller) is engine-agnostic and runs headless. The `gui` feature
//! adds a wry/tao host with real web views.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod action_handler;
pub mod app;
pub mod cli;
pub mod engine;
pub mod logging;
pub mod managers;
pub mod platform;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;
