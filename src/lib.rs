// Library exports for testing and potential library use
//
// The profile model and merge engine live in `credsync-profile`, the source
// file watcher in `credsync-watcher`. This crate wires them to the command
// line, the settings file, logging and the STS account lookup.

/// Application version (root crate version).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod debug;
pub mod handler;
pub mod http;
pub mod identity;

pub use credsync_profile as profile;
pub use credsync_watcher as watcher;
