/// DiskTally CLI: terminal frontend.
///
/// This crate contains the session state machine and text rendering.
/// Business logic lives in `disktally-core`.
pub mod cli;
pub mod render;
pub mod state;

pub use cli::{run, Cli, Command};
