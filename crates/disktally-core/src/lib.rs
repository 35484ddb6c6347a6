/// DiskTally Core: scanning, aggregation, snapshots, and tree building.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (CLI, GUI, TUI).
///
/// # Modules
///
/// - [`model`]: Flat path→size map, result-tree arena, and size formatting.
/// - [`scanner`]: Concurrent per-root scanning with bottom-up size aggregation.
/// - [`store`]: Snapshot persistence of the last completed scan.
/// - [`platform`]: Drive enumeration.
/// - [`error`]: Error types for scan requests and snapshot I/O.
pub mod error;
pub mod model;
pub mod platform;
pub mod scanner;
pub mod store;

pub use error::{ScanError, StoreError};
