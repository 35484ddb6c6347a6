/// Platform-specific functionality: drive enumeration.

pub mod drives;

pub use drives::{available_drives, DriveInfo, DriveType};
