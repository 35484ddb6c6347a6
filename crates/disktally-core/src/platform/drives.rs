/// Drive enumeration.
///
/// On Windows the logical drives are listed through the Windows API;
/// elsewhere the filesystem root `/` is the only drive.
use std::path::PathBuf;

/// Information about a single scannable drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveInfo {
    /// Mount point path, e.g. `C:\` or `/`.
    pub path: PathBuf,
    /// Short label, e.g. `C:` or `/`.
    pub letter: String,
    pub drive_type: DriveType,
}

/// Drive type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveType {
    Fixed,
    Removable,
    Network,
    CdRom,
    Unknown,
}

impl DriveType {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed",
            Self::Removable => "Removable",
            Self::Network => "Network",
            Self::CdRom => "CD-ROM",
            Self::Unknown => "Unknown",
        }
    }
}

/// Enumerate the local drives available for scanning.
///
/// Network/remote drives are excluded. Returns an empty vec if the
/// Windows API call fails.
#[cfg(windows)]
pub fn available_drives() -> Vec<DriveInfo> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use windows::Win32::Storage::FileSystem::{GetDriveTypeW, GetLogicalDriveStringsW};

    // Drive type constants from the Windows API.
    const DRIVE_REMOVABLE_VAL: u32 = 2;
    const DRIVE_FIXED_VAL: u32 = 3;
    const DRIVE_REMOTE_VAL: u32 = 4;
    const DRIVE_CDROM_VAL: u32 = 5;

    let mut drives = Vec::new();

    // GetLogicalDriveStringsW returns null-separated drive root strings.
    let mut buffer = [0u16; 256];
    let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };

    if len == 0 {
        tracing::warn!("GetLogicalDriveStringsW returned 0");
        return drives;
    }

    let full = OsString::from_wide(&buffer[..len as usize]);
    let full_str = full.to_string_lossy();

    for root in full_str.split('\0').filter(|s| !s.is_empty()) {
        let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
        let root_pcwstr = windows::core::PCWSTR(root_wide.as_ptr());

        let raw_type = unsafe { GetDriveTypeW(root_pcwstr) };
        let drive_type = match raw_type {
            DRIVE_FIXED_VAL => DriveType::Fixed,
            DRIVE_REMOVABLE_VAL => DriveType::Removable,
            DRIVE_REMOTE_VAL => DriveType::Network,
            DRIVE_CDROM_VAL => DriveType::CdRom,
            _ => DriveType::Unknown,
        };

        if drive_type == DriveType::Network {
            continue;
        }

        drives.push(DriveInfo {
            path: PathBuf::from(root),
            letter: root.trim_end_matches('\\').to_string(),
            drive_type,
        });
    }

    drives
}

/// Enumerate the local drives available for scanning.
#[cfg(not(windows))]
pub fn available_drives() -> Vec<DriveInfo> {
    vec![DriveInfo {
        path: PathBuf::from("/"),
        letter: "/".to_string(),
        drive_type: DriveType::Fixed,
    }]
}
