//! Container header.

use crate::limits::FORMAT_VERSION;

/// Platform the content was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    WindowsPhone7,
    Xbox360,
    /// Unrecognized platform tag, kept for labeling.
    Unknown(u8),
}

impl Platform {
    /// Creates a Platform from its wire tag.
    pub fn from_u8(tag: u8) -> Platform {
        match tag {
            b'w' => Platform::Windows,
            b'm' => Platform::WindowsPhone7,
            b'x' => Platform::Xbox360,
            other => Platform::Unknown(other),
        }
    }

    /// Human-readable platform name.
    pub fn name(self) -> &'static str {
        match self {
            Platform::Windows => "Microsoft Windows",
            Platform::WindowsPhone7 => "Windows Phone 7",
            Platform::Xbox360 => "Xbox 360",
            Platform::Unknown(_) => "unknown",
        }
    }
}

/// Graphics profile the content targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Reach,
    HiDef,
}

/// Parsed container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub platform: Platform,
    /// Raw format version byte.
    pub format_version: u8,
    pub profile: Profile,
    /// Raw flags byte.
    pub flags: u8,
    /// Declared total file size. Recorded, never checked.
    pub file_size: u32,
}

impl Header {
    /// Name of the toolchain release for the format version, if known.
    pub fn format_version_name(&self) -> Option<&'static str> {
        (self.format_version == FORMAT_VERSION).then_some("XNA Game Studio 4.0")
    }
}
