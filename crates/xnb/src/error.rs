//! Error and warning types for XNB decoding.

use std::fmt;

use thiserror::Error;

/// Broad failure classes a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The bytes are not a decodable container (bad magic, compression,
    /// unsupported pixel data, malformed fields).
    Format,
    /// An object referenced a type reader outside the declared table.
    Registry,
    /// The input ended in the middle of a value.
    Truncated,
}

/// Stable error codes, one per caller-distinguishable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// X001: The input does not start with the `XNB` magic.
    NotXnb,
    /// X002: The container uses in-format stream compression.
    UnsupportedCompression,
    /// X003: A type reference points past the reader table.
    ReaderOutOfRange,
    /// X004: A texture uses a surface format that cannot be unpacked.
    UnsupportedSurfaceFormat,
    /// X005: Unexpected end of input.
    Truncated,
    /// X006: Malformed varint, string, enum value or structure.
    Malformed,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "X001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::NotXnb => "X001",
            ErrorCode::UnsupportedCompression => "X002",
            ErrorCode::ReaderOutOfRange => "X003",
            ErrorCode::UnsupportedSurfaceFormat => "X004",
            ErrorCode::Truncated => "X005",
            ErrorCode::Malformed => "X006",
        }
    }

    /// Process exit status used by command-line front ends.
    ///
    /// 0 is success and 1 is reserved for I/O and usage failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::NotXnb => 2,
            ErrorCode::UnsupportedCompression => 3,
            ErrorCode::ReaderOutOfRange => 4,
            ErrorCode::UnsupportedSurfaceFormat => 5,
            ErrorCode::Truncated => 6,
            ErrorCode::Malformed => 7,
        }
    }

    /// Returns the failure class this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::ReaderOutOfRange => ErrorCategory::Registry,
            ErrorCode::Truncated => ErrorCategory::Truncated,
            _ => ErrorCategory::Format,
        }
    }
}

/// Fatal error during decoding. Any of these aborts the whole file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === X001: Not an XNB file ===
    #[error("[X001] invalid magic bytes: expected XNB, found {found:?}")]
    InvalidMagic { found: Vec<u8> },

    // === X002: Compression ===
    #[error("[X002] compressed XNB files are not supported (flags {flags:#04x})")]
    UnsupportedCompression { flags: u8 },

    // === X003: Reader table ===
    #[error("[X003] type reader reference {reference} out of range (table size: {size})")]
    ReaderOutOfRange { reference: u64, size: usize },

    // === X004: Surface formats ===
    #[error("[X004] surface format {format} is not supported")]
    UnsupportedSurfaceFormat { format: &'static str },

    #[error("[X004] unknown surface format index {index}")]
    UnknownSurfaceFormat { index: i32 },

    // === X005: Truncation ===
    #[error("[X005] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    // === X006: Malformed encoding ===
    #[error("[X006] varint exceeds maximum length (10 bytes)")]
    VarintTooLong,

    #[error("[X006] varint overflow (value exceeds u64)")]
    VarintOverflow,

    #[error("[X006] invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("[X006] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: u64,
        max: u64,
    },

    #[error("[X006] invalid {field} value {value}")]
    InvalidEnum { field: &'static str, value: i64 },

    #[error("[X006] bone reference {reference} out of range ({bone_count} bones)")]
    InvalidBoneReference { reference: u32, bone_count: u32 },

    #[error("[X006] reflective reader {name} cannot be decoded without its runtime type")]
    ReflectiveReader { name: String },

    #[error("[X006] object nesting exceeds maximum depth {max}")]
    DepthExceeded { max: usize },

    /// A fatal error annotated with the location of the offending node.
    #[error("{source} (at {path}, depth {depth})")]
    At {
        path: String,
        depth: usize,
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::InvalidMagic { .. } => ErrorCode::NotXnb,
            DecodeError::UnsupportedCompression { .. } => ErrorCode::UnsupportedCompression,
            DecodeError::ReaderOutOfRange { .. } => ErrorCode::ReaderOutOfRange,
            DecodeError::UnsupportedSurfaceFormat { .. }
            | DecodeError::UnknownSurfaceFormat { .. } => ErrorCode::UnsupportedSurfaceFormat,
            DecodeError::UnexpectedEof { .. } => ErrorCode::Truncated,
            DecodeError::At { source, .. } => source.code(),
            _ => ErrorCode::Malformed,
        }
    }

    /// Returns the failure class for this error.
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// Returns the innermost error, looking through location wrappers.
    pub fn root(&self) -> &DecodeError {
        match self {
            DecodeError::At { source, .. } => source.root(),
            other => other,
        }
    }

    /// Attaches a field path to this error unless one is already present.
    pub(crate) fn located(self, path: String, depth: usize) -> DecodeError {
        match self {
            located @ DecodeError::At { .. } => located,
            other => DecodeError::At {
                path,
                depth,
                source: Box::new(other),
            },
        }
    }
}

/// Non-fatal condition noticed while decoding.
///
/// Warnings never abort decoding; they are collected on the result and
/// logged as they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The platform byte is not one of `w`, `m`, `x`.
    UnknownPlatform { tag: u8 },
    /// The format version byte is not a known XNA release.
    UnknownFormatVersion { version: u8 },
    /// A registered reader name has no decoder; the node decoded to null.
    UnknownReader { name: String, path: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownPlatform { tag } => {
                write!(f, "unknown target platform {:?}", *tag as char)
            }
            Warning::UnknownFormatVersion { version } => {
                write!(f, "unknown format version {version}")
            }
            Warning::UnknownReader { name, path } => {
                write!(f, "no decoder for type reader {name} at {path}; value left empty")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            ErrorCode::NotXnb,
            ErrorCode::UnsupportedCompression,
            ErrorCode::ReaderOutOfRange,
            ErrorCode::UnsupportedSurfaceFormat,
            ErrorCode::Truncated,
            ErrorCode::Malformed,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a.code(), b.code());
                assert_ne!(a.exit_code(), b.exit_code());
            }
            assert!(a.exit_code() > 1);
        }
    }

    #[test]
    fn test_located_error_keeps_code() {
        let err = DecodeError::ReaderOutOfRange { reference: 9, size: 2 }
            .located("primary/List".to_string(), 2);
        assert_eq!(err.code(), ErrorCode::ReaderOutOfRange);
        assert_eq!(err.category(), ErrorCategory::Registry);
        assert!(err.to_string().contains("primary/List"));

        // A second wrap keeps the innermost location.
        let again = err.clone().located("primary".to_string(), 1);
        assert_eq!(again, err);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            DecodeError::InvalidMagic { found: b"ABC".to_vec() }.category(),
            ErrorCategory::Format
        );
        assert_eq!(
            DecodeError::UnexpectedEof { context: "x" }.category(),
            ErrorCategory::Truncated
        );
        assert_eq!(
            DecodeError::UnsupportedSurfaceFormat { format: "Dxt1" }.category(),
            ErrorCategory::Format
        );
    }
}
