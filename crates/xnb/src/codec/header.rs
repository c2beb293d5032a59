//! Container header parsing.
//!
//! ```text
//! "XNB" | platform u8 | version u8 | flags u8 | file size u32
//! ```

use tracing::{debug, warn};

use crate::codec::primitives::Reader;
use crate::error::{DecodeError, Warning};
use crate::limits::{FLAG_COMPRESSED, FLAG_HIDEF, FORMAT_VERSION, MAGIC};
use crate::model::{Header, Platform, Profile};

/// Decodes the header, pushing non-fatal findings onto `warnings`.
///
/// Fails with [`DecodeError::InvalidMagic`] before reading anything past
/// the magic, and with [`DecodeError::UnsupportedCompression`] as soon as
/// the flags byte announces a compressed stream.
pub fn decode_header(reader: &mut Reader<'_>, warnings: &mut Vec<Warning>) -> Result<Header, DecodeError> {
    let head = &reader.remaining()[..reader.remaining_len().min(MAGIC.len())];
    if head != MAGIC {
        return Err(DecodeError::InvalidMagic { found: head.to_vec() });
    }
    reader.read_bytes(MAGIC.len(), "magic")?;

    let tag = reader.read_byte("platform")?;
    let platform = Platform::from_u8(tag);
    if let Platform::Unknown(tag) = platform {
        warn!(tag, "unknown target platform");
        warnings.push(Warning::UnknownPlatform { tag });
    } else {
        debug!(platform = platform.name(), "target platform");
    }

    let format_version = reader.read_byte("format_version")?;
    if format_version != FORMAT_VERSION {
        warn!(format_version, "unknown format version");
        warnings.push(Warning::UnknownFormatVersion { version: format_version });
    }

    let flags = reader.read_byte("flags")?;
    let profile = if flags & FLAG_HIDEF != 0 { Profile::HiDef } else { Profile::Reach };
    if flags & FLAG_COMPRESSED != 0 {
        return Err(DecodeError::UnsupportedCompression { flags });
    }

    let file_size = reader.read_u32("file_size")?;
    debug!(?profile, file_size, "header");

    Ok(Header {
        platform,
        format_version,
        profile,
        flags,
        file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::primitives::Writer;
    use crate::error::ErrorCode;

    fn header_bytes(platform: u8, version: u8, flags: u8) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_bytes(b"XNB");
        w.write_byte(platform);
        w.write_byte(version);
        w.write_byte(flags);
        w.write_u32(1234);
        w.into_bytes()
    }

    #[test]
    fn test_valid_header() {
        let data = header_bytes(b'w', 5, 0x01);
        let mut reader = Reader::new(&data);
        let mut warnings = Vec::new();
        let header = decode_header(&mut reader, &mut warnings).unwrap();
        assert_eq!(header.platform, Platform::Windows);
        assert_eq!(header.profile, Profile::HiDef);
        assert_eq!(header.file_size, 1234);
        assert_eq!(header.format_version_name(), Some("XNA Game Studio 4.0"));
        assert!(warnings.is_empty());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_unknown_platform_and_version_warn() {
        let data = header_bytes(b'q', 4, 0x00);
        let mut reader = Reader::new(&data);
        let mut warnings = Vec::new();
        let header = decode_header(&mut reader, &mut warnings).unwrap();
        assert_eq!(header.platform, Platform::Unknown(b'q'));
        assert_eq!(header.profile, Profile::Reach);
        assert_eq!(
            warnings,
            vec![
                Warning::UnknownPlatform { tag: b'q' },
                Warning::UnknownFormatVersion { version: 4 },
            ]
        );
    }

    #[test]
    fn test_invalid_magic() {
        let mut data = header_bytes(b'w', 5, 0);
        data[0] = b'Q';
        let mut reader = Reader::new(&data);
        let err = decode_header(&mut reader, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotXnb);
        assert_eq!(reader.position(), 0);

        let mut short = Reader::new(b"XN");
        assert!(matches!(
            decode_header(&mut short, &mut Vec::new()),
            Err(DecodeError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_compressed_rejected_before_size() {
        let data = header_bytes(b'x', 5, 0x80);
        let mut reader = Reader::new(&data);
        let err = decode_header(&mut reader, &mut Vec::new()).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedCompression { flags: 0x80 });
        assert_eq!(reader.position(), 6);
    }
}
