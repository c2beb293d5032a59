//! Texel unpacking for every surface format.
//!
//! Each call consumes exactly [`SurfaceFormat::texel_size`] bytes and
//! returns the texel in the representation given by
//! [`SurfaceFormat::texel_kind`].

use crate::codec::primitives::Reader;
use crate::error::DecodeError;
use crate::model::{SurfaceFormat, Texel};

/// Narrows a 16-bit channel to 8 bits.
///
/// `legacy` halves the value instead, which keeps 15 significant bits and
/// saturates when converted to RGBA8.
#[inline]
fn narrow16(v: u16, legacy: bool) -> u8 {
    if legacy {
        (v / 2).min(255) as u8
    } else {
        (v >> 8) as u8
    }
}

/// Unpacks one texel of `format`.
///
/// Block-compressed formats fail with
/// [`DecodeError::UnsupportedSurfaceFormat`].
pub fn unpack_texel(
    reader: &mut Reader<'_>,
    format: SurfaceFormat,
    legacy_narrowing: bool,
) -> Result<Texel, DecodeError> {
    const CTX: &str = "texel";

    let texel = match format {
        SurfaceFormat::Color | SurfaceFormat::NormalizedByte4 => Texel::Rgba8(reader.read_array::<4>(CTX)?),
        SurfaceFormat::Bgr565 => {
            let c = reader.read_u16(CTX)?;
            Texel::Rgba8([
                ((c & 0xF800) >> 8) as u8,
                ((c & 0x07E0) >> 3) as u8,
                ((c & 0x001F) << 3) as u8,
                0xFF,
            ])
        }
        SurfaceFormat::Bgra5551 => {
            let c = reader.read_u16(CTX)?;
            Texel::Rgba8([
                ((c & 0x7C00) >> 7) as u8,
                ((c & 0x03E0) >> 2) as u8,
                ((c & 0x001F) << 3) as u8,
                if c & 0x8000 != 0 { 0xFF } else { 0x00 },
            ])
        }
        SurfaceFormat::Bgra4444 => {
            let c = reader.read_u16(CTX)?;
            Texel::Rgba8([
                ((c & 0x0F00) >> 4) as u8,
                (c & 0x00F0) as u8,
                ((c & 0x000F) << 4) as u8,
                ((c & 0xF000) >> 8) as u8,
            ])
        }
        SurfaceFormat::Dxt1 | SurfaceFormat::Dxt3 | SurfaceFormat::Dxt5 => {
            return Err(DecodeError::UnsupportedSurfaceFormat { format: format.name() });
        }
        SurfaceFormat::NormalizedByte2 => {
            let [c, a] = reader.read_array::<2>(CTX)?;
            Texel::Rgba8([c, c, c, a])
        }
        SurfaceFormat::Rgba1010102 => {
            let c = reader.read_u32(CTX)?;
            let alpha = match c >> 30 {
                0b11 => 0xFF,
                0b10 => 0x80,
                _ => 0x00,
            };
            Texel::Rgba8([
                (((c >> 20) & 0x3FF) >> 2) as u8,
                (((c >> 10) & 0x3FF) >> 2) as u8,
                ((c & 0x3FF) >> 2) as u8,
                alpha,
            ])
        }
        SurfaceFormat::Rg32 => {
            let r = reader.read_byte(CTX)?;
            let g = reader.read_u32(CTX)?;
            Texel::Wide([r.into(), g, 0, 0xFF])
        }
        SurfaceFormat::Rgba64 => {
            let mut c = [0u8; 4];
            for ch in &mut c {
                *ch = narrow16(reader.read_u16(CTX)?, legacy_narrowing);
            }
            Texel::Rgba8(c)
        }
        SurfaceFormat::HdrBlendable => {
            let c = narrow16(reader.read_u16(CTX)?, legacy_narrowing);
            let a = narrow16(reader.read_u16(CTX)?, legacy_narrowing);
            Texel::Rgba8([c, c, c, a])
        }
        SurfaceFormat::Alpha8 => Texel::Rgba8([0, 0, 0, reader.read_byte(CTX)?]),
        SurfaceFormat::Single => {
            let c = reader.read_f32(CTX)?;
            Texel::Float([c, c, c, c])
        }
        SurfaceFormat::Vector2 => {
            let x = reader.read_f32(CTX)?;
            let y = reader.read_f32(CTX)?;
            Texel::Float([x, y, 0.0, 1.0])
        }
        SurfaceFormat::Vector4 => {
            let mut c = [0f32; 4];
            for ch in &mut c {
                *ch = reader.read_f32(CTX)?;
            }
            Texel::Float(c)
        }
        SurfaceFormat::HalfSingle => {
            let c = reader.read_half(CTX)?;
            Texel::Float([c, c, c, c])
        }
        SurfaceFormat::HalfVector2 => {
            let x = reader.read_half(CTX)?;
            let y = reader.read_half(CTX)?;
            Texel::Float([x, y, 0.0, 1.0])
        }
        SurfaceFormat::HalfVector4 => {
            let mut c = [0f32; 4];
            for ch in &mut c {
                *ch = reader.read_half(CTX)?;
            }
            Texel::Float(c)
        }
    };
    Ok(texel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unpack(format: SurfaceFormat, bytes: &[u8]) -> Texel {
        let mut reader = Reader::new(bytes);
        let texel = unpack_texel(&mut reader, format, false).unwrap();
        assert!(reader.is_empty());
        texel
    }

    #[test]
    fn test_bgra5551_alpha_bit() {
        assert_eq!(
            unpack(SurfaceFormat::Bgra5551, &0x8000u16.to_le_bytes()),
            Texel::Rgba8([0, 0, 0, 255])
        );
        assert_eq!(
            unpack(SurfaceFormat::Bgra5551, &0x7FFFu16.to_le_bytes()),
            Texel::Rgba8([0xF8, 0xF8, 0xF8, 0])
        );
    }

    #[test]
    fn test_bgra4444_alpha_nibble() {
        assert_eq!(
            unpack(SurfaceFormat::Bgra4444, &0xF000u16.to_le_bytes()),
            Texel::Rgba8([0, 0, 0, 240])
        );
    }

    #[test]
    fn test_bgr565_is_opaque() {
        assert_eq!(
            unpack(SurfaceFormat::Bgr565, &0xFFFFu16.to_le_bytes()),
            Texel::Rgba8([0xF8, 0xFC, 0xF8, 255])
        );
    }

    #[test]
    fn test_rgba1010102() {
        let c: u32 = (0b10 << 30) | (0x3FF << 20) | (0x200 << 10) | 0x004;
        assert_eq!(
            unpack(SurfaceFormat::Rgba1010102, &c.to_le_bytes()),
            Texel::Rgba8([255, 128, 1, 128])
        );
    }

    #[test]
    fn test_rg32_wide() {
        let mut bytes = vec![7];
        bytes.extend_from_slice(&70_000u32.to_le_bytes());
        let texel = unpack(SurfaceFormat::Rg32, &bytes);
        assert_eq!(texel, Texel::Wide([7, 70_000, 0, 255]));
        assert_eq!(texel.to_rgba8(), [7, 255, 0, 255]);
    }

    #[test]
    fn test_rgba64_narrowing() {
        let bytes: Vec<u8> = [0xFFFFu16, 0x8000, 0x00FF, 0x0100]
            .iter()
            .flat_map(|c| c.to_le_bytes())
            .collect();
        assert_eq!(unpack(SurfaceFormat::Rgba64, &bytes), Texel::Rgba8([255, 128, 0, 1]));

        let mut reader = Reader::new(&bytes);
        let legacy = unpack_texel(&mut reader, SurfaceFormat::Rgba64, true).unwrap();
        assert_eq!(legacy, Texel::Rgba8([255, 255, 127, 128]));
    }

    #[test]
    fn test_half_vector2() {
        let bytes = [0x00, 0x3C, 0x00, 0x38]; // 1.0, 0.5
        assert_eq!(
            unpack(SurfaceFormat::HalfVector2, &bytes),
            Texel::Float([1.0, 0.5, 0.0, 1.0])
        );
    }

    #[test]
    fn test_block_compressed_is_fatal() {
        for format in [SurfaceFormat::Dxt1, SurfaceFormat::Dxt3, SurfaceFormat::Dxt5] {
            let err = unpack_texel(&mut Reader::new(&[0; 16]), format, false).unwrap_err();
            assert_eq!(err, DecodeError::UnsupportedSurfaceFormat { format: format.name() });
        }
    }

    proptest! {
        #[test]
        fn prop_consumes_texel_size(index in 0usize..20, bytes in prop::collection::vec(any::<u8>(), 16)) {
            let format = SurfaceFormat::ALL[index];
            let mut reader = Reader::new(&bytes);
            match (format.texel_size(), unpack_texel(&mut reader, format, false)) {
                (Some(size), Ok(texel)) => {
                    prop_assert_eq!(reader.position(), size);
                    let kind_matches = matches!(
                        (format.texel_kind(), texel),
                        (crate::model::TexelKind::Rgba8, Texel::Rgba8(_))
                            | (crate::model::TexelKind::Wide, Texel::Wide(_))
                            | (crate::model::TexelKind::Float, Texel::Float(_))
                    );
                    prop_assert!(kind_matches);
                }
                (None, Err(_)) => {}
                (size, result) => prop_assert!(false, "{:?}: size {:?}, result {:?}", format, size, result),
            }
        }
    }
}
