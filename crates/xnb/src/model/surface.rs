//! Surface formats and decoded pixel grids.

/// Texel bit-packing scheme of raw texture data.
///
/// Discriminants are the wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SurfaceFormat {
    Color = 0,
    Bgr565 = 1,
    Bgra5551 = 2,
    Bgra4444 = 3,
    Dxt1 = 4,
    Dxt3 = 5,
    Dxt5 = 6,
    NormalizedByte2 = 7,
    NormalizedByte4 = 8,
    Rgba1010102 = 9,
    Rg32 = 10,
    Rgba64 = 11,
    Alpha8 = 12,
    Single = 13,
    Vector2 = 14,
    Vector4 = 15,
    HalfSingle = 16,
    HalfVector2 = 17,
    HalfVector4 = 18,
    HdrBlendable = 19,
}

/// Channel representation produced when unpacking a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelKind {
    /// Four 8-bit channels.
    Rgba8,
    /// Four integer channels wider than 8 bits.
    Wide,
    /// Four float channels.
    Float,
}

impl SurfaceFormat {
    /// All formats in wire order.
    pub const ALL: [SurfaceFormat; 20] = [
        SurfaceFormat::Color,
        SurfaceFormat::Bgr565,
        SurfaceFormat::Bgra5551,
        SurfaceFormat::Bgra4444,
        SurfaceFormat::Dxt1,
        SurfaceFormat::Dxt3,
        SurfaceFormat::Dxt5,
        SurfaceFormat::NormalizedByte2,
        SurfaceFormat::NormalizedByte4,
        SurfaceFormat::Rgba1010102,
        SurfaceFormat::Rg32,
        SurfaceFormat::Rgba64,
        SurfaceFormat::Alpha8,
        SurfaceFormat::Single,
        SurfaceFormat::Vector2,
        SurfaceFormat::Vector4,
        SurfaceFormat::HalfSingle,
        SurfaceFormat::HalfVector2,
        SurfaceFormat::HalfVector4,
        SurfaceFormat::HdrBlendable,
    ];

    /// Creates a SurfaceFormat from its wire representation.
    pub fn from_i32(v: i32) -> Option<SurfaceFormat> {
        usize::try_from(v).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Format name as written in the index document.
    pub fn name(self) -> &'static str {
        match self {
            SurfaceFormat::Color => "Color",
            SurfaceFormat::Bgr565 => "Bgr565",
            SurfaceFormat::Bgra5551 => "Bgra5551",
            SurfaceFormat::Bgra4444 => "Bgra4444",
            SurfaceFormat::Dxt1 => "Dxt1",
            SurfaceFormat::Dxt3 => "Dxt3",
            SurfaceFormat::Dxt5 => "Dxt5",
            SurfaceFormat::NormalizedByte2 => "NormalizedByte2",
            SurfaceFormat::NormalizedByte4 => "NormalizedByte4",
            SurfaceFormat::Rgba1010102 => "Rgba1010102",
            SurfaceFormat::Rg32 => "Rg32",
            SurfaceFormat::Rgba64 => "Rgba64",
            SurfaceFormat::Alpha8 => "Alpha8",
            SurfaceFormat::Single => "Single",
            SurfaceFormat::Vector2 => "Vector2",
            SurfaceFormat::Vector4 => "Vector4",
            SurfaceFormat::HalfSingle => "HalfSingle",
            SurfaceFormat::HalfVector2 => "HalfVector2",
            SurfaceFormat::HalfVector4 => "HalfVector4",
            SurfaceFormat::HdrBlendable => "HdrBlendable",
        }
    }

    /// Bytes consumed per texel, or `None` for block-compressed formats.
    pub fn texel_size(self) -> Option<usize> {
        match self {
            SurfaceFormat::Alpha8 => Some(1),
            SurfaceFormat::Bgr565
            | SurfaceFormat::Bgra5551
            | SurfaceFormat::Bgra4444
            | SurfaceFormat::NormalizedByte2
            | SurfaceFormat::HalfSingle => Some(2),
            SurfaceFormat::Color
            | SurfaceFormat::NormalizedByte4
            | SurfaceFormat::Rgba1010102
            | SurfaceFormat::Single
            | SurfaceFormat::HalfVector2
            | SurfaceFormat::HdrBlendable => Some(4),
            SurfaceFormat::Rg32 => Some(5),
            SurfaceFormat::Rgba64 | SurfaceFormat::Vector2 | SurfaceFormat::HalfVector4 => Some(8),
            SurfaceFormat::Vector4 => Some(16),
            SurfaceFormat::Dxt1 | SurfaceFormat::Dxt3 | SurfaceFormat::Dxt5 => None,
        }
    }

    /// Channel representation of unpacked texels.
    pub fn texel_kind(self) -> TexelKind {
        match self {
            SurfaceFormat::Rg32 => TexelKind::Wide,
            SurfaceFormat::Single
            | SurfaceFormat::Vector2
            | SurfaceFormat::Vector4
            | SurfaceFormat::HalfSingle
            | SurfaceFormat::HalfVector2
            | SurfaceFormat::HalfVector4 => TexelKind::Float,
            _ => TexelKind::Rgba8,
        }
    }
}

/// One unpacked texel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Texel {
    Rgba8([u8; 4]),
    Wide([u32; 4]),
    Float([f32; 4]),
}

/// Texels of one grid, all of the same representation.
#[derive(Debug, Clone, PartialEq)]
pub enum TexelBuffer {
    Rgba8(Vec<[u8; 4]>),
    Wide(Vec<[u32; 4]>),
    Float(Vec<[f32; 4]>),
}

impl TexelBuffer {
    /// Creates an empty buffer for `kind` with room for `capacity` texels.
    pub fn with_capacity(kind: TexelKind, capacity: usize) -> Self {
        match kind {
            TexelKind::Rgba8 => TexelBuffer::Rgba8(Vec::with_capacity(capacity)),
            TexelKind::Wide => TexelBuffer::Wide(Vec::with_capacity(capacity)),
            TexelKind::Float => TexelBuffer::Float(Vec::with_capacity(capacity)),
        }
    }

    /// Appends a texel. Texels of a different representation are converted.
    pub fn push(&mut self, texel: Texel) {
        match (self, texel) {
            (TexelBuffer::Rgba8(v), t) => v.push(t.to_rgba8()),
            (TexelBuffer::Wide(v), Texel::Wide(c)) => v.push(c),
            (TexelBuffer::Wide(v), t) => v.push(t.to_rgba8().map(u32::from)),
            (TexelBuffer::Float(v), Texel::Float(c)) => v.push(c),
            (TexelBuffer::Float(v), Texel::Wide(c)) => v.push(c.map(|x| x as f32)),
            (TexelBuffer::Float(v), Texel::Rgba8(c)) => v.push(c.map(f32::from)),
        }
    }

    /// Number of texels.
    pub fn len(&self) -> usize {
        match self {
            TexelBuffer::Rgba8(v) => v.len(),
            TexelBuffer::Wide(v) => v.len(),
            TexelBuffer::Float(v) => v.len(),
        }
    }

    /// Returns true if the buffer holds no texels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Texel {
    /// Narrows to canonical RGBA8.
    ///
    /// Wide channels saturate at 255; float channels are clamped to
    /// `[0, 1]` and scaled.
    pub fn to_rgba8(self) -> [u8; 4] {
        match self {
            Texel::Rgba8(c) => c,
            Texel::Wide(c) => c.map(|x| x.min(255) as u8),
            Texel::Float(c) => c.map(|x| {
                if x.is_nan() {
                    0
                } else {
                    (x.clamp(0.0, 1.0) * 255.0).round() as u8
                }
            }),
        }
    }
}

/// A decoded width x height texel grid, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    pub width: u32,
    pub height: u32,
    pub texels: TexelBuffer,
}

impl PixelGrid {
    /// Returns the grid as packed RGBA8 bytes (`width * height * 4`).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.texels.len() * 4);
        match &self.texels {
            TexelBuffer::Rgba8(v) => v.iter().for_each(|c| out.extend_from_slice(c)),
            TexelBuffer::Wide(v) => v
                .iter()
                .for_each(|c| out.extend_from_slice(&Texel::Wide(*c).to_rgba8())),
            TexelBuffer::Float(v) => v
                .iter()
                .for_each(|c| out.extend_from_slice(&Texel::Float(*c).to_rgba8())),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_wire_values() {
        for (i, format) in SurfaceFormat::ALL.iter().enumerate() {
            assert_eq!(*format as usize, i);
            assert_eq!(SurfaceFormat::from_i32(i as i32), Some(*format));
        }
        assert_eq!(SurfaceFormat::from_i32(20), None);
        assert_eq!(SurfaceFormat::from_i32(-1), None);
        assert_eq!(SurfaceFormat::HdrBlendable.name(), "HdrBlendable");
    }

    #[test]
    fn test_to_rgba8_narrowing() {
        assert_eq!(Texel::Wide([300, 7, 0, 255]).to_rgba8(), [255, 7, 0, 255]);
        assert_eq!(Texel::Float([1.5, 0.5, -1.0, f32::NAN]).to_rgba8(), [255, 128, 0, 0]);
    }

    #[test]
    fn test_grid_rgba8_bytes() {
        let grid = PixelGrid {
            width: 2,
            height: 1,
            texels: TexelBuffer::Rgba8(vec![[1, 2, 3, 4], [5, 6, 7, 8]]),
        };
        assert_eq!(grid.to_rgba8(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
