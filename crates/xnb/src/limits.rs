//! Wire constants and decoder limits.
//!
//! The limits bound allocations and recursion when decoding untrusted
//! input; they are far above anything a real content pipeline writes.

/// Container magic.
pub const MAGIC: &[u8; 3] = b"XNB";

/// Format version written by XNA Game Studio 4.0.
pub const FORMAT_VERSION: u8 = 5;

/// Flags bit selecting the HiDef graphics profile (clear = Reach).
pub const FLAG_HIDEF: u8 = 0x01;

/// Flags bit marking an LZX-compressed stream.
pub const FLAG_COMPRESSED: u8 = 0x80;

/// Maximum bytes in a 64-bit LEB128 varint.
pub const MAX_VARINT_BYTES: usize = 10;

/// Maximum byte length of a single string.
pub const MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Default maximum object nesting depth.
pub const MAX_DEPTH: usize = 256;

/// Bone counts below this use one-byte bone references.
pub const BYTE_BONE_REFERENCE_LIMIT: u32 = 255;

/// Bytes of WAVEFORMATEX stored by the sound effect writer.
pub const WAVE_FORMAT_EX_LEN: usize = 18;

/// Bytes of WAVEFORMATEX kept in the synthesized `fmt ` chunk.
pub const WAVE_FMT_CHUNK_LEN: usize = 16;

/// Size of the synthesized RIFF header preceding the PCM payload.
pub const WAVE_HEADER_LEN: usize = 44;
