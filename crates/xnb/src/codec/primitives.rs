//! Primitive encoding/decoding for the XNB binary format.
//!
//! Implements little-endian fixed-width values, LEB128 varints and
//! length-prefixed strings.

use half::f16;

use crate::error::DecodeError;
use crate::limits::{MAX_STRING_LEN, MAX_VARINT_BYTES};

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling. The position only ever moves
/// forward.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Capacity hint for a collection of `count` items of at least
    /// `min_item_len` bytes each, clamped to what the input can hold.
    pub fn capacity_hint(&self, count: u64, min_item_len: usize) -> usize {
        let fit = self.remaining_len() / min_item_len.max(1);
        usize::try_from(count).map_or(fit, |c| c.min(fit))
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into a fixed-size array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Reads a signed byte.
    #[inline]
    pub fn read_sbyte(&mut self, context: &'static str) -> Result<i8, DecodeError> {
        Ok(self.read_byte(context)? as i8)
    }

    /// Reads a boolean; any nonzero byte is true.
    #[inline]
    pub fn read_bool(&mut self, context: &'static str) -> Result<bool, DecodeError> {
        Ok(self.read_byte(context)? != 0)
    }

    /// Reads a one-byte character.
    #[inline]
    pub fn read_char(&mut self, context: &'static str) -> Result<char, DecodeError> {
        Ok(char::from(self.read_byte(context)?))
    }

    /// Reads a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian i16.
    #[inline]
    pub fn read_i16(&mut self, context: &'static str) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian u64.
    #[inline]
    pub fn read_u64(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian i64.
    #[inline]
    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian f64.
    #[inline]
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian IEEE-754 binary16 value, widened to f32.
    #[inline]
    pub fn read_half(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        Ok(f16::from_bits(self.read_u16(context)?).to_f32())
    }

    /// Reads an unsigned varint (LEB128).
    #[inline]
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for _ in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte(context)?;
            let value = (byte & 0x7F) as u64;

            // Check for overflow
            if shift == 63 && value > 1 {
                return Err(DecodeError::VarintOverflow);
            }

            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }

        Err(DecodeError::VarintTooLong)
    }

    /// Reads a LEB128 length-prefixed UTF-8 string.
    #[inline]
    pub fn read_string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.read_varint(field)?;
        if len > MAX_STRING_LEN as u64 {
            return Err(DecodeError::LengthExceedsLimit {
                field,
                len,
                max: MAX_STRING_LEN as u64,
            });
        }
        let bytes = self.read_bytes(len as usize, field)?;
        // Validate UTF-8 on borrowed slice, then allocate once
        std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
///
/// Used to synthesize side-channel artifacts and to build fixtures.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a boolean as one byte.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    /// Writes a little-endian u16.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian u32.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i32.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i64.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian f32.
    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian f64.
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an unsigned varint (LEB128) in its minimal-length form.
    #[inline]
    pub fn write_varint(&mut self, mut value: u64) {
        // Use stack buffer to batch writes (faster than multiple push calls)
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }

    /// Writes a LEB128 length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) {
        self.write_varint(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }
}
