//! Whole-container decoding.
//!
//! ```text
//! header | reader table | shared count (LEB128) | primary object | shared objects
//! ```
//!
//! Decoding is a single forward pass. Artifacts are collected in memory
//! and only returned once the whole container has decoded, so a failure
//! never leaves partial output behind.

use tracing::{debug, info};

use crate::codec::header::decode_header;
use crate::codec::object::{decode_object, DecodeContext};
use crate::codec::primitives::Reader;
use crate::codec::registry::decode_reader_table;
use crate::error::DecodeError;
use crate::limits::MAX_DEPTH;
use crate::model::{AssetGraph, DecodedFile};

/// Options for decoding containers.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Narrow 16-bit channels (Rgba64, HdrBlendable) by halving instead of
    /// taking the high byte.
    ///
    /// Reproduces the output of older extraction tools, where most
    /// channel values saturate.
    pub legacy_channel_narrowing: bool,
    /// Decode a mip level at the halved extent when its stored byte size
    /// matches that extent and not the full one.
    ///
    /// Off by default: every level is read at the full extent and the
    /// per-level byte size is only recorded.
    pub mip_chain_extents: bool,
    /// Maximum object nesting depth before decoding fails.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            legacy_channel_narrowing: false,
            mip_chain_extents: false,
            max_depth: MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Creates default decoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options with legacy channel narrowing enabled.
    pub fn legacy() -> Self {
        Self {
            legacy_channel_narrowing: true,
            ..Self::default()
        }
    }
}

/// Decodes an uncompressed XNB container with default options.
pub fn decode_xnb(input: &[u8]) -> Result<DecodedFile, DecodeError> {
    decode_xnb_with_options(input, &DecodeOptions::default())
}

/// Decodes an uncompressed XNB container.
///
/// The primary object's artifacts are named `primary…`, those of shared
/// resource `i` are named `resource_{i}…`.
pub fn decode_xnb_with_options(input: &[u8], options: &DecodeOptions) -> Result<DecodedFile, DecodeError> {
    let mut reader = Reader::new(input);
    let mut warnings = Vec::new();

    let header = decode_header(&mut reader, &mut warnings)?;
    if header.file_size as usize != input.len() {
        debug!(declared = header.file_size, actual = input.len(), "file size mismatch");
    }

    let table = decode_reader_table(&mut reader)?;
    let shared_count = reader.read_varint("shared_resource_count")?;
    debug!(readers = table.len(), shared_count, "container");

    let mut ctx = DecodeContext::new(&table, options);

    ctx.set_artifact_base("primary");
    let (_, primary) = ctx.field("primary", |ctx| decode_object(&mut reader, ctx))?;

    let mut shared = Vec::with_capacity(reader.capacity_hint(shared_count, 1));
    for i in 0..shared_count {
        ctx.set_artifact_base(format!("resource_{i}"));
        let (_, value) = ctx.field(format!("shared[{i}]"), |ctx| decode_object(&mut reader, ctx))?;
        shared.push(value);
    }

    if !reader.is_empty() {
        debug!(trailing = reader.remaining_len(), "trailing bytes after last object");
    }

    let (object_warnings, artifacts) = ctx.finish();
    warnings.extend(object_warnings);
    info!(artifacts = artifacts.len(), warnings = warnings.len(), "decoded container");

    Ok(DecodedFile {
        header,
        readers: table.descriptors().cloned().collect(),
        graph: AssetGraph { primary, shared },
        artifacts,
        warnings,
    })
}
