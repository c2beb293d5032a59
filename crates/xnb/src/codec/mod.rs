//! Binary decoding for XNB containers.
//!
//! This module implements the container layout, the type reader table and
//! the per-type content decoders.

pub mod container;
pub mod graphics;
pub mod header;
pub mod media;
pub mod object;
pub mod pixel;
pub mod primitives;
pub mod registry;
pub mod structural;

pub use container::{decode_xnb, decode_xnb_with_options, DecodeOptions};
pub use graphics::BoneIndexWidth;
pub use header::decode_header;
pub use media::riff_wave;
pub use object::{decode_any, decode_object, DecodeContext};
pub use pixel::unpack_texel;
pub use primitives::{Reader, Writer};
pub use registry::{decode_reader_table, TypeReaderTable};
