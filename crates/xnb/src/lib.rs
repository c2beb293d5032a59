//! XNB: decoder for XNA Game Studio 4.0 binary asset containers.
//!
//! This crate decodes uncompressed `.xnb` files into an in-memory asset
//! graph plus media artifacts (texture levels as pixel grids, sound effects
//! as RIFF/WAVE streams).
//!
//! # Quick Start
//!
//! ```no_run
//! use xnb::{decode_xnb, ArtifactKind};
//!
//! let bytes = std::fs::read("Content/player.xnb").unwrap();
//! let file = decode_xnb(&bytes).unwrap();
//!
//! for artifact in &file.artifacts {
//!     if let ArtifactKind::Image(grid) = &artifact.kind {
//!         println!("{}: {}x{}", artifact.name, grid.width, grid.height);
//!     }
//! }
//! println!("{}", serde_json::to_string_pretty(&file.graph).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`model`]: Decoded data types (header, value tree, pixel grids, artifacts)
//! - [`codec`]: Binary decoding of the container and every built-in reader
//! - [`error`]: Fatal errors, error codes and warnings
//! - [`limits`]: Wire constants and decoder limits
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Preallocation is bounded by the bytes actually remaining
//! - Varints and strings are length-limited
//! - Object nesting depth is bounded
//! - Invalid data is rejected with a located, coded error
//!
//! # Wire Format
//!
//! ```text
//! "XNB" | platform | version | flags | size | readers | shared count | objects
//! ```
//!
//! LZX-compressed containers (flags bit 7) are rejected.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;

// Re-export commonly used types at crate root
pub use codec::{decode_xnb, decode_xnb_with_options, DecodeOptions};
pub use error::{DecodeError, ErrorCategory, ErrorCode, Warning};
pub use model::{
    Artifact, ArtifactKind, AssetGraph, DecodedFile, Header, Object, OutputSink, PixelGrid, Platform,
    Profile, SurfaceFormat, Texel, TexelBuffer, Value,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XNB format version this crate decodes.
pub const FORMAT_VERSION: u8 = limits::FORMAT_VERSION;
