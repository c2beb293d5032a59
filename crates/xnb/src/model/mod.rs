//! Data model types for decoded XNB content.
//!
//! This module contains:
//! - The container header
//! - Reader table entries and name binding
//! - The decoded value tree
//! - Surface formats and pixel grids
//! - The decoded file, artifacts and the output sink seam

pub mod graph;
pub mod header;
pub mod reader;
pub mod surface;
pub mod value;

pub(crate) use graph::ArtifactCollector;
pub use graph::{Artifact, ArtifactKind, AssetGraph, DecodedFile, OutputSink};
pub use header::{Header, Platform, Profile};
pub use reader::{Binding, ContentTypeDescriptor, ElementReader, ReaderKind, TypeName};
pub use surface::{PixelGrid, SurfaceFormat, Texel, TexelBuffer, TexelKind};
pub use value::{Matrix, Object, Value};
