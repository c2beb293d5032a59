//! Decoded file, asset graph and side-channel artifacts.

use rustc_hash::FxHashMap;

use crate::error::Warning;
use crate::model::{ContentTypeDescriptor, Header, PixelGrid, Value};

/// The object graph of one container.
///
/// Shared resources stay an ordered flat list; references into it are not
/// resolved.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AssetGraph {
    pub primary: Value,
    pub shared: Vec<Value>,
}

/// Payload of an artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactKind {
    /// One texture level / slice / face.
    Image(PixelGrid),
    /// A complete RIFF/WAVE byte stream.
    Wave(Vec<u8>),
}

/// A media artifact produced while decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// File stem, unique within one decoded file (e.g. `primary_mip0`).
    pub name: String,
    pub kind: ArtifactKind,
}

/// Everything decoded from one container.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFile {
    pub header: Header,
    pub readers: Vec<ContentTypeDescriptor>,
    pub graph: AssetGraph,
    /// Artifacts in the order they were decoded.
    pub artifacts: Vec<Artifact>,
    pub warnings: Vec<Warning>,
}

/// Receives decoded output. Implemented by front ends (filesystem, memory).
pub trait OutputSink {
    type Error;

    /// Stores one decoded pixel grid.
    fn write_image(&mut self, name: &str, grid: &PixelGrid) -> Result<(), Self::Error>;

    /// Stores one RIFF/WAVE stream.
    fn write_wave(&mut self, name: &str, wave: &[u8]) -> Result<(), Self::Error>;

    /// Stores the aggregate document.
    fn write_document(&mut self, graph: &AssetGraph) -> Result<(), Self::Error>;
}

impl DecodedFile {
    /// Hands every artifact, then the document, to `sink`, each exactly once.
    pub fn emit<S: OutputSink>(&self, sink: &mut S) -> Result<(), S::Error> {
        for artifact in &self.artifacts {
            match &artifact.kind {
                ArtifactKind::Image(grid) => sink.write_image(&artifact.name, grid)?,
                ArtifactKind::Wave(bytes) => sink.write_wave(&artifact.name, bytes)?,
            }
        }
        sink.write_document(&self.graph)
    }
}

/// Collects artifacts during decoding and keeps their names unique.
#[derive(Debug, Default)]
pub(crate) struct ArtifactCollector {
    base: String,
    seen: FxHashMap<String, usize>,
    items: Vec<Artifact>,
}

impl ArtifactCollector {
    /// Sets the name prefix for the next top-level object.
    pub(crate) fn set_base(&mut self, base: impl Into<String>) {
        self.base = base.into();
    }

    /// Records an artifact named `{base}{suffix}`, adding `_{n}` when the
    /// name was already taken.
    pub(crate) fn push(&mut self, suffix: &str, kind: ArtifactKind) -> &str {
        let stem = format!("{}{}", self.base, suffix);
        let count = self.seen.entry(stem.clone()).or_insert(0);
        *count += 1;
        let name = if *count == 1 { stem } else { format!("{stem}_{}", *count - 1) };
        self.items.push(Artifact { name, kind });
        &self.items[self.items.len() - 1].name
    }

    pub(crate) fn into_artifacts(self) -> Vec<Artifact> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names_are_unique() {
        let mut c = ArtifactCollector::default();
        c.set_base("primary");
        assert_eq!(c.push("_mip0", ArtifactKind::Wave(vec![])), "primary_mip0");
        assert_eq!(c.push("_mip0", ArtifactKind::Wave(vec![])), "primary_mip0_1");
        c.set_base("resource_0");
        assert_eq!(c.push("", ArtifactKind::Wave(vec![])), "resource_0");
        assert_eq!(c.into_artifacts().len(), 3);
    }
}
