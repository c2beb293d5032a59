//! Type reader table.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::codec::primitives::Reader;
use crate::error::DecodeError;
use crate::model::{Binding, ContentTypeDescriptor};

/// Reader table of one container, each entry bound to its decoder.
#[derive(Debug, Clone, Default)]
pub struct TypeReaderTable {
    entries: Vec<(ContentTypeDescriptor, Binding)>,
    /// Enum types named by the table's `EnumReader` entries.
    enums: FxHashSet<String>,
}

impl TypeReaderTable {
    /// Builds a table from descriptors, binding each name once.
    ///
    /// Generic arguments naming an enum declared elsewhere in the table
    /// bind to inline enum elements.
    pub fn new(descriptors: Vec<ContentTypeDescriptor>) -> Self {
        let enums: FxHashSet<String> = descriptors
            .iter()
            .filter_map(|d| Binding::enum_target(&d.name))
            .collect();
        let entries = descriptors
            .into_iter()
            .map(|d| {
                let binding = Binding::resolve_with(&d.name, &enums);
                (d, binding)
            })
            .collect();
        Self { entries, enums }
    }

    /// Binds a reader name that appears inline in the stream.
    pub fn resolve(&self, name: &str) -> Binding {
        Binding::resolve_with(name, &self.enums)
    }

    /// Number of declared readers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no readers are declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a nonzero 1-based type reference.
    pub fn get(&self, reference: u64) -> Result<&Binding, DecodeError> {
        reference
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.entries.get(i))
            .map(|(_, binding)| binding)
            .ok_or(DecodeError::ReaderOutOfRange {
                reference,
                size: self.entries.len(),
            })
    }

    /// Descriptors in table order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ContentTypeDescriptor> {
        self.entries.iter().map(|(d, _)| d)
    }
}

/// Decodes the reader table: LEB128 count, then `(name, i32 version)` pairs.
///
/// Names without a decoder are accepted here; they only matter when an
/// object references them.
pub fn decode_reader_table(reader: &mut Reader<'_>) -> Result<TypeReaderTable, DecodeError> {
    let count = reader.read_varint("reader_count")?;
    debug!(count, "type reader table");

    // Each entry is at least a one-byte length plus the version.
    let mut descriptors = Vec::with_capacity(reader.capacity_hint(count, 5));
    for _ in 0..count {
        let name = reader.read_string("reader_name")?;
        let version = reader.read_i32("reader_version")?;
        descriptors.push(ContentTypeDescriptor { name, version });
    }

    let table = TypeReaderTable::new(descriptors);
    for (index, (descriptor, binding)) in table.entries.iter().enumerate() {
        debug!(index, name = %descriptor.name, version = descriptor.version, reader = binding.kind.label(), "type reader");
    }

    Ok(table)
}
