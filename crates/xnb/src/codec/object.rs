//! Recursive object decoding.
//!
//! Every object starts with a LEB128 type reference: 0 is null, N selects
//! entry N-1 of the reader table. The `ObjectReader` entry instead carries
//! the concrete reader name inline, right before the payload.

use tracing::{debug, warn};

use crate::codec::container::DecodeOptions;
use crate::codec::primitives::Reader;
use crate::codec::registry::TypeReaderTable;
use crate::codec::{graphics, media, structural};
use crate::error::{DecodeError, Warning};
use crate::model::{Artifact, ArtifactCollector, ArtifactKind, Binding, ElementReader, ReaderKind, Value};

// =============================================================================
// CONTEXT
// =============================================================================

/// State threaded through one decode pass.
///
/// Carries the reader table, options, the current field path and nesting
/// depth, and collects warnings and artifacts.
#[derive(Debug)]
pub struct DecodeContext<'t> {
    table: &'t TypeReaderTable,
    options: &'t DecodeOptions,
    path: Vec<String>,
    depth: usize,
    warnings: Vec<Warning>,
    artifacts: ArtifactCollector,
}

impl<'t> DecodeContext<'t> {
    /// Creates a context at depth 0 with an empty path.
    pub fn new(table: &'t TypeReaderTable, options: &'t DecodeOptions) -> Self {
        Self {
            table,
            options,
            path: Vec::new(),
            depth: 0,
            warnings: Vec::new(),
            artifacts: ArtifactCollector::default(),
        }
    }

    /// Current object nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Decode options in effect.
    pub fn options(&self) -> &DecodeOptions {
        self.options
    }

    /// Current field path, e.g. `primary/Model/meshes[0]/parts[1]`.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            if !out.is_empty() && !segment.starts_with('[') {
                out.push('/');
            }
            out.push_str(segment);
        }
        out
    }

    /// Runs `f` with `segment` appended to the path. Errors leaving `f`
    /// are annotated with the innermost path.
    pub fn field<T>(
        &mut self,
        segment: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.path.push(segment.into());
        let result = f(self).map_err(|e| e.located(self.path(), self.depth));
        self.path.pop();
        result
    }

    /// Like [`field`](Self::field), one object level deeper.
    fn nest<T>(
        &mut self,
        segment: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        if self.depth >= self.options.max_depth {
            return Err(DecodeError::DepthExceeded {
                max: self.options.max_depth,
            }
            .located(self.path(), self.depth));
        }
        self.depth += 1;
        let result = self.field(segment, f);
        self.depth -= 1;
        result
    }

    /// Records a warning and logs it.
    pub(crate) fn warn(&mut self, warning: Warning) {
        warn!(depth = self.depth, "{warning}");
        self.warnings.push(warning);
    }

    /// Names the artifacts of the next top-level object.
    pub(crate) fn set_artifact_base(&mut self, base: impl Into<String>) {
        self.artifacts.set_base(base);
    }

    /// Records a side-channel artifact named `{base}{suffix}`.
    pub(crate) fn emit(&mut self, suffix: &str, kind: ArtifactKind) {
        let depth = self.depth;
        let name = self.artifacts.push(suffix, kind);
        debug!(depth, name, "artifact");
    }

    /// Consumes the context, returning warnings and artifacts.
    pub(crate) fn finish(self) -> (Vec<Warning>, Vec<Artifact>) {
        (self.warnings, self.artifacts.into_artifacts())
    }
}

// =============================================================================
// OBJECTS
// =============================================================================

/// Decodes one type-referenced object.
///
/// Returns the zero-based table index of the reader used (`None` for a null
/// reference) and the value. A reference past the table is fatal; an entry
/// with no decoder yields [`Value::Null`] and a warning.
pub fn decode_object(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<'_>,
) -> Result<(Option<usize>, Value), DecodeError> {
    let located = |e: DecodeError, ctx: &DecodeContext<'_>| e.located(ctx.path(), ctx.depth);

    let reference = reader
        .read_varint("type_reference")
        .map_err(|e| located(e, &*ctx))?;
    if reference == 0 {
        return Ok((None, Value::Null));
    }

    let table = ctx.table;
    let binding = table.get(reference).map_err(|e| located(e, &*ctx))?;
    let value = decode_binding(binding, reader, ctx)?;
    Ok((Some(reference as usize - 1), value))
}

/// Decodes an object whose reader name is stored inline ("any object").
///
/// The name is bound on the spot and used only for this value. An empty
/// name stands for a null object.
pub fn decode_any(reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    let name = ctx.field("type_name", |_| reader.read_string("type_name"))?;
    if name.is_empty() {
        return Ok(Value::Null);
    }
    let binding = ctx.table.resolve(&name);
    decode_binding(&binding, reader, ctx)
}

/// Decodes the payload for an already-resolved binding.
pub fn decode_binding(
    binding: &Binding,
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<'_>,
) -> Result<Value, DecodeError> {
    if binding.kind == ReaderKind::Unknown {
        ctx.warn(Warning::UnknownReader {
            name: binding.name.clone(),
            path: ctx.path(),
        });
        return Ok(Value::Null);
    }
    debug!(depth = ctx.depth, reader = binding.kind.label(), "object");
    ctx.nest(binding.kind.label(), |ctx| dispatch(binding, reader, ctx))
}

fn decode_element(
    element: &ElementReader,
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<'_>,
) -> Result<Value, DecodeError> {
    match element {
        ElementReader::Direct(binding) => dispatch(binding, reader, ctx),
        ElementReader::Object => decode_object(reader, ctx).map(|(_, v)| v),
    }
}

fn dispatch(binding: &Binding, reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    match binding.kind {
        // Primitive
        ReaderKind::Byte => structural::decode_byte(reader),
        ReaderKind::SByte => structural::decode_sbyte(reader),
        ReaderKind::Int16 => structural::decode_int16(reader),
        ReaderKind::UInt16 => structural::decode_uint16(reader),
        ReaderKind::Int32 => structural::decode_int32(reader),
        ReaderKind::UInt32 => structural::decode_uint32(reader),
        ReaderKind::Int64 => structural::decode_int64(reader),
        ReaderKind::UInt64 => structural::decode_uint64(reader),
        ReaderKind::Single => structural::decode_single(reader),
        ReaderKind::Double => structural::decode_double(reader),
        ReaderKind::Boolean => structural::decode_boolean(reader),
        ReaderKind::Char => structural::decode_char(reader),
        ReaderKind::String => structural::decode_string(reader),
        ReaderKind::Object => decode_any(reader, ctx),

        // System
        ReaderKind::Enum => structural::decode_enum(reader),
        ReaderKind::Nullable => {
            decode_nullable(reader, ctx, |r, c| decode_element(binding.element(0), r, c))
        }
        ReaderKind::Array | ReaderKind::List => {
            decode_list(reader, ctx, |r, c| decode_element(binding.element(0), r, c))
        }
        ReaderKind::Dictionary => decode_dictionary(
            reader,
            ctx,
            |r, c| decode_element(binding.element(0), r, c),
            |r, c| decode_element(binding.element(1), r, c),
        ),
        ReaderKind::TimeSpan => structural::decode_timespan(reader),
        ReaderKind::DateTime => structural::decode_datetime(reader),
        ReaderKind::Decimal => structural::decode_decimal(reader),
        ReaderKind::ExternalReference => structural::decode_external_reference(reader),
        ReaderKind::Reflective => Err(DecodeError::ReflectiveReader {
            name: binding.name.clone(),
        }),

        // Math
        ReaderKind::Vector2 => structural::decode_vector2(reader),
        ReaderKind::Vector3 => structural::decode_vector3(reader),
        ReaderKind::Vector4 => structural::decode_vector4(reader),
        ReaderKind::Matrix => structural::decode_matrix(reader),
        ReaderKind::Quaternion => structural::decode_quaternion(reader),
        ReaderKind::Color => structural::decode_color(reader),
        ReaderKind::Plane => structural::decode_plane(reader),
        ReaderKind::Point => structural::decode_point(reader),
        ReaderKind::Rectangle => structural::decode_rectangle(reader),
        ReaderKind::BoundingBox => structural::decode_bounding_box(reader),
        ReaderKind::BoundingSphere => structural::decode_bounding_sphere(reader),
        ReaderKind::BoundingFrustum => structural::decode_bounding_frustum(reader),
        ReaderKind::Ray => structural::decode_ray(reader),
        ReaderKind::Curve => structural::decode_curve(reader),

        // Graphics
        ReaderKind::Texture => Ok(Value::Null),
        ReaderKind::Texture2D => graphics::decode_texture2d(reader, ctx),
        ReaderKind::Texture3D => graphics::decode_texture3d(reader, ctx),
        ReaderKind::TextureCube => graphics::decode_texture_cube(reader, ctx),
        ReaderKind::IndexBuffer => graphics::decode_index_buffer(reader),
        ReaderKind::VertexBuffer => graphics::decode_vertex_buffer(reader),
        ReaderKind::VertexDeclaration => graphics::decode_vertex_declaration(reader),
        ReaderKind::Effect => graphics::decode_effect(reader),
        ReaderKind::EffectMaterial => graphics::decode_effect_material(reader, ctx),
        ReaderKind::BasicEffect => graphics::decode_basic_effect(reader),
        ReaderKind::AlphaTestEffect => graphics::decode_alpha_test_effect(reader),
        ReaderKind::DualTextureEffect => graphics::decode_dual_texture_effect(reader),
        ReaderKind::EnvironmentMapEffect => graphics::decode_environment_map_effect(reader),
        ReaderKind::SkinnedEffect => graphics::decode_skinned_effect(reader),
        ReaderKind::SpriteFont => graphics::decode_sprite_font(reader, ctx),
        ReaderKind::Model => graphics::decode_model(reader, ctx),

        // Media
        ReaderKind::SoundEffect => media::decode_sound_effect(reader, ctx),
        ReaderKind::Song => media::decode_song(reader),
        ReaderKind::Video => media::decode_video(reader),

        ReaderKind::Unknown => Ok(Value::Null),
    }
}

// =============================================================================
// GENERIC ADAPTERS
// =============================================================================

/// Presence byte, then `inner` or [`Value::Null`].
pub fn decode_nullable<F>(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<'_>,
    mut inner: F,
) -> Result<Value, DecodeError>
where
    F: FnMut(&mut Reader<'_>, &mut DecodeContext<'_>) -> Result<Value, DecodeError>,
{
    if reader.read_bool("has_value")? {
        inner(reader, ctx)
    } else {
        Ok(Value::Null)
    }
}

/// u32 count, then `count` invocations of `inner`. Lists and arrays share
/// this layout.
pub fn decode_list<F>(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<'_>,
    mut inner: F,
) -> Result<Value, DecodeError>
where
    F: FnMut(&mut Reader<'_>, &mut DecodeContext<'_>) -> Result<Value, DecodeError>,
{
    let count = reader.read_u32("list_count")?;
    let mut items = Vec::with_capacity(reader.capacity_hint(count as u64, 1));
    for i in 0..count {
        items.push(ctx.field(format!("[{i}]"), |ctx| inner(reader, ctx))?);
    }
    Ok(Value::List(items))
}

/// u32 count, then `count` (key, value) invocation pairs.
///
/// Each key and value is decoded and the resulting pair inserted, in
/// stream order.
pub fn decode_dictionary<K, V>(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<'_>,
    mut key: K,
    mut value: V,
) -> Result<Value, DecodeError>
where
    K: FnMut(&mut Reader<'_>, &mut DecodeContext<'_>) -> Result<Value, DecodeError>,
    V: FnMut(&mut Reader<'_>, &mut DecodeContext<'_>) -> Result<Value, DecodeError>,
{
    let count = reader.read_u32("dictionary_count")?;
    let mut entries = Vec::with_capacity(reader.capacity_hint(count as u64, 2));
    for i in 0..count {
        let k = ctx.field(format!("[{i}].key"), |ctx| key(reader, ctx))?;
        let v = ctx.field(format!("[{i}].value"), |ctx| value(reader, ctx))?;
        entries.push((k, v));
    }
    Ok(Value::Map(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::primitives::Writer;
    use crate::error::ErrorCode;
    use crate::model::ContentTypeDescriptor;

    const INT32: &str = "Microsoft.Xna.Framework.Content.Int32Reader";
    const STRING: &str = "Microsoft.Xna.Framework.Content.StringReader";
    const OBJECT: &str = "Microsoft.Xna.Framework.Content.ObjectReader";

    fn table(names: &[&str]) -> TypeReaderTable {
        TypeReaderTable::new(
            names
                .iter()
                .map(|n| ContentTypeDescriptor { name: n.to_string(), version: 0 })
                .collect(),
        )
    }

    fn decode(names: &[&str], data: &[u8]) -> Result<(Option<usize>, Value, Vec<Warning>), DecodeError> {
        let table = table(names);
        let options = DecodeOptions::default();
        let mut ctx = DecodeContext::new(&table, &options);
        let mut reader = Reader::new(data);
        let (index, value) = decode_object(&mut reader, &mut ctx)?;
        assert!(reader.is_empty(), "{} bytes left over", reader.remaining_len());
        let (warnings, _) = ctx.finish();
        Ok((index, value, warnings))
    }

    #[test]
    fn test_null_reference() {
        let (index, value, _) = decode(&[INT32], &[0]).unwrap();
        assert_eq!(index, None);
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_table_reference() {
        let mut w = Writer::new();
        w.write_varint(2);
        w.write_i32(-7);
        let (index, value, _) = decode(&[STRING, INT32], w.as_bytes()).unwrap();
        assert_eq!(index, Some(1));
        assert_eq!(value, Value::Int(-7));
    }

    #[test]
    fn test_reference_past_table_is_fatal() {
        let err = decode(&[INT32], &[2, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReaderOutOfRange);
        assert_eq!(
            err.root(),
            &DecodeError::ReaderOutOfRange { reference: 2, size: 1 }
        );
    }

    #[test]
    fn test_unknown_reader_yields_null_and_warning() {
        let (index, value, warnings) = decode(&["MyGame.LevelReader"], &[1]).unwrap();
        assert_eq!(index, Some(0));
        assert_eq!(value, Value::Null);
        assert!(matches!(
            &warnings[..],
            [Warning::UnknownReader { name, .. }] if name == "MyGame.LevelReader"
        ));
    }

    #[test]
    fn test_inline_object_binding() {
        let mut w = Writer::new();
        w.write_varint(1); // ObjectReader
        w.write_string(INT32); // not in the table
        w.write_i32(99);
        let (_, value, _) = decode(&[OBJECT], w.as_bytes()).unwrap();
        assert_eq!(value, Value::Int(99));
    }

    #[test]
    fn test_list_of_inline_values() {
        let list = "Microsoft.Xna.Framework.Content.ListReader`1[[System.Int32, mscorlib]]";
        let mut w = Writer::new();
        w.write_varint(1);
        w.write_u32(3);
        for v in [1, 2, 3] {
            w.write_i32(v);
        }
        let (_, value, _) = decode(&[list], w.as_bytes()).unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn test_list_of_declared_enum_reads_inline_values() {
        let list = "Microsoft.Xna.Framework.Content.ListReader`1[[MyGame.Direction, MyGame]]";
        let direction = "Microsoft.Xna.Framework.Content.EnumReader`1[[MyGame.Direction, MyGame]]";
        let mut w = Writer::new();
        w.write_varint(1);
        w.write_u32(2);
        w.write_i32(3);
        w.write_i32(0);
        let (_, value, warnings) = decode(&[list, direction], w.as_bytes()).unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(3), Value::Int(0)]));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_array_of_referenced_objects() {
        let array = "Microsoft.Xna.Framework.Content.ArrayReader`1[[System.String, mscorlib]]";
        let mut w = Writer::new();
        w.write_varint(1);
        w.write_u32(2);
        w.write_varint(2);
        w.write_string("a");
        w.write_varint(0); // null element
        let (_, value, _) = decode(&[array, STRING], w.as_bytes()).unwrap();
        assert_eq!(value, Value::List(vec![Value::String("a".into()), Value::Null]));
    }

    #[test]
    fn test_dictionary_invokes_key_and_value() {
        let dict = "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.Int32, mscorlib],[System.String, mscorlib]]";
        let mut w = Writer::new();
        w.write_varint(1);
        w.write_u32(2);
        w.write_i32(10);
        w.write_varint(2);
        w.write_string("ten");
        w.write_i32(20);
        w.write_varint(2);
        w.write_string("twenty");
        let (_, value, _) = decode(&[dict, STRING], w.as_bytes()).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![
                (Value::Int(10), Value::String("ten".into())),
                (Value::Int(20), Value::String("twenty".into())),
            ])
        );
    }

    #[test]
    fn test_nullable() {
        let nullable = "Microsoft.Xna.Framework.Content.NullableReader`1[[System.Char, mscorlib]]";
        let (_, value, _) = decode(&[nullable], &[1, 0]).unwrap();
        assert_eq!(value, Value::Null);
        let (_, value, _) = decode(&[nullable], &[1, 1, b'x']).unwrap();
        assert_eq!(value, Value::Char('x'));
    }

    #[test]
    fn test_error_reports_field_path() {
        let list = "Microsoft.Xna.Framework.Content.ListReader`1[[System.Object, mscorlib]]";
        let mut w = Writer::new();
        w.write_varint(1);
        w.write_u32(2);
        w.write_varint(0);
        w.write_varint(5); // out of range
        let err = decode(&[list], w.as_bytes()).unwrap_err();
        match err {
            DecodeError::At { path, depth, .. } => {
                assert_eq!(path, "List[1]");
                assert_eq!(depth, 1);
            }
            other => panic!("expected located error, got {other:?}"),
        }
    }

    #[test]
    fn test_reflective_reader_is_fatal() {
        let err = decode(&["Microsoft.Xna.Framework.Content.ReflectiveReader`1[[MyGame.Foo, MyGame]]"], &[1])
            .unwrap_err();
        assert!(matches!(err.root(), DecodeError::ReflectiveReader { .. }));
    }

    #[test]
    fn test_depth_limit() {
        // Each ObjectReader level names ObjectReader again, forever.
        let mut w = Writer::new();
        w.write_varint(1);
        for _ in 0..300 {
            w.write_string(OBJECT);
        }
        let table = table(&[OBJECT]);
        let options = DecodeOptions { max_depth: 16, ..DecodeOptions::default() };
        let mut ctx = DecodeContext::new(&table, &options);
        let mut reader = Reader::new(w.as_bytes());
        let err = decode_object(&mut reader, &mut ctx).unwrap_err();
        assert_eq!(err.root(), &DecodeError::DepthExceeded { max: 16 });
    }
}
