//! Type reader descriptors and name-to-decoder binding.
//!
//! Reader names in the container are CLR assembly-qualified type names such
//! as
//!
//! ```text
//! Microsoft.Xna.Framework.Content.ListReader`1[[System.Int32, mscorlib]], Microsoft.Xna.Framework
//! ```
//!
//! Only the base name selects the decoder; generic arguments select element
//! decoders and the assembly qualification is ignored.

use lazy_static::lazy_static;
use rustc_hash::{FxHashMap, FxHashSet};

/// One entry of the reader table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeDescriptor {
    /// Qualified reader name as stored.
    pub name: String,
    /// Reader version. Diagnostic only.
    pub version: i32,
}

/// Decoder selected for a reader name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderKind {
    // Primitive
    Byte,
    SByte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Boolean,
    Char,
    String,
    Object,
    // System
    Enum,
    Nullable,
    Array,
    List,
    Dictionary,
    TimeSpan,
    DateTime,
    Decimal,
    ExternalReference,
    Reflective,
    // Math
    Vector2,
    Vector3,
    Vector4,
    Matrix,
    Quaternion,
    Color,
    Plane,
    Point,
    Rectangle,
    BoundingBox,
    BoundingSphere,
    BoundingFrustum,
    Ray,
    Curve,
    // Graphics
    Texture,
    Texture2D,
    Texture3D,
    TextureCube,
    IndexBuffer,
    VertexBuffer,
    VertexDeclaration,
    Effect,
    EffectMaterial,
    BasicEffect,
    AlphaTestEffect,
    DualTextureEffect,
    EnvironmentMapEffect,
    SkinnedEffect,
    SpriteFont,
    Model,
    // Media
    SoundEffect,
    Song,
    Video,
    /// No decoder is known for the name.
    Unknown,
}

const CONTENT_NS: &str = "Microsoft.Xna.Framework.Content.";

/// (kind, reader class name without namespace and `Reader` suffix)
const READERS: &[(ReaderKind, &str)] = &[
    (ReaderKind::Byte, "Byte"),
    (ReaderKind::SByte, "SByte"),
    (ReaderKind::Int16, "Int16"),
    (ReaderKind::UInt16, "UInt16"),
    (ReaderKind::Int32, "Int32"),
    (ReaderKind::UInt32, "UInt32"),
    (ReaderKind::Int64, "Int64"),
    (ReaderKind::UInt64, "UInt64"),
    (ReaderKind::Single, "Single"),
    (ReaderKind::Double, "Double"),
    (ReaderKind::Boolean, "Boolean"),
    (ReaderKind::Char, "Char"),
    (ReaderKind::String, "String"),
    (ReaderKind::Object, "Object"),
    (ReaderKind::Enum, "Enum"),
    (ReaderKind::Nullable, "Nullable"),
    (ReaderKind::Array, "Array"),
    (ReaderKind::List, "List"),
    (ReaderKind::Dictionary, "Dictionary"),
    (ReaderKind::TimeSpan, "TimeSpan"),
    (ReaderKind::DateTime, "DateTime"),
    (ReaderKind::Decimal, "Decimal"),
    (ReaderKind::ExternalReference, "ExternalReference"),
    (ReaderKind::Reflective, "Reflective"),
    (ReaderKind::Vector2, "Vector2"),
    (ReaderKind::Vector3, "Vector3"),
    (ReaderKind::Vector4, "Vector4"),
    (ReaderKind::Matrix, "Matrix"),
    (ReaderKind::Quaternion, "Quaternion"),
    (ReaderKind::Color, "Color"),
    (ReaderKind::Plane, "Plane"),
    (ReaderKind::Point, "Point"),
    (ReaderKind::Rectangle, "Rectangle"),
    (ReaderKind::BoundingBox, "BoundingBox"),
    (ReaderKind::BoundingSphere, "BoundingSphere"),
    (ReaderKind::BoundingFrustum, "BoundingFrustum"),
    (ReaderKind::Ray, "Ray"),
    (ReaderKind::Curve, "Curve"),
    (ReaderKind::Texture, "Texture"),
    (ReaderKind::Texture2D, "Texture2D"),
    (ReaderKind::Texture3D, "Texture3D"),
    (ReaderKind::TextureCube, "TextureCube"),
    (ReaderKind::IndexBuffer, "IndexBuffer"),
    (ReaderKind::VertexBuffer, "VertexBuffer"),
    (ReaderKind::VertexDeclaration, "VertexDeclaration"),
    (ReaderKind::Effect, "Effect"),
    (ReaderKind::EffectMaterial, "EffectMaterial"),
    (ReaderKind::BasicEffect, "BasicEffect"),
    (ReaderKind::AlphaTestEffect, "AlphaTestEffect"),
    (ReaderKind::DualTextureEffect, "DualTextureEffect"),
    (ReaderKind::EnvironmentMapEffect, "EnvironmentMapEffect"),
    (ReaderKind::SkinnedEffect, "SkinnedEffect"),
    (ReaderKind::SpriteFont, "SpriteFont"),
    (ReaderKind::Model, "Model"),
    (ReaderKind::SoundEffect, "SoundEffect"),
    (ReaderKind::Song, "Song"),
    (ReaderKind::Video, "Video"),
];

/// Value types whose elements are stored inline (no type reference) when
/// they appear as generic arguments.
const INLINE_TARGETS: &[(&str, ReaderKind)] = &[
    ("System.Byte", ReaderKind::Byte),
    ("System.SByte", ReaderKind::SByte),
    ("System.Int16", ReaderKind::Int16),
    ("System.UInt16", ReaderKind::UInt16),
    ("System.Int32", ReaderKind::Int32),
    ("System.UInt32", ReaderKind::UInt32),
    ("System.Int64", ReaderKind::Int64),
    ("System.UInt64", ReaderKind::UInt64),
    ("System.Single", ReaderKind::Single),
    ("System.Double", ReaderKind::Double),
    ("System.Boolean", ReaderKind::Boolean),
    ("System.Char", ReaderKind::Char),
    ("System.TimeSpan", ReaderKind::TimeSpan),
    ("System.DateTime", ReaderKind::DateTime),
    ("System.Decimal", ReaderKind::Decimal),
    ("System.Nullable", ReaderKind::Nullable),
    ("Microsoft.Xna.Framework.Vector2", ReaderKind::Vector2),
    ("Microsoft.Xna.Framework.Vector3", ReaderKind::Vector3),
    ("Microsoft.Xna.Framework.Vector4", ReaderKind::Vector4),
    ("Microsoft.Xna.Framework.Matrix", ReaderKind::Matrix),
    ("Microsoft.Xna.Framework.Quaternion", ReaderKind::Quaternion),
    ("Microsoft.Xna.Framework.Color", ReaderKind::Color),
    ("Microsoft.Xna.Framework.Graphics.Color", ReaderKind::Color),
    ("Microsoft.Xna.Framework.Plane", ReaderKind::Plane),
    ("Microsoft.Xna.Framework.Point", ReaderKind::Point),
    ("Microsoft.Xna.Framework.Rectangle", ReaderKind::Rectangle),
    ("Microsoft.Xna.Framework.BoundingBox", ReaderKind::BoundingBox),
    ("Microsoft.Xna.Framework.BoundingSphere", ReaderKind::BoundingSphere),
    ("Microsoft.Xna.Framework.Ray", ReaderKind::Ray),
];

lazy_static! {
    static ref READER_KINDS: FxHashMap<String, ReaderKind> = READERS
        .iter()
        .map(|(kind, class)| (format!("{CONTENT_NS}{class}Reader"), *kind))
        .collect();
    static ref INLINE_KINDS: FxHashMap<&'static str, ReaderKind> =
        INLINE_TARGETS.iter().copied().collect();
}

impl ReaderKind {
    /// Looks up the decoder for a reader base name (no generic arguments,
    /// no assembly qualification).
    pub fn from_base_name(base: &str) -> ReaderKind {
        READER_KINDS.get(base).copied().unwrap_or(ReaderKind::Unknown)
    }

    /// Short label used in field paths and logs.
    pub fn label(self) -> &'static str {
        READERS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or("Unknown", |(_, class)| class)
    }

    /// Number of element decoders a generic reader takes.
    pub fn generic_arity(self) -> usize {
        match self {
            ReaderKind::Nullable | ReaderKind::Array | ReaderKind::List => 1,
            ReaderKind::Dictionary => 2,
            _ => 0,
        }
    }
}

/// Parsed CLR type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    /// Namespace-qualified name without arity, arguments or assembly.
    pub base: String,
    /// Generic type arguments.
    pub args: Vec<TypeName>,
    /// The name denotes an array of `base`.
    pub is_array: bool,
}

impl TypeName {
    /// Parses an assembly-qualified, possibly generic, type name.
    ///
    /// Parsing never fails; unexpected syntax yields a name that simply
    /// matches no decoder.
    pub fn parse(name: &str) -> TypeName {
        let s = name.trim();
        let bytes = s.as_bytes();
        let mut i = 0;
        while i < bytes.len() && !matches!(bytes[i], b'`' | b'[' | b',') {
            i += 1;
        }
        let base = s[..i].trim().to_string();
        let mut args = Vec::new();
        let mut is_array = false;

        if i < bytes.len() && bytes[i] == b'`' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        if s[i..].starts_with("[]") {
            is_array = true;
        } else if i < bytes.len() && bytes[i] == b'[' {
            i += 1;
            while i < bytes.len() {
                match bytes[i] {
                    b']' => break,
                    b',' | b' ' => i += 1,
                    b'[' => {
                        let end = matching_bracket(bytes, i).unwrap_or(bytes.len());
                        args.push(TypeName::parse(&s[i + 1..end]));
                        i = end + 1;
                    }
                    _ => {
                        // Unbracketed argument, e.g. List`1[System.Int32]
                        let start = i;
                        let mut depth = 0usize;
                        while i < bytes.len() {
                            match bytes[i] {
                                b'[' => depth += 1,
                                b']' if depth == 0 => break,
                                b']' => depth -= 1,
                                b',' if depth == 0 => break,
                                _ => {}
                            }
                            i += 1;
                        }
                        args.push(TypeName::parse(&s[start..i]));
                    }
                }
            }
        }

        TypeName { base, args, is_array }
    }
}

/// Index of the `]` matching the `[` at `open`.
fn matching_bracket(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &b) in bytes[open..].iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// How elements of a generic reader are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementReader {
    /// Inline value decoded with a fixed binding.
    Direct(Box<Binding>),
    /// Polymorphic element preceded by its own type reference.
    Object,
}

impl ElementReader {
    /// Chooses the element decoder for a generic argument type.
    ///
    /// `enums` holds the user enum types the container declares readers
    /// for; those are stored inline as their underlying `i32`.
    pub fn for_target(target: &TypeName, enums: &FxHashSet<String>) -> ElementReader {
        if target.is_array {
            return ElementReader::Object;
        }
        if let Some(&kind) = INLINE_KINDS.get(target.base.as_str()) {
            return ElementReader::Direct(Box::new(Binding::with_args(
                target.base.clone(),
                kind,
                &target.args,
                enums,
            )));
        }
        if enums.contains(&target.base) {
            return ElementReader::Direct(Box::new(Binding {
                name: target.base.clone(),
                kind: ReaderKind::Enum,
                elements: Vec::new(),
            }));
        }
        ElementReader::Object
    }
}

/// A reader name bound to its decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Name the binding was resolved from.
    pub name: String,
    pub kind: ReaderKind,
    /// Element decoders for generic readers, `generic_arity` long.
    pub elements: Vec<ElementReader>,
}

impl Binding {
    /// Resolves a qualified reader name. Unknown names bind to
    /// [`ReaderKind::Unknown`].
    pub fn resolve(name: &str) -> Binding {
        Binding::resolve_with(name, &FxHashSet::default())
    }

    /// Like [`Binding::resolve`], treating generic arguments named in
    /// `enums` as inline enum values.
    pub fn resolve_with(name: &str, enums: &FxHashSet<String>) -> Binding {
        let parsed = TypeName::parse(name);
        let kind = ReaderKind::from_base_name(&parsed.base);
        Binding::with_args(name.to_string(), kind, &parsed.args, enums)
    }

    /// The enum type read by an `EnumReader` name, if `name` is one.
    pub fn enum_target(name: &str) -> Option<String> {
        let parsed = TypeName::parse(name);
        if ReaderKind::from_base_name(&parsed.base) != ReaderKind::Enum {
            return None;
        }
        parsed.args.into_iter().next().map(|arg| arg.base)
    }

    fn with_args(name: String, kind: ReaderKind, args: &[TypeName], enums: &FxHashSet<String>) -> Binding {
        let elements = (0..kind.generic_arity())
            .map(|i| {
                args.get(i)
                    .map_or(ElementReader::Object, |arg| ElementReader::for_target(arg, enums))
            })
            .collect();
        Binding { name, kind, elements }
    }

    /// Element decoder `i`, falling back to a typed-object element.
    pub fn element(&self, i: usize) -> &ElementReader {
        self.elements.get(i).unwrap_or(&ElementReader::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_reader_name() {
        let b = Binding::resolve("Microsoft.Xna.Framework.Content.Texture2DReader");
        assert_eq!(b.kind, ReaderKind::Texture2D);
        assert!(b.elements.is_empty());
    }

    #[test]
    fn test_assembly_qualified_name() {
        let b = Binding::resolve(
            "Microsoft.Xna.Framework.Content.SoundEffectReader, Microsoft.Xna.Framework, \
             Version=4.0.0.0, Culture=neutral, PublicKeyToken=842cf8be1de50553",
        );
        assert_eq!(b.kind, ReaderKind::SoundEffect);
    }

    #[test]
    fn test_generic_list_of_value_type() {
        let b = Binding::resolve(
            "Microsoft.Xna.Framework.Content.ListReader`1[[System.Int32, mscorlib, \
             Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089]]",
        );
        assert_eq!(b.kind, ReaderKind::List);
        match b.element(0) {
            ElementReader::Direct(inner) => assert_eq!(inner.kind, ReaderKind::Int32),
            other => panic!("expected inline element, got {other:?}"),
        }
    }

    #[test]
    fn test_generic_dictionary_mixed_elements() {
        let b = Binding::resolve(
            "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String, mscorlib],\
             [Microsoft.Xna.Framework.Vector3, Microsoft.Xna.Framework]]",
        );
        assert_eq!(b.kind, ReaderKind::Dictionary);
        assert_eq!(b.element(0), &ElementReader::Object);
        match b.element(1) {
            ElementReader::Direct(inner) => assert_eq!(inner.kind, ReaderKind::Vector3),
            other => panic!("expected inline element, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_nullable_argument() {
        let b = Binding::resolve(
            "Microsoft.Xna.Framework.Content.ArrayReader`1[[System.Nullable`1[[System.Char, mscorlib]], mscorlib]]",
        );
        assert_eq!(b.kind, ReaderKind::Array);
        let ElementReader::Direct(nullable) = b.element(0) else {
            panic!("expected inline nullable");
        };
        assert_eq!(nullable.kind, ReaderKind::Nullable);
        let ElementReader::Direct(ch) = nullable.element(0) else {
            panic!("expected inline char");
        };
        assert_eq!(ch.kind, ReaderKind::Char);
    }

    #[test]
    fn test_generic_without_arguments_uses_object_elements() {
        let b = Binding::resolve("Microsoft.Xna.Framework.Content.ListReader");
        assert_eq!(b.kind, ReaderKind::List);
        assert_eq!(b.elements, vec![ElementReader::Object]);
        let b = Binding::resolve("Microsoft.Xna.Framework.Content.ListReader`1[System.Int32[]]");
        assert_eq!(b.element(0), &ElementReader::Object);
    }

    #[test]
    fn test_declared_enum_argument_is_inline() {
        let enum_reader = "Microsoft.Xna.Framework.Content.EnumReader`1[[MyGame.Direction, MyGame]]";
        let target = Binding::enum_target(enum_reader);
        assert_eq!(target.as_deref(), Some("MyGame.Direction"));
        assert_eq!(Binding::enum_target("Microsoft.Xna.Framework.Content.Int32Reader"), None);

        let list = "Microsoft.Xna.Framework.Content.ListReader`1[[MyGame.Direction, MyGame]]";
        assert_eq!(Binding::resolve(list).element(0), &ElementReader::Object);

        let enums: FxHashSet<String> = target.into_iter().collect();
        let b = Binding::resolve_with(list, &enums);
        match b.element(0) {
            ElementReader::Direct(inner) => assert_eq!(inner.kind, ReaderKind::Enum),
            other => panic!("expected inline enum, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_name() {
        let b = Binding::resolve("MyGame.Content.LevelReader, MyGame");
        assert_eq!(b.kind, ReaderKind::Unknown);
        assert_eq!(ReaderKind::Unknown.label(), "Unknown");
        assert_eq!(ReaderKind::Texture2D.label(), "Texture2D");
    }
}
