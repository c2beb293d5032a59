//! Decoders for textures, geometry buffers, effects, sprite fonts and
//! models.
//!
//! Texture levels are unpacked into [`PixelGrid`]s and recorded as
//! artifacts; the value tree keeps only their metadata.

use tracing::debug;

use crate::codec::object::{decode_any, decode_list, decode_nullable, DecodeContext};
use crate::codec::pixel::unpack_texel;
use crate::codec::primitives::Reader;
use crate::codec::structural::{
    decode_bounding_sphere, decode_char, decode_external_reference, decode_rectangle, decode_vector3,
    read_enum_name, read_matrix,
};
use crate::error::DecodeError;
use crate::limits::BYTE_BONE_REFERENCE_LIMIT;
use crate::model::{ArtifactKind, Object, PixelGrid, SurfaceFormat, TexelBuffer, Value};

// =============================================================================
// TEXTURES
// =============================================================================

fn read_surface_format(reader: &mut Reader<'_>) -> Result<SurfaceFormat, DecodeError> {
    let index = reader.read_i32("surface_format")?;
    SurfaceFormat::from_i32(index).ok_or(DecodeError::UnknownSurfaceFormat { index })
}

/// Extent of mip `level` when levels are sized from their stored bytes.
///
/// Keeps the full extent unless `data_size` matches the halved extent for
/// that level and not the full one.
fn mip_extent(format: SurfaceFormat, extent: [u32; 3], level: u32, data_size: u32) -> [u32; 3] {
    let Some(texel_size) = format.texel_size() else {
        return extent;
    };
    let bytes = |e: [u32; 3]| e.iter().map(|&d| u64::from(d)).product::<u64>() * texel_size as u64;
    let halved = extent.map(|d| d.checked_shr(level).unwrap_or(0).max(1));
    let data_size = u64::from(data_size);
    if level > 0 && data_size == bytes(halved) && data_size != bytes(extent) {
        halved
    } else {
        extent
    }
}

/// Unpacks `width * height` texels.
fn read_grid(
    reader: &mut Reader<'_>,
    format: SurfaceFormat,
    width: u32,
    height: u32,
    legacy_narrowing: bool,
) -> Result<PixelGrid, DecodeError> {
    let count = u64::from(width) * u64::from(height);
    let capacity = reader.capacity_hint(count, format.texel_size().unwrap_or(1));
    let mut texels = TexelBuffer::with_capacity(format.texel_kind(), capacity);
    for _ in 0..count {
        texels.push(unpack_texel(reader, format, legacy_narrowing)?);
    }
    Ok(PixelGrid { width, height, texels })
}

/// Reads one mip level of `depth` slices and records each slice.
fn read_level(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<'_>,
    format: SurfaceFormat,
    extent: [u32; 3],
    level: u32,
    suffix: impl Fn(u32) -> String,
) -> Result<(), DecodeError> {
    let data_size = reader.read_u32("mip_data_size")?;
    let [width, height, depth] = if ctx.options().mip_chain_extents {
        mip_extent(format, extent, level, data_size)
    } else {
        extent
    };
    // Empty slices read nothing, so the input cannot bound their count.
    if depth > 1 && u64::from(width) * u64::from(height) == 0 {
        return Err(DecodeError::LengthExceedsLimit {
            field: "texture_depth",
            len: depth.into(),
            max: 1,
        });
    }
    let legacy = ctx.options().legacy_channel_narrowing;
    for z in 0..depth {
        let grid = read_grid(reader, format, width, height, legacy)?;
        ctx.emit(&suffix(z), ArtifactKind::Image(grid));
    }
    Ok(())
}

/// `format, width, height, mip_count`, then per level `data_size` and
/// texels. Artifacts are named `_mip{i}`.
pub fn decode_texture2d(reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    let format = read_surface_format(reader)?;
    let width = reader.read_u32("texture_width")?;
    let height = reader.read_u32("texture_height")?;
    let mip_count = reader.read_u32("mip_count")?;
    debug!(format = format.name(), width, height, mip_count, "texture2d");

    for level in 0..mip_count {
        ctx.field(format!("mip{level}"), |ctx| {
            read_level(reader, ctx, format, [width, height, 1], level, |_| format!("_mip{level}"))
        })?;
    }

    Ok(Object::with_capacity(4)
        .with("original_format", format.name())
        .with("width", width)
        .with("height", height)
        .with("mip_count", mip_count)
        .into())
}

/// Like Texture2D with a depth; each level holds `depth` slices named
/// `_mip{i}_z{z}`.
pub fn decode_texture3d(reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    let format = read_surface_format(reader)?;
    let width = reader.read_u32("texture_width")?;
    let height = reader.read_u32("texture_height")?;
    let depth = reader.read_u32("texture_depth")?;
    let mip_count = reader.read_u32("mip_count")?;
    debug!(format = format.name(), width, height, depth, mip_count, "texture3d");

    for level in 0..mip_count {
        ctx.field(format!("mip{level}"), |ctx| {
            read_level(reader, ctx, format, [width, height, depth], level, |z| {
                format!("_mip{level}_z{z}")
            })
        })?;
    }

    Ok(Object::with_capacity(5)
        .with("original_format", format.name())
        .with("width", width)
        .with("height", height)
        .with("depth", depth)
        .with("mip_count", mip_count)
        .into())
}

/// `format, size, mip_count`, then six faces of `mip_count` levels each,
/// named `_mip{i}_face{f}`.
pub fn decode_texture_cube(reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    let format = read_surface_format(reader)?;
    let size = reader.read_u32("texture_size")?;
    let mip_count = reader.read_u32("mip_count")?;
    debug!(format = format.name(), size, mip_count, "texture cube");

    for face in 0..6 {
        for level in 0..mip_count {
            ctx.field(format!("face{face}/mip{level}"), |ctx| {
                read_level(reader, ctx, format, [size, size, 1], level, |_| {
                    format!("_mip{level}_face{face}")
                })
            })?;
        }
    }

    Ok(Object::with_capacity(3)
        .with("original_format", format.name())
        .with("size", size)
        .with("mip_count", mip_count)
        .into())
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// `is_16_bit`, byte size, then `size / (2|4)` unsigned indices. Trailing
/// bytes that do not form a whole index are skipped.
pub fn decode_index_buffer(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let is_16_bit = reader.read_bool("index_format")?;
    let size = reader.read_u32("index_data_size")?;
    let width = if is_16_bit { 2 } else { 4 };
    let count = size / width;

    let mut indices = Vec::with_capacity(reader.capacity_hint(count.into(), width as usize));
    for _ in 0..count {
        let index = if is_16_bit {
            u32::from(reader.read_u16("index")?)
        } else {
            reader.read_u32("index")?
        };
        indices.push(Value::UInt(index.into()));
    }
    reader.read_bytes((size % width) as usize, "index_padding")?;

    Ok(Object::with_capacity(2)
        .with("is_16_bit", is_16_bit)
        .with("indices", Value::List(indices))
        .into())
}

const VERTEX_ELEMENT_FORMATS: &[&str] = &[
    "Single",
    "Vector2",
    "Vector3",
    "Vector4",
    "Color",
    "Byte4",
    "Short2",
    "Short4",
    "NormalizedShort2",
    "NormalizedShort4",
    "HalfVector2",
    "HalfVector4",
];

const VERTEX_ELEMENT_USAGES: &[&str] = &[
    "Position",
    "Color",
    "TextureCoordinate",
    "Normal",
    "Binormal",
    "Tangent",
    "BlendIndices",
    "BlendWeight",
    "Depth",
    "Fog",
    "PointSize",
    "Sample",
    "TessellateFactor",
];

/// Returns the vertex stride alongside the decoded declaration.
fn read_vertex_declaration(reader: &mut Reader<'_>) -> Result<(u32, Value), DecodeError> {
    let stride = reader.read_u32("vertex_stride")?;
    let element_count = reader.read_u32("vertex_element_count")?;

    let mut elements = Vec::with_capacity(reader.capacity_hint(element_count.into(), 16));
    for _ in 0..element_count {
        let element = Object::with_capacity(4)
            .with("offset", reader.read_u32("vertex_element_offset")?)
            .with(
                "element_format",
                read_enum_name(reader, "vertex_element_format", VERTEX_ELEMENT_FORMATS)?,
            )
            .with(
                "element_usage",
                read_enum_name(reader, "vertex_element_usage", VERTEX_ELEMENT_USAGES)?,
            )
            .with("usage_index", reader.read_u32("vertex_element_usage_index")?);
        elements.push(element.into());
    }

    let declaration = Object::with_capacity(3)
        .with("vertex_stride", stride)
        .with("element_count", element_count)
        .with("elements", Value::List(elements));
    Ok((stride, declaration.into()))
}

pub fn decode_vertex_declaration(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    read_vertex_declaration(reader).map(|(_, declaration)| declaration)
}

/// Declaration, vertex count, then `vertex_count * stride` raw bytes.
pub fn decode_vertex_buffer(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let (stride, declaration) = read_vertex_declaration(reader)?;
    let vertex_count = reader.read_u32("vertex_count")?;
    let len = usize::try_from(u64::from(vertex_count) * u64::from(stride))
        .map_err(|_| DecodeError::UnexpectedEof { context: "vertex_data" })?;
    let data = reader.read_bytes(len, "vertex_data")?;

    Ok(Object::with_capacity(3)
        .with("vertex_declaration", declaration)
        .with("vertex_count", vertex_count)
        .with("vertex_data", Value::Bytes(data.to_vec()))
        .into())
}

// =============================================================================
// EFFECTS
// =============================================================================

/// Compiled effect bytecode, kept opaque.
pub fn decode_effect(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let size = reader.read_u32("effect_size")?;
    let bytecode = reader.read_bytes(size as usize, "effect_bytecode")?;
    Ok(Value::Bytes(bytecode.to_vec()))
}

pub fn decode_effect_material(reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    let effect = decode_external_reference(reader)?;
    let parameters = ctx.field("parameters", |ctx| decode_any(reader, ctx))?;
    Ok(Object::with_capacity(2)
        .with("effect", effect)
        .with("parameters", parameters)
        .into())
}

pub fn decode_basic_effect(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(7)
        .with("texture", decode_external_reference(reader)?)
        .with("diffuse_color", decode_vector3(reader)?)
        .with("emissive_color", decode_vector3(reader)?)
        .with("specular_color", decode_vector3(reader)?)
        .with("specular_power", reader.read_f32("specular_power")?)
        .with("alpha", reader.read_f32("alpha")?)
        .with("vertex_color_enabled", reader.read_bool("vertex_color_enabled")?)
        .into())
}

const COMPARE_FUNCTIONS: &[&str] = &[
    "Always",
    "Never",
    "Less",
    "LessEqual",
    "Equal",
    "GreaterEqual",
    "Greater",
    "NotEqual",
];

pub fn decode_alpha_test_effect(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(6)
        .with("texture", decode_external_reference(reader)?)
        .with(
            "compare_function",
            read_enum_name(reader, "compare_function", COMPARE_FUNCTIONS)?,
        )
        .with("reference_alpha", reader.read_u32("reference_alpha")?)
        .with("diffuse_color", decode_vector3(reader)?)
        .with("alpha", reader.read_f32("alpha")?)
        .with("vertex_color_enabled", reader.read_bool("vertex_color_enabled")?)
        .into())
}

pub fn decode_dual_texture_effect(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(5)
        .with("texture1", decode_external_reference(reader)?)
        .with("texture2", decode_external_reference(reader)?)
        .with("diffuse_color", decode_vector3(reader)?)
        .with("alpha", reader.read_f32("alpha")?)
        .with("vertex_color_enabled", reader.read_bool("vertex_color_enabled")?)
        .into())
}

pub fn decode_environment_map_effect(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(8)
        .with("texture", decode_external_reference(reader)?)
        .with("environment_map", decode_external_reference(reader)?)
        .with("environment_map_amount", reader.read_f32("environment_map_amount")?)
        .with("environment_map_specular", decode_vector3(reader)?)
        .with("fresnel_factor", reader.read_f32("fresnel_factor")?)
        .with("diffuse_color", decode_vector3(reader)?)
        .with("emissive_color", decode_vector3(reader)?)
        .with("alpha", reader.read_f32("alpha")?)
        .into())
}

pub fn decode_skinned_effect(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(7)
        .with("texture", decode_external_reference(reader)?)
        .with("weights_per_vertex", reader.read_u32("weights_per_vertex")?)
        .with("diffuse_color", decode_vector3(reader)?)
        .with("emissive_color", decode_vector3(reader)?)
        .with("specular_color", decode_vector3(reader)?)
        .with("specular_power", reader.read_f32("specular_power")?)
        .with("alpha", reader.read_f32("alpha")?)
        .into())
}

// =============================================================================
// SPRITE FONT
// =============================================================================

/// Glyph sheet texture, glyph and cropping rectangles, character map,
/// spacing, kerning and the optional default character.
pub fn decode_sprite_font(reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    let texture = ctx.field("texture", |ctx| decode_texture2d(reader, ctx))?;
    let glyphs = ctx.field("glyphs", |ctx| decode_list(reader, ctx, |r, _| decode_rectangle(r)))?;
    let cropping = ctx.field("cropping", |ctx| decode_list(reader, ctx, |r, _| decode_rectangle(r)))?;
    let character_map = ctx.field("character_map", |ctx| decode_list(reader, ctx, |r, _| decode_char(r)))?;
    let vertical_line_spacing = reader.read_i32("vertical_line_spacing")?;
    let horizontal_spacing = reader.read_f32("horizontal_spacing")?;
    let kerning = ctx.field("kerning", |ctx| decode_list(reader, ctx, |r, _| decode_vector3(r)))?;
    let default_char = ctx.field("default_char", |ctx| decode_nullable(reader, ctx, |r, _| decode_char(r)))?;

    Ok(Object::with_capacity(8)
        .with("texture", texture)
        .with("glyphs", glyphs)
        .with("cropping", cropping)
        .with("character_map", character_map)
        .with("vertical_line_spacing", vertical_line_spacing)
        .with("horizontal_spacing", horizontal_spacing)
        .with("kerning", kerning)
        .with("default_char", default_char)
        .into())
}

// =============================================================================
// MODEL
// =============================================================================

/// Encoded width of bone references in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoneIndexWidth {
    /// One byte, used when the model has fewer than 255 bones.
    Byte,
    /// Four bytes.
    Dword,
}

impl BoneIndexWidth {
    /// Chooses the reference width for a model with `bone_count` bones.
    pub fn for_bone_count(bone_count: u32) -> Self {
        if bone_count < BYTE_BONE_REFERENCE_LIMIT {
            BoneIndexWidth::Byte
        } else {
            BoneIndexWidth::Dword
        }
    }

    /// Bytes per reference.
    pub fn byte_len(self) -> usize {
        match self {
            BoneIndexWidth::Byte => 1,
            BoneIndexWidth::Dword => 4,
        }
    }

    /// Reads a 1-based reference; 0 means no bone. The returned index is
    /// zero-based and always below `bone_count`.
    fn read_reference(self, reader: &mut Reader<'_>, bone_count: u32) -> Result<Option<u32>, DecodeError> {
        let raw = match self {
            BoneIndexWidth::Byte => u32::from(reader.read_byte("bone_reference")?),
            BoneIndexWidth::Dword => reader.read_u32("bone_reference")?,
        };
        match raw {
            0 => Ok(None),
            r if r > bone_count => Err(DecodeError::InvalidBoneReference { reference: r, bone_count }),
            r => Ok(Some(r - 1)),
        }
    }
}

/// Bones, bone hierarchy, meshes with their parts, root bone and tag.
pub fn decode_model(reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    let bone_count = reader.read_u32("bone_count")?;
    let width = BoneIndexWidth::for_bone_count(bone_count);
    debug!(bone_count, ?width, "model");

    let mut bones = Vec::with_capacity(reader.capacity_hint(bone_count.into(), 65));
    for i in 0..bone_count {
        let bone = ctx.field(format!("bones[{i}]"), |_| {
            let name = reader.read_string("bone_name")?;
            let transform = read_matrix(reader)?;
            Ok(Object::with_capacity(2)
                .with("name", name)
                .with("transform", Value::Matrix(transform)))
        })?;
        bones.push(bone.into());
    }

    let mut hierarchy = Vec::with_capacity(reader.capacity_hint(bone_count.into(), width.byte_len() + 4));
    for i in 0..bone_count {
        let node = ctx.field(format!("bone_references[{i}]"), |_| {
            let parent = width.read_reference(reader, bone_count)?;
            let child_count = reader.read_u32("bone_child_count")?;
            let mut children = Vec::with_capacity(reader.capacity_hint(child_count.into(), width.byte_len()));
            for _ in 0..child_count {
                children.push(width.read_reference(reader, bone_count)?.into());
            }
            Ok(Object::with_capacity(2)
                .with("parent", parent)
                .with("children", Value::List(children)))
        })?;
        hierarchy.push(node.into());
    }

    let mesh_count = reader.read_u32("mesh_count")?;
    let mut meshes = Vec::with_capacity(reader.capacity_hint(mesh_count.into(), 1));
    for i in 0..mesh_count {
        let mesh = ctx.field(format!("meshes[{i}]"), |ctx| decode_mesh(reader, ctx, width, bone_count))?;
        meshes.push(mesh);
    }

    let root_bone = ctx.field("root_bone", |_| width.read_reference(reader, bone_count))?;
    let tag = ctx.field("tag", |ctx| decode_any(reader, ctx))?;

    Ok(Object::with_capacity(5)
        .with("bones", Value::List(bones))
        .with("bone_references", Value::List(hierarchy))
        .with("meshes", Value::List(meshes))
        .with("root_bone", root_bone)
        .with("tag", tag)
        .into())
}

fn decode_mesh(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<'_>,
    width: BoneIndexWidth,
    bone_count: u32,
) -> Result<Value, DecodeError> {
    let name = reader.read_string("mesh_name")?;
    let parent_bone = width.read_reference(reader, bone_count)?;
    let bounds = decode_bounding_sphere(reader)?;
    let tag = ctx.field("tag", |ctx| decode_any(reader, ctx))?;

    let part_count = reader.read_u32("mesh_part_count")?;
    let mut parts = Vec::with_capacity(reader.capacity_hint(part_count.into(), 16));
    for i in 0..part_count {
        let part = ctx.field(format!("parts[{i}]"), |ctx| {
            let part = Object::with_capacity(8)
                .with("vertex_offset", reader.read_u32("vertex_offset")?)
                .with("num_vertices", reader.read_u32("num_vertices")?)
                .with("start_index", reader.read_u32("start_index")?)
                .with("primitive_count", reader.read_u32("primitive_count")?)
                .with("tag", ctx.field("tag", |ctx| decode_any(reader, ctx))?)
                .with("vertex_buffer", decode_vertex_buffer(reader)?)
                .with("index_buffer", decode_index_buffer(reader)?)
                .with("effect", decode_effect(reader)?);
            Ok(part)
        })?;
        parts.push(part.into());
    }

    Ok(Object::with_capacity(5)
        .with("name", name)
        .with("parent_bone", parent_bone)
        .with("bounds", bounds)
        .with("tag", tag)
        .with("parts", Value::List(parts))
        .into())
}
