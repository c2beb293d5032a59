//! Decoders for primitive, system and math types.
//!
//! None of these recurse into other objects, so they only need the
//! byte reader.

use crate::codec::primitives::Reader;
use crate::error::DecodeError;
use crate::model::{Matrix, Object, Value};

/// Reads an i32 enum value and maps it to its name.
pub(crate) fn read_enum_name(
    reader: &mut Reader<'_>,
    field: &'static str,
    names: &'static [&'static str],
) -> Result<&'static str, DecodeError> {
    let value = reader.read_i32(field)?;
    usize::try_from(value)
        .ok()
        .and_then(|i| names.get(i).copied())
        .ok_or(DecodeError::InvalidEnum {
            field,
            value: value.into(),
        })
}

// =============================================================================
// PRIMITIVE
// =============================================================================

pub fn decode_byte(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::UInt(reader.read_byte("byte")?.into()))
}

pub fn decode_sbyte(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Int(reader.read_sbyte("sbyte")?.into()))
}

pub fn decode_int16(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Int(reader.read_i16("int16")?.into()))
}

pub fn decode_uint16(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::UInt(reader.read_u16("uint16")?.into()))
}

pub fn decode_int32(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Int(reader.read_i32("int32")?.into()))
}

pub fn decode_uint32(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::UInt(reader.read_u32("uint32")?.into()))
}

pub fn decode_int64(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Int(reader.read_i64("int64")?))
}

pub fn decode_uint64(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::UInt(reader.read_u64("uint64")?))
}

pub fn decode_single(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Single(reader.read_f32("single")?))
}

pub fn decode_double(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Double(reader.read_f64("double")?))
}

pub fn decode_boolean(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Bool(reader.read_bool("boolean")?))
}

pub fn decode_char(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Char(reader.read_char("char")?))
}

pub fn decode_string(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::String(reader.read_string("string")?))
}

// =============================================================================
// SYSTEM
// =============================================================================

/// Enums are stored as their underlying i32.
pub fn decode_enum(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    decode_int32(reader)
}

/// `{ticks}`, with negative spans stored as their magnitude.
pub fn decode_timespan(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let ticks = reader.read_i64("timespan")?;
    Ok(Object::new().with("ticks", Value::UInt(ticks.unsigned_abs())).into())
}

/// `{kind, ticks}`: the top two bits are the kind, the rest the ticks.
pub fn decode_datetime(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let raw = reader.read_u64("datetime")?;
    Ok(Object::new()
        .with("kind", Value::UInt(raw >> 62))
        .with("ticks", Value::UInt(raw & !(3 << 62)))
        .into())
}

/// Four raw 32-bit words, uninterpreted.
pub fn decode_decimal(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let mut words = Vec::with_capacity(4);
    for _ in 0..4 {
        words.push(Value::UInt(reader.read_u32("decimal")?.into()));
    }
    Ok(Value::List(words))
}

pub fn decode_external_reference(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::ExternalReference {
        asset_name: reader.read_string("asset_name")?,
    })
}

// =============================================================================
// MATH
// =============================================================================

pub fn decode_vector2(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(2)
        .with("x", reader.read_f32("vector")?)
        .with("y", reader.read_f32("vector")?)
        .into())
}

pub fn decode_vector3(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(3)
        .with("x", reader.read_f32("vector")?)
        .with("y", reader.read_f32("vector")?)
        .with("z", reader.read_f32("vector")?)
        .into())
}

pub fn decode_vector4(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(4)
        .with("x", reader.read_f32("vector")?)
        .with("y", reader.read_f32("vector")?)
        .with("z", reader.read_f32("vector")?)
        .with("w", reader.read_f32("vector")?)
        .into())
}

pub fn decode_quaternion(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    decode_vector4(reader)
}

/// Reads a row-major 4x4 matrix. Values are kept bit for bit.
pub fn read_matrix(reader: &mut Reader<'_>) -> Result<Matrix, DecodeError> {
    let mut m = [[0f32; 4]; 4];
    for row in &mut m {
        for cell in row.iter_mut() {
            *cell = reader.read_f32("matrix")?;
        }
    }
    Ok(m)
}

pub fn decode_matrix(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Matrix(read_matrix(reader)?))
}

pub fn decode_color(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let [red, green, blue, alpha] = reader.read_array::<4>("color")?;
    Ok(Object::with_capacity(4)
        .with("red", Value::UInt(red.into()))
        .with("green", Value::UInt(green.into()))
        .with("blue", Value::UInt(blue.into()))
        .with("alpha", Value::UInt(alpha.into()))
        .into())
}

pub fn decode_plane(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(2)
        .with("normal", decode_vector3(reader)?)
        .with("d", reader.read_f32("plane")?)
        .into())
}

pub fn decode_point(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(2)
        .with("x", reader.read_i32("point")?)
        .with("y", reader.read_i32("point")?)
        .into())
}

pub fn decode_rectangle(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(4)
        .with("x", reader.read_i32("rectangle")?)
        .with("y", reader.read_i32("rectangle")?)
        .with("width", reader.read_i32("rectangle")?)
        .with("height", reader.read_i32("rectangle")?)
        .into())
}

pub fn decode_bounding_box(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(2)
        .with("min", decode_vector3(reader)?)
        .with("max", decode_vector3(reader)?)
        .into())
}

pub fn decode_bounding_sphere(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(2)
        .with("center", decode_vector3(reader)?)
        .with("radius", reader.read_f32("bounding_sphere")?)
        .into())
}

pub fn decode_bounding_frustum(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::new().with("frustum_matrix", decode_matrix(reader)?).into())
}

pub fn decode_ray(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(2)
        .with("position", decode_vector3(reader)?)
        .with("direction", decode_vector3(reader)?)
        .into())
}

const CURVE_LOOP_TYPES: &[&str] = &["Constant", "Cycle", "CycleOffset", "Oscillate", "Linear"];

/// Loop types, then `u32` key count and keys.
pub fn decode_curve(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let pre_loop = read_enum_name(reader, "curve_pre_loop", CURVE_LOOP_TYPES)?;
    let post_loop = read_enum_name(reader, "curve_post_loop", CURVE_LOOP_TYPES)?;
    let key_count = reader.read_u32("curve_key_count")?;

    let mut keys = Vec::with_capacity(reader.capacity_hint(key_count.into(), 20));
    for _ in 0..key_count {
        let key = Object::with_capacity(5)
            .with("position", reader.read_f32("curve_key")?)
            .with("value", reader.read_f32("curve_key")?)
            .with("tangent_in", reader.read_f32("curve_key")?)
            .with("tangent_out", reader.read_f32("curve_key")?);
        let continuity = if reader.read_i32("curve_continuity")? != 0 { "Step" } else { "Smooth" };
        keys.push(key.with("continuity", continuity).into());
    }

    Ok(Object::with_capacity(3)
        .with("pre_loop", pre_loop)
        .with("post_loop", post_loop)
        .with("keys", Value::List(keys))
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::primitives::Writer;

    #[test]
    fn test_matrix_is_bit_exact() {
        let cells: Vec<f32> = vec![
            1.0,
            -0.0,
            f32::MIN_POSITIVE,
            f32::MAX,
            0.1,
            -3.5,
            f32::from_bits(0x0000_0001), // subnormal
            f32::INFINITY,
            2.0,
            3.0,
            4.0,
            5.0,
            -1.0e-30,
            1.0e30,
            0.333_333_34,
            7.25,
        ];
        let mut w = Writer::new();
        for c in &cells {
            w.write_f32(*c);
        }
        let m = read_matrix(&mut Reader::new(w.as_bytes())).unwrap();
        for (i, c) in cells.iter().enumerate() {
            assert_eq!(m[i / 4][i % 4].to_bits(), c.to_bits(), "cell {i}");
        }
    }

    #[test]
    fn test_matrix_is_row_major() {
        let mut w = Writer::new();
        for i in 0..16 {
            w.write_f32(i as f32);
        }
        let m = read_matrix(&mut Reader::new(w.as_bytes())).unwrap();
        assert_eq!(m[0], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(m[3][0], 12.0);
    }

    #[test]
    fn test_timespan_sign_forced_positive() {
        let mut w = Writer::new();
        w.write_i64(-1234);
        let v = decode_timespan(&mut Reader::new(w.as_bytes())).unwrap();
        assert_eq!(v.get("ticks"), Some(&Value::UInt(1234)));
    }

    #[test]
    fn test_datetime_kind_and_ticks() {
        let raw: u64 = (2 << 62) | 630_822_816_000_000_000;
        let v = decode_datetime(&mut Reader::new(&raw.to_le_bytes())).unwrap();
        assert_eq!(v.get("kind"), Some(&Value::UInt(2)));
        assert_eq!(v.get("ticks"), Some(&Value::UInt(630_822_816_000_000_000)));
    }

    #[test]
    fn test_color_channel_order() {
        let v = decode_color(&mut Reader::new(&[10, 20, 30, 40])).unwrap();
        assert_eq!(v.get("red"), Some(&Value::UInt(10)));
        assert_eq!(v.get("alpha"), Some(&Value::UInt(40)));
    }

    #[test]
    fn test_curve() {
        let mut w = Writer::new();
        w.write_i32(1); // Cycle
        w.write_i32(4); // Linear
        w.write_u32(2);
        for (pos, continuity) in [(0.0, 0), (1.0, 1)] {
            w.write_f32(pos);
            w.write_f32(pos * 2.0);
            w.write_f32(0.0);
            w.write_f32(0.0);
            w.write_i32(continuity);
        }
        let mut reader = Reader::new(w.as_bytes());
        let v = decode_curve(&mut reader).unwrap();
        assert!(reader.is_empty());
        assert_eq!(v.get("pre_loop").and_then(Value::as_str), Some("Cycle"));
        assert_eq!(v.get("post_loop").and_then(Value::as_str), Some("Linear"));
        let keys = v.get("keys").and_then(Value::as_list).unwrap();
        assert_eq!(keys[0].get("continuity").and_then(Value::as_str), Some("Smooth"));
        assert_eq!(keys[1].get("continuity").and_then(Value::as_str), Some("Step"));
        assert_eq!(keys[1].get("value"), Some(&Value::Single(2.0)));
    }

    #[test]
    fn test_curve_bad_loop_type() {
        let mut w = Writer::new();
        w.write_i32(9);
        let err = decode_curve(&mut Reader::new(w.as_bytes())).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidEnum { field: "curve_pre_loop", value: 9 }
        );
    }
}
