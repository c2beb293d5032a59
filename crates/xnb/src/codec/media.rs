//! Decoders for audio and video content.

use tracing::debug;

use crate::codec::object::DecodeContext;
use crate::codec::primitives::{Reader, Writer};
use crate::codec::structural::read_enum_name;
use crate::error::DecodeError;
use crate::limits::{WAVE_FMT_CHUNK_LEN, WAVE_FORMAT_EX_LEN, WAVE_HEADER_LEN};
use crate::model::{ArtifactKind, Object, Value};

/// Wraps a `fmt ` chunk body and PCM payload in a RIFF/WAVE stream.
pub fn riff_wave(format: &[u8; WAVE_FMT_CHUNK_LEN], pcm: &[u8]) -> Vec<u8> {
    let data_size = pcm.len() as u32;
    let mut w = Writer::with_capacity(WAVE_HEADER_LEN + pcm.len());
    w.write_bytes(b"RIFF");
    w.write_u32(data_size.wrapping_add(36));
    w.write_bytes(b"WAVEfmt ");
    w.write_u32(WAVE_FMT_CHUNK_LEN as u32);
    w.write_bytes(format);
    w.write_bytes(b"data");
    w.write_u32(data_size);
    w.write_bytes(pcm);
    w.into_bytes()
}

/// Format chunk, PCM data and loop metadata. The audio is recorded as a
/// WAVE artifact named after the object.
pub fn decode_sound_effect(reader: &mut Reader<'_>, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    // Stored size of the format chunk; the chunk itself is always
    // WAVEFORMATEX.
    reader.read_u32("wave_format_size")?;
    let format_ex = reader.read_array::<WAVE_FORMAT_EX_LEN>("wave_format")?;
    let mut format = [0u8; WAVE_FMT_CHUNK_LEN];
    format.copy_from_slice(&format_ex[..WAVE_FMT_CHUNK_LEN]);

    let data_size = reader.read_u32("wave_data_size")?;
    let pcm = reader.read_bytes(data_size as usize, "wave_data")?;
    debug!(data_size, "sound effect");
    ctx.emit("", ArtifactKind::Wave(riff_wave(&format, pcm)));

    Ok(Object::with_capacity(3)
        .with("loop_start", reader.read_i32("loop_start")?)
        .with("loop_length", reader.read_i32("loop_length")?)
        .with("duration", reader.read_i32("duration")?)
        .into())
}

pub fn decode_song(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(2)
        .with("filename", reader.read_string("song_filename")?)
        .with("duration", reader.read_i32("song_duration")?)
        .into())
}

const SOUNDTRACK_TYPES: &[&str] = &["Music", "Dialog", "MusicAndDialog"];

pub fn decode_video(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    Ok(Object::with_capacity(6)
        .with("filename", reader.read_string("video_filename")?)
        .with("duration", reader.read_i32("video_duration")?)
        .with("width", reader.read_i32("video_width")?)
        .with("height", reader.read_i32("video_height")?)
        .with("fps", reader.read_f32("video_fps")?)
        .with(
            "soundtrack_type",
            read_enum_name(reader, "soundtrack_type", SOUNDTRACK_TYPES)?,
        )
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::container::DecodeOptions;
    use crate::codec::registry::TypeReaderTable;

    #[test]
    fn test_sound_effect_riff() {
        let pcm: Vec<u8> = (0..100u8).collect();
        let format_ex: [u8; 18] = [1, 0, 1, 0, 0x44, 0xAC, 0, 0, 0x88, 0x58, 1, 0, 2, 0, 16, 0, 0xEE, 0xEE];

        let mut w = Writer::new();
        w.write_u32(18);
        w.write_bytes(&format_ex);
        w.write_u32(pcm.len() as u32);
        w.write_bytes(&pcm);
        w.write_i32(0);
        w.write_i32(50);
        w.write_i32(2267);

        let table = TypeReaderTable::default();
        let options = DecodeOptions::default();
        let mut ctx = DecodeContext::new(&table, &options);
        ctx.set_artifact_base("primary");
        let mut reader = Reader::new(w.as_bytes());
        let value = decode_sound_effect(&mut reader, &mut ctx).unwrap();
        assert!(reader.is_empty());
        assert_eq!(value.get("loop_length").and_then(Value::as_i64), Some(50));
        assert_eq!(value.get("duration").and_then(Value::as_i64), Some(2267));

        let (_, artifacts) = ctx.finish();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "primary");
        let ArtifactKind::Wave(wave) = &artifacts[0].kind else {
            panic!("expected a wave artifact");
        };
        assert_eq!(wave.len(), 44 + pcm.len());
        assert_eq!(&wave[0..4], b"RIFF");
        assert_eq!(&wave[4..8], &136u32.to_le_bytes());
        assert_eq!(&wave[8..16], b"WAVEfmt ");
        assert_eq!(&wave[16..20], &16u32.to_le_bytes());
        assert_eq!(&wave[20..36], &format_ex[..16]);
        assert_eq!(&wave[36..40], b"data");
        assert_eq!(&wave[40..44], &100u32.to_le_bytes());
        assert_eq!(&wave[44..], &pcm[..]);
    }

    #[test]
    fn test_video() {
        let mut w = Writer::new();
        w.write_string("intro.wmv");
        w.write_i32(12_000);
        w.write_i32(1280);
        w.write_i32(720);
        w.write_f32(29.97);
        w.write_i32(2);
        let value = decode_video(&mut Reader::new(w.as_bytes())).unwrap();
        assert_eq!(value.get("soundtrack_type").and_then(Value::as_str), Some("MusicAndDialog"));
        assert_eq!(value.get("width").and_then(Value::as_i64), Some(1280));
    }

    #[test]
    fn test_video_bad_soundtrack() {
        let mut w = Writer::new();
        w.write_string("intro.wmv");
        for v in [0, 0, 0] {
            w.write_i32(v);
        }
        w.write_f32(0.0);
        w.write_i32(3);
        let err = decode_video(&mut Reader::new(w.as_bytes())).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidEnum { field: "soundtrack_type", value: 3 }));
    }
}
