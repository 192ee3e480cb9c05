//! WAV encoding for provider uploads
//!
//! Capture happens in the host app; the core only receives 16-bit PCM bytes
//! and wraps them for HTTP backends.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{Error, Result};
use crate::types::AudioData;

/// Wrap raw little-endian 16-bit PCM in a WAV container
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    if pcm.len() % 2 != 0 {
        return Err(Error::Audio(format!(
            "PCM data must be 16-bit aligned, got {} bytes",
            pcm.len()
        )));
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len()));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for chunk in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Read a WAV file into mono 16-bit PCM bytes plus its sample rate
///
/// Multi-channel input is downmixed by averaging; float input is rescaled.
pub fn read_wav_file(path: impl AsRef<Path>) -> Result<(AudioData, u32)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<i32> = match spec.sample_format {
        SampleFormat::Int => {
            let shift = i32::from(spec.bits_per_sample).saturating_sub(16);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| if shift > 0 { v >> shift } else { v << -shift }))
                .collect::<std::result::Result<_, _>>()?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i32))
            .collect::<std::result::Result<_, _>>()?,
    };

    let mut pcm = Vec::with_capacity(samples.len() / channels * 2);
    for frame in samples.chunks(channels) {
        let mixed = frame.iter().sum::<i32>() / frame.len() as i32;
        let sample = mixed.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        pcm.extend_from_slice(&sample.to_le_bytes());
    }

    Ok((pcm, spec.sample_rate))
}

/// Duration of mono 16-bit PCM in milliseconds
pub fn estimate_duration_ms(bytes: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    let samples = bytes / 2;
    (samples as u64 * 1000) / u64::from(sample_rate)
}
