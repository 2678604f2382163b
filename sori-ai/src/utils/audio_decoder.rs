//! Audio Decoding Utilities
//!
//! **Purpose:** Decode in-memory journal recordings to mono f32 PCM, resample
//! them to an analysis rate, and re-encode them as 16-bit WAV.
//!
//! Uses symphonia for format-agnostic decoding (WAV, MP3, OGG, FLAC, AAC, ...)
//! and rubato for resampling. The container is sniffed from magic bytes with
//! `infer` since browser recordings arrive without a file name.

use anyhow::{anyhow, Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio result
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count
    pub channels: usize,
}

impl DecodedAudio {
    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio buffer to mono f32 PCM samples
///
/// **Algorithm:**
/// 1. Sniff the container from magic bytes for a probe hint
/// 2. Probe format and find the first audio track
/// 3. Decode all packets, skipping corrupt ones
/// 4. Average channels to mono
///
/// # Errors
/// * Unsupported or unrecognized format
/// * No audio track
/// * No decodable samples
pub fn decode_audio_bytes(bytes: &[u8]) -> Result<DecodedAudio> {
    if bytes.is_empty() {
        return Err(anyhow!("Audio buffer is empty"));
    }

    let mut hint = Hint::new();
    if let Some(kind) = infer::get(bytes) {
        tracing::debug!(mime = kind.mime_type(), "Sniffed audio container");
        hint.with_extension(kind.extension());
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio buffer")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.context("Sample rate unknown")?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1)
        .max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut mono: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(anyhow!("Error reading packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => {
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(anyhow!("Failed to decode packet: {}", e)),
        };

        let spec = *decoded.spec();
        let frame_channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        mono.extend(
            buffer
                .samples()
                .chunks_exact(frame_channels)
                .map(|frame| frame.iter().sum::<f32>() / frame_channels as f32),
        );
    }

    if mono.is_empty() {
        return Err(anyhow!("No decodable audio samples"));
    }

    tracing::debug!(
        sample_rate,
        channels,
        total_samples = mono.len(),
        skipped_packets,
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: mono,
        sample_rate,
        channels,
    })
}

/// Resample mono samples with rubato SincFixedIn
///
/// Returns the input unchanged when the rates already match.
pub fn resample_mono(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if source_rate == 0 || target_rate == 0 {
        return Err(anyhow!("Invalid sample rate {} -> {}", source_rate, target_rate));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / source_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .context("Failed to create rubato resampler")?;

    let mut output = resampler
        .process(&[samples.to_vec()], None)
        .context("Rubato resampling failed")?;

    tracing::debug!(
        source_rate,
        target_rate,
        input_samples = samples.len(),
        "Resampled audio"
    );

    Ok(output.pop().unwrap_or_default())
}

/// Decode and resample to the requested rate in one step
pub fn decode_mono_at(bytes: &[u8], target_rate: u32) -> Result<DecodedAudio> {
    let decoded = decode_audio_bytes(bytes)?;
    let samples = resample_mono(&decoded.samples, decoded.sample_rate, target_rate)?;
    Ok(DecodedAudio {
        samples,
        sample_rate: target_rate,
        channels: decoded.channels,
    })
}

/// Encode mono samples as a 16-bit PCM WAV buffer
pub fn encode_wav_16bit(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value).context("Failed to write WAV sample")?;
        }
        writer.finalize().context("Failed to finalize WAV")?;
    }
    Ok(cursor.into_inner())
}

// ============================================================================
// Tests
// ============================================================================
