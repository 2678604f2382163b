//! Prosody Feature Extractor
//!
//! Decodes one journal recording and computes the raw acoustic measurements
//! used for voice cues: energy, tempo, zero-crossing rate, spectral centroid,
//! pitch, and (when a refiner is installed) harmonicity and jitter.
//!
//! # Architecture
//! Extraction never fails. A recording that cannot be decoded, or whose
//! mandatory measurements are not finite, yields the default record. Optional
//! measurements that cannot be computed keep their individual defaults:
//! - tempo below [`ProsodyParams::min_tempo_secs`] of audio
//! - pitch below [`ProsodyParams::min_pitch_secs`] of audio or with no voiced frame
//! - HNR and jitter when no refiner is available or it fails

use crate::extractors::pitch_refiner::{NullPitchRefiner, PitchRefiner};
use crate::extractors::signal::{
    estimate_tempo, frame_rms, mean, onset_envelope, pitch_track, spectral_centroid, std_dev,
    zero_crossing_rate, Spectrogram,
};
use crate::types::{ExtractionError, RawAudioFeatures};
use crate::utils::decode_mono_at;
use tracing::{debug, warn};

/// Analysis parameters
#[derive(Debug, Clone)]
pub struct ProsodyParams {
    /// Rate recordings are resampled to before analysis (Hz)
    pub sample_rate: u32,
    pub rms_frame: usize,
    pub rms_hop: usize,
    pub zcr_frame: usize,
    pub zcr_hop: usize,
    pub n_fft: usize,
    pub fft_hop: usize,
    pub pitch_fmin: f64,
    pub pitch_fmax: f64,
    /// Peak threshold relative to the frame maximum
    pub pitch_threshold: f64,
    pub min_pitch_secs: f64,
    pub min_tempo_secs: f64,
}

impl Default for ProsodyParams {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            rms_frame: 2048,
            rms_hop: 512,
            zcr_frame: 1024,
            zcr_hop: 256,
            n_fft: 2048,
            fft_hop: 512,
            pitch_fmin: 50.0,
            pitch_fmax: 400.0,
            pitch_threshold: 0.1,
            min_pitch_secs: 1.0,
            min_tempo_secs: 2.5,
        }
    }
}

/// Extracts [`RawAudioFeatures`] from encoded audio
pub struct ProsodyFeatureExtractor {
    params: ProsodyParams,
    refiner: Box<dyn PitchRefiner>,
}

impl Default for ProsodyFeatureExtractor {
    fn default() -> Self {
        Self::new(ProsodyParams::default(), Box::new(NullPitchRefiner))
    }
}

impl ProsodyFeatureExtractor {
    pub fn new(params: ProsodyParams, refiner: Box<dyn PitchRefiner>) -> Self {
        debug!(
            sample_rate = params.sample_rate,
            refiner = refiner.name(),
            "Prosody extractor configured"
        );
        Self { params, refiner }
    }

    pub fn params(&self) -> &ProsodyParams {
        &self.params
    }

    /// Extract features from an encoded recording; never fails
    pub fn extract(&self, audio: &[u8]) -> RawAudioFeatures {
        let decoded = match decode_mono_at(audio, self.params.sample_rate) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, bytes = audio.len(), "Audio decoding failed, using default features");
                return RawAudioFeatures::default();
            }
        };

        match self.analyze_samples(&decoded.samples) {
            Ok(features) => features,
            Err(e) => {
                warn!(error = %e, "Feature extraction failed, using default features");
                RawAudioFeatures::default()
            }
        }
    }

    /// Compute features from mono samples at the configured rate
    ///
    /// # Errors
    /// `AudioDecode` for an empty signal, `Internal` when a mandatory
    /// measurement is not finite.
    pub fn analyze_samples(&self, samples: &[f32]) -> Result<RawAudioFeatures, ExtractionError> {
        if samples.is_empty() {
            return Err(ExtractionError::AudioDecode("No samples".to_string()));
        }

        let p = &self.params;
        let defaults = RawAudioFeatures::default();
        let duration = (samples.len() as f64 / p.sample_rate as f64).max(0.001);

        let rms = frame_rms(samples, p.rms_frame, p.rms_hop);
        let energy_mean = mean(&rms).unwrap_or(defaults.energy_mean);
        let energy_max = rms.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let energy_max = if energy_max.is_finite() {
            energy_max
        } else {
            defaults.energy_max
        };

        let zcr_mean =
            mean(&zero_crossing_rate(samples, p.zcr_frame, p.zcr_hop)).unwrap_or(defaults.zcr_mean);

        let spec = Spectrogram::compute(samples, p.sample_rate, p.n_fft, p.fft_hop);
        let centroid = mean(&spectral_centroid(&spec)).unwrap_or(defaults.spectral_centroid_mean);

        let tempo = if duration >= p.min_tempo_secs {
            estimate_tempo(&onset_envelope(&spec), spec.frame_rate).unwrap_or(defaults.tempo)
        } else {
            defaults.tempo
        };

        let (pitch_mean, pitch_variation) = if duration >= p.min_pitch_secs {
            let pitches = pitch_track(&spec, p.pitch_fmin, p.pitch_fmax, p.pitch_threshold);
            match (mean(&pitches), std_dev(&pitches)) {
                (Some(m), Some(sd)) if m > 0.0 => (m, sd / (m + 1e-6)),
                _ => (defaults.pitch_mean, defaults.pitch_variation),
            }
        } else {
            (defaults.pitch_mean, defaults.pitch_variation)
        };

        let mut features = RawAudioFeatures {
            duration_sec: duration,
            pitch_mean,
            pitch_variation,
            energy_mean,
            energy_max,
            tempo,
            zcr_mean,
            spectral_centroid_mean: centroid,
            hnr: defaults.hnr,
            jitter: defaults.jitter,
        };

        if !features.is_finite() {
            return Err(ExtractionError::Internal(format!(
                "Non-finite measurement: {:?}",
                features
            )));
        }

        match self.refiner.refine(samples, p.sample_rate) {
            Ok(quality) => {
                if let Some(hnr) = quality.hnr {
                    features.hnr = hnr;
                }
                if let Some(jitter) = quality.jitter {
                    features.jitter = jitter;
                }
            }
            Err(ExtractionError::NotAvailable(_)) => {}
            Err(e) => {
                debug!(refiner = self.refiner.name(), error = %e, "Voice quality refinement skipped");
            }
        }

        debug!(
            duration_sec = features.duration_sec,
            pitch_mean = features.pitch_mean,
            energy_mean = features.energy_mean,
            tempo = features.tempo,
            zcr_mean = features.zcr_mean,
            spectral_centroid = features.spectral_centroid_mean,
            "Extracted prosody features"
        );

        Ok(features)
    }
}

// ============================================================================
// Tests
// ============================================================================
