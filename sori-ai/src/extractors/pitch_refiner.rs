//! Voice Quality Refinement (Optional)
//!
//! Harmonics-to-noise ratio and jitter need a periodicity analysis that the
//! built-in DSP does not attempt. When the Praat phonetics program is
//! installed, it is run on a temporary WAV file to measure both; otherwise the
//! null refiner reports the capability as unavailable and the extractor keeps
//! its default values.
//!
//! # Requirements
//! - `praat` on `PATH` (checked once, at construction)
//! - Temporary file system access for the WAV and script files
//!
//! # Installation
//! ```bash
//! # Ubuntu/Debian
//! sudo apt-get install praat
//!
//! # macOS
//! brew install --cask praat
//! ```

use crate::types::ExtractionError;
use crate::utils::encode_wav_16bit;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Praat command name
const PRAAT_COMMAND: &str = "praat";

/// Measures HNR (cross-correlation harmonicity, 75 Hz floor) and local jitter
/// (periodic point process, 75-500 Hz) and prints both on one line.
const PRAAT_SCRIPT: &str = r#"form Voice quality
    sentence wavPath
endform
sound = Read from file: wavPath$
harmonicity = To Harmonicity (cc): 0.01, 75, 0.1, 1.0
hnr = Get mean: 0, 0
selectObject: sound
pointProcess = To PointProcess (periodic, cc): 75, 500
jitter = Get jitter (local): 0, 0, 0.0001, 0.02, 1.3
writeInfoLine: hnr, " ", jitter
"#;

/// Refined voice quality measurements
///
/// Either field may be missing when the analysis was undefined (unvoiced clip).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoiceQuality {
    /// Harmonics-to-noise ratio (dB)
    pub hnr: Option<f64>,
    /// Local jitter (fraction)
    pub jitter: Option<f64>,
}

/// Capability for refining harmonicity and jitter
pub trait PitchRefiner: Send + Sync {
    /// Refiner name for logging
    fn name(&self) -> &'static str;

    /// Measure voice quality of mono samples
    ///
    /// # Errors
    /// `NotAvailable` when the capability is missing; any other error means
    /// the measurement failed for this clip.
    fn refine(&self, samples: &[f32], sample_rate: u32) -> Result<VoiceQuality, ExtractionError>;
}

/// Refiner used when no periodicity analyzer is installed
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPitchRefiner;

impl PitchRefiner for NullPitchRefiner {
    fn name(&self) -> &'static str {
        "null"
    }

    fn refine(&self, _samples: &[f32], _sample_rate: u32) -> Result<VoiceQuality, ExtractionError> {
        Err(ExtractionError::NotAvailable(
            "No voice quality analyzer installed".to_string(),
        ))
    }
}

/// Pick the best refiner available on this host
pub fn detect_refiner() -> Box<dyn PitchRefiner> {
    match PraatRefiner::locate() {
        Some(refiner) => Box::new(refiner),
        None => Box::new(NullPitchRefiner),
    }
}

/// Temporary file removed on drop
///
/// Removal failures are logged, never propagated.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn create(extension: &str, contents: &[u8]) -> Result<Self, ExtractionError> {
        let path = std::env::temp_dir().join(format!(
            "sori_{}.{}",
            uuid::Uuid::new_v4(),
            extension
        ));
        std::fs::write(&path, contents)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove temporary file");
            }
        }
    }
}

/// Praat-backed refiner
#[derive(Debug, Clone)]
pub struct PraatRefiner {
    executable: PathBuf,
}

impl PraatRefiner {
    /// Locate `praat` on `PATH`
    pub fn locate() -> Option<Self> {
        let found = which::which(PRAAT_COMMAND).ok();
        debug!(
            command = PRAAT_COMMAND,
            available = found.is_some(),
            "Praat availability check"
        );
        found.map(Self::with_executable)
    }

    /// Use an explicit executable path
    pub fn with_executable(executable: PathBuf) -> Self {
        Self { executable }
    }
}

impl PitchRefiner for PraatRefiner {
    fn name(&self) -> &'static str {
        "praat"
    }

    fn refine(&self, samples: &[f32], sample_rate: u32) -> Result<VoiceQuality, ExtractionError> {
        let wav = encode_wav_16bit(samples, sample_rate)
            .map_err(|e| ExtractionError::Internal(format!("Failed to encode WAV: {}", e)))?;

        let audio = TempFile::create("wav", &wav)?;
        let script = TempFile::create("praat", PRAAT_SCRIPT.as_bytes())?;

        let output = Command::new(&self.executable)
            .arg("--run")
            .arg(script.path())
            .arg(audio.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ExtractionError::Internal(format!("Failed to execute Praat: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Internal(format!(
                "Praat command failed: {}",
                stderr.trim()
            )));
        }

        let quality = parse_praat_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!(hnr = ?quality.hnr, jitter = ?quality.jitter, "Praat voice quality");
        Ok(quality)
    }
}

/// Parse `"<hnr> <jitter>"`; Praat prints `--undefined--` for unvoiced input
fn parse_praat_output(stdout: &str) -> Result<VoiceQuality, ExtractionError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ExtractionError::Parse("Praat produced no output".to_string()))?;

    let mut fields = line.split_whitespace();
    let (Some(hnr), Some(jitter)) = (fields.next(), fields.next()) else {
        return Err(ExtractionError::Parse(format!(
            "Unexpected Praat output: {}",
            line
        )));
    };

    let parse = |field: &str| field.parse::<f64>().ok().filter(|v| v.is_finite());

    Ok(VoiceQuality {
        hnr: parse(hnr),
        jitter: parse(jitter).filter(|v| *v >= 0.0),
    })
}
