use crate::sonar::{Result, SonarError};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Kind of artifact a reconstruction was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Json,
    Wav,
    Report,
}

impl SourceKind {
    /// Probe order used when no format is forced: most exact source first.
    pub const PRIORITY: [SourceKind; 4] = [
        SourceKind::Csv,
        SourceKind::Json,
        SourceKind::Wav,
        SourceKind::Report,
    ];

    /// Guesses the artifact kind from a file name.
    pub fn detect(path: &Path) -> Option<SourceKind> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".csv") {
            Some(SourceKind::Csv)
        } else if name.ends_with(".json") {
            Some(SourceKind::Json)
        } else if name.ends_with(".wav") {
            Some(SourceKind::Wav)
        } else if name.ends_with(".txt") {
            Some(SourceKind::Report)
        } else {
            None
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Csv => "csv",
            SourceKind::Json => "json",
            SourceKind::Wav => "wav",
            SourceKind::Report => "report",
        };
        f.write_str(name)
    }
}

/// Which artifact the pipeline should read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredFormat {
    /// Probe every kind in [`SourceKind::PRIORITY`] order
    #[default]
    Auto,
    Wav,
    Csv,
    Json,
    Report,
}

impl PreferredFormat {
    /// Source kinds to try, in order
    pub fn candidates(self) -> Vec<SourceKind> {
        match self {
            PreferredFormat::Auto => SourceKind::PRIORITY.to_vec(),
            PreferredFormat::Wav => vec![SourceKind::Wav],
            PreferredFormat::Csv => vec![SourceKind::Csv],
            PreferredFormat::Json => vec![SourceKind::Json],
            PreferredFormat::Report => vec![SourceKind::Report],
        }
    }
}

impl std::str::FromStr for PreferredFormat {
    type Err = SonarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(PreferredFormat::Auto),
            "wav" => Ok(PreferredFormat::Wav),
            "csv" => Ok(PreferredFormat::Csv),
            "json" => Ok(PreferredFormat::Json),
            "report" | "analysis" | "txt" => Ok(PreferredFormat::Report),
            other => Err(SonarError::InvalidConfig(format!(
                "Unknown input format '{}' (expected auto, wav, csv, json or report)",
                other
            ))),
        }
    }
}

/// Confidence figures assigned per source, and the thresholds above which a
/// sample counts as successful
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    /// JSON entry whose stored byte agrees with the frequency
    pub json_match: f64,
    /// JSON entry whose stored byte is missing or disagrees
    pub json_mismatch: f64,
    pub report: f64,
    pub wav: f64,
    pub json_threshold: f64,
    pub report_threshold: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        ConfidenceWeights {
            json_match: 1.0,
            json_mismatch: 0.8,
            report: 0.85,
            wav: 0.7,
            json_threshold: 0.5,
            report_threshold: 0.6,
        }
    }
}

/// Configuration for the reverse (audio to byte) direction.
///
/// `base_frequency` and `frequency_range` must match the values used to
/// encode the artifacts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    pub base_frequency: f64,
    pub frequency_range: f64,
    /// Distance (Hz) a WAV estimate may sit from a byte's frequency in strict mode
    pub tolerance: f64,
    /// Only accept WAV estimates close to a byte frequency
    pub strict_mode: bool,
    pub preferred_format: PreferredFormat,
    /// Zero-crossing window length in seconds at the base-frequency reference;
    /// the window spans `base_frequency * window_duration` PCM frames
    pub window_duration: f64,
    pub weights: ConfidenceWeights,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            base_frequency: 220.0,
            frequency_range: 2000.0,
            tolerance: 5.0,
            strict_mode: false,
            preferred_format: PreferredFormat::Auto,
            window_duration: 0.05,
            weights: ConfidenceWeights::default(),
        }
    }
}

/// Shortest window the zero-crossing estimator accepts
pub const MIN_WINDOW_FRAMES: usize = 10;

impl DecodeConfig {
    /// Validates the configuration before any decoding work is done
    pub fn validate(&self) -> Result<()> {
        if !(self.base_frequency > 0.0) {
            return Err(SonarError::InvalidConfig(format!(
                "Base frequency must be positive (got {:.2}Hz)",
                self.base_frequency
            )));
        }
        if !(self.frequency_range > 0.0) {
            return Err(SonarError::InvalidConfig(format!(
                "Frequency range must be positive (got {:.2}Hz)",
                self.frequency_range
            )));
        }
        if !(self.tolerance >= 0.0) {
            return Err(SonarError::InvalidConfig(format!(
                "Tolerance must not be negative (got {:.2}Hz)",
                self.tolerance
            )));
        }
        if self.window_frames() < MIN_WINDOW_FRAMES {
            return Err(SonarError::InvalidConfig(format!(
                "Zero-crossing window of {} frames is too short (minimum {})",
                self.window_frames(),
                MIN_WINDOW_FRAMES
            )));
        }
        Ok(())
    }

    /// Length in PCM frames of each zero-crossing analysis window
    pub fn window_frames(&self) -> usize {
        (self.base_frequency * self.window_duration) as usize
    }
}

/// One recovered byte and how it was obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructedByte {
    pub value: u8,
    /// Frequency the byte was derived from (Hz)
    pub source_frequency: f64,
    /// Heuristic quality label in [0, 1]; not a probability
    pub confidence: f64,
    /// Position in the recovered sequence
    pub position: usize,
}

/// Bytes recovered from a single artifact, with quality figures
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionResult {
    pub source: SourceKind,
    pub samples: Vec<ReconstructedByte>,
    /// Records considered, including ones that were skipped
    pub total_samples: usize,
    /// Records whose confidence cleared the source's threshold
    pub successful_samples: usize,
    pub average_confidence: f64,
}

impl ReconstructionResult {
    /// Recovered bytes in order
    pub fn bytes(&self) -> Vec<u8> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn data_length(&self) -> usize {
        self.samples.len()
    }

    /// Percentage of records that were reconstructed successfully
    pub fn success_rate(&self) -> f64 {
        if self.total_samples == 0 {
            0.0
        } else {
            self.successful_samples as f64 * 100.0 / self.total_samples as f64
        }
    }

    /// Multi-line human-readable summary of the reconstruction
    pub fn summary(&self, source_path: &Path) -> String {
        let preview = self
            .samples
            .iter()
            .take(10)
            .map(|s| format!("0x{:02X}", s.value))
            .collect::<Vec<String>>()
            .join(" ");

        format!(
            "Source file: {} ({})\n\
             Reconstructed {} bytes from {} samples\n\
             Success rate: {}/{} ({:.1}%)\n\
             Average confidence: {:.3}\n\
             First 10 reconstructed bytes: {}",
            source_path.display(),
            self.source,
            self.data_length(),
            self.total_samples,
            self.successful_samples,
            self.total_samples,
            self.success_rate(),
            self.average_confidence,
            preview
        )
    }
}
