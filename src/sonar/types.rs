use serde::Deserialize;
use std::path::PathBuf;

/// A single tone generated from (or recovered as) one byte of input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Frequency in Hz
    pub frequency: f64,
    /// Amplitude in the [0, 1] range
    pub amplitude: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Byte that produced this tone; only known on the encode side
    pub source_byte: Option<u8>,
}

/// Ordered sequence of samples for one partition.
///
/// Order defines both playback order and byte order. A stream is built once,
/// either by the forward codec (one sample per input byte) or by a reader,
/// and is not modified afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStream {
    samples: Vec<Sample>,
}

/// Summary statistics over a sample stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamStats {
    pub count: usize,
    pub average_frequency: f64,
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub average_amplitude: f64,
    pub min_amplitude: f64,
    pub max_amplitude: f64,
    /// Total duration in seconds
    pub total_duration: f64,
}

impl SampleStream {
    pub fn new(samples: Vec<Sample>) -> Self {
        SampleStream { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Computes summary statistics, or `None` for an empty stream.
    pub fn stats(&self) -> Option<StreamStats> {
        if self.samples.is_empty() {
            return None;
        }

        let mut stats = StreamStats {
            count: self.samples.len(),
            average_frequency: 0.0,
            min_frequency: f64::INFINITY,
            max_frequency: f64::NEG_INFINITY,
            average_amplitude: 0.0,
            min_amplitude: f64::INFINITY,
            max_amplitude: f64::NEG_INFINITY,
            total_duration: 0.0,
        };

        for sample in &self.samples {
            stats.average_frequency += sample.frequency;
            stats.average_amplitude += sample.amplitude;
            stats.total_duration += sample.duration;
            stats.min_frequency = stats.min_frequency.min(sample.frequency);
            stats.max_frequency = stats.max_frequency.max(sample.frequency);
            stats.min_amplitude = stats.min_amplitude.min(sample.amplitude);
            stats.max_amplitude = stats.max_amplitude.max(sample.amplitude);
        }

        stats.average_frequency /= stats.count as f64;
        stats.average_amplitude /= stats.count as f64;
        Some(stats)
    }
}

impl<'a> IntoIterator for &'a SampleStream {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

impl FromIterator<Sample> for SampleStream {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        SampleStream {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Configuration for the forward (byte to audio) direction
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Frequency assigned to byte 0 (Hz)
    pub base_frequency: f64,
    /// Width of the frequency band; byte 255 maps to base + range (Hz)
    pub frequency_range: f64,
    /// Duration of each byte's tone in seconds
    pub sample_duration: f64,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        EncodeConfig {
            sample_rate: 44100,
            base_frequency: 220.0,
            frequency_range: 2000.0,
            sample_duration: 0.05,
        }
    }
}

impl EncodeConfig {
    /// Validates the configuration before any encoding work is done
    ///
    /// # Returns
    /// * `Ok(())` if the configuration is valid
    /// * `Err(SonarError::InvalidConfig)` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SonarError::InvalidConfig(
                "Sample rate must be positive".to_string(),
            ));
        }
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
        if !(self.sample_duration > 0.0) {
            return Err(SonarError::InvalidConfig(format!(
                "Sample duration must be positive (got {:.3}s)",
                self.sample_duration
            )));
        }
        Ok(())
    }

    /// Highest frequency a byte can map to
    pub fn max_frequency(&self) -> f64 {
        self.base_frequency + self.frequency_range
    }

    /// Number of PCM frames rendered for each sample
    pub fn frames_per_sample(&self) -> usize {
        frames_for(self.sample_duration, self.sample_rate)
    }
}

/// Number of whole PCM frames covering `duration` seconds at `sample_rate`.
pub(crate) fn frames_for(duration: f64, sample_rate: u32) -> usize {
    (duration * sample_rate as f64).floor() as usize
}

/// Errors that can occur while encoding or reconstructing data
#[derive(Debug, thiserror::Error)]
pub enum SonarError {
    /// IO errors when reading/writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A WAV container that is not canonical 16-bit PCM
    #[error("WAV format error: {0}")]
    WavFormat(String),

    /// A sidecar artifact that cannot be parsed as a whole
    #[error("Format error: {0}")]
    Format(String),

    /// An artifact that parsed but yielded no usable samples
    #[error("No valid samples found in {path:?}")]
    NoSamples { path: PathBuf },

    /// None of the artifacts for a partition could be used
    #[error("No usable SONAR artifacts for partition {partition}")]
    MissingArtifacts { partition: usize },

    /// Requested partition does not exist
    #[error("Partition {index} out of range (partition count {count})")]
    PartitionOutOfRange { index: usize, count: usize },

    /// Errors reported by a rendering backend
    #[error("Render backend error: {0}")]
    Backend(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SonarError>;
