use super::types::{frames_for, EncodeConfig, Result, Sample, SampleStream};
use std::f64::consts::PI;

/// Peak scale applied to the summed waveform so the harmonics do not clip.
const HEADROOM: f64 = 32767.0 * 0.8;

/// Relative weights of the fundamental, 2nd and 3rd harmonic.
const HARMONICS: [(f64, f64); 3] = [(1.0, 1.0), (2.0, 0.3), (3.0, 0.1)];

/// Fraction of each tone spent in the attack ramp, and again in the decay ramp.
const RAMP_FRACTION: f64 = 0.1;

/// Maps a byte linearly into the configured frequency band.
///
/// Byte 0 lands on `base_frequency`, byte 255 on `base_frequency + frequency_range`.
pub fn byte_to_frequency(byte: u8, config: &EncodeConfig) -> f64 {
    config.base_frequency + (byte as f64 / 255.0) * config.frequency_range
}

/// Maps a byte to an amplitude in [0.1, 1.0]; never zero so a zero byte is
/// still audible.
pub fn byte_to_amplitude(byte: u8) -> f64 {
    0.1 + (byte as f64 / 255.0) * 0.9
}

/// Converts a single byte into a tone.
///
/// The duration comes straight from the configuration; the sample rate is
/// only used later, at synthesis time.
pub fn byte_to_sample(byte: u8, config: &EncodeConfig) -> Sample {
    Sample {
        frequency: byte_to_frequency(byte, config),
        amplitude: byte_to_amplitude(byte),
        duration: config.sample_duration,
        source_byte: Some(byte),
    }
}

/// Converts a partition's bytes into a sample stream, one sample per byte.
///
/// # Errors
/// * If the configuration is invalid (checked before any work is done)
pub fn encode_bytes(bytes: &[u8], config: &EncodeConfig) -> Result<SampleStream> {
    config.validate()?;
    Ok(bytes.iter().map(|&b| byte_to_sample(b, config)).collect())
}

/// Attack/sustain/decay envelope for frame `i` of a tone lasting `frames` frames.
///
/// Ramps linearly 0 -> 1 over the first 10%, holds at 1, then ramps 1 -> 0
/// over the last 10%.
pub fn envelope(i: usize, frames: usize) -> f64 {
    let ramp = frames as f64 * RAMP_FRACTION;
    if ramp <= 0.0 {
        return 1.0;
    }

    let pos = i as f64;
    if pos < ramp {
        pos / ramp
    } else if pos > frames as f64 - ramp {
        (1.0 - (pos - (frames as f64 - ramp)) / ramp).max(0.0)
    } else {
        1.0
    }
}

/// Built-in PCM synthesizer.
///
/// Renders each sample as a fundamental plus 2nd and 3rd harmonics, shaped
/// by [`envelope`]. Phase is carried across samples so consecutive tones join
/// without a discontinuity.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    sample_rate: u32,
    gain: f64,
}

impl Synthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Synthesizer {
            sample_rate,
            gain: 1.0,
        }
    }

    /// Sets a gain applied to every amplitude, clamped to [0, 1].
    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain.clamp(0.0, 1.0);
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total number of frames [`render`](Self::render) produces for `stream`
    pub fn frame_count(&self, stream: &SampleStream) -> usize {
        stream
            .iter()
            .map(|s| frames_for(s.duration, self.sample_rate))
            .sum()
    }

    /// Renders the whole stream into signed 16-bit mono PCM.
    pub fn render(&self, stream: &SampleStream) -> Vec<i16> {
        let rate = self.sample_rate as f64;
        let mut pcm = Vec::with_capacity(self.frame_count(stream));
        let mut phase = 0.0;

        for sample in stream {
            let frames = frames_for(sample.duration, self.sample_rate);
            let amplitude = sample.amplitude * self.gain;

            for i in 0..frames {
                let t = i as f64 / rate;
                let wave: f64 = HARMONICS
                    .iter()
                    .map(|&(multiple, weight)| {
                        weight * (2.0 * PI * sample.frequency * multiple * t + phase).sin()
                    })
                    .sum();

                let value = amplitude * envelope(i, frames) * wave * HEADROOM;
                pcm.push(value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16);
            }

            phase = (phase + 2.0 * PI * sample.frequency * sample.duration) % (2.0 * PI);
        }

        pcm
    }
}

/// Renders `stream` at the configured sample rate with unity gain.
pub fn synthesize(stream: &SampleStream, config: &EncodeConfig) -> Result<Vec<i16>> {
    config.validate()?;
    Ok(Synthesizer::new(config.sample_rate).render(stream))
}
