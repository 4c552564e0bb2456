use super::types::{DecodeConfig, MIN_WINDOW_FRAMES};

/// Lowest frequency the zero-crossing estimator reports (Hz)
pub const MIN_DETECTABLE_HZ: f64 = 200.0;
/// Highest frequency the zero-crossing estimator reports (Hz)
pub const MAX_DETECTABLE_HZ: f64 = 3000.0;

/// Maps a frequency back to the byte that produced it.
///
/// Frequencies below the band clamp to 0, above it to 255; everything else is
/// rounded to the nearest byte, which makes this the exact inverse of the
/// forward mapping.
pub fn frequency_to_byte(frequency: f64, config: &DecodeConfig) -> u8 {
    if frequency < config.base_frequency {
        return 0;
    }
    if frequency > config.base_frequency + config.frequency_range {
        return 255;
    }
    let normalized = (frequency - config.base_frequency) / config.frequency_range;
    (normalized * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Frequency the forward codec assigns to `byte` under this configuration
pub fn byte_frequency(byte: u8, config: &DecodeConfig) -> f64 {
    config.base_frequency + (byte as f64 / 255.0) * config.frequency_range
}

/// Counts sign changes between consecutive samples; zero counts as positive.
pub fn zero_crossings(window: &[i16]) -> usize {
    window
        .windows(2)
        .filter(|pair| (pair[0] >= 0) != (pair[1] >= 0))
        .count()
}

/// Estimates the dominant frequency of a PCM window from its zero-crossing rate.
///
/// `frequency = (crossings / 2) / (window_len / sample_rate)`. Assumes a
/// single dominant tone; the harmonics added at synthesis time bias it.
///
/// # Returns
/// * `Some(frequency)` if the estimate falls within [200, 3000] Hz
/// * `None` for windows that are too short, silent, or out of band
pub fn estimate_frequency(window: &[i16], sample_rate: u32) -> Option<f64> {
    if window.len() < MIN_WINDOW_FRAMES || sample_rate == 0 {
        return None;
    }

    let crossings = zero_crossings(window);
    if crossings == 0 {
        return None;
    }

    let duration = window.len() as f64 / sample_rate as f64;
    let frequency = (crossings as f64 / 2.0) / duration;
    (MIN_DETECTABLE_HZ..=MAX_DETECTABLE_HZ)
        .contains(&frequency)
        .then_some(frequency)
}

/// Whether a WAV estimate should be kept under `config`.
///
/// Flexible mode keeps every in-band estimate. Strict mode keeps it only if it
/// lies within `tolerance` Hz of the frequency of the byte it maps to.
pub fn accept_estimate(frequency: f64, config: &DecodeConfig) -> bool {
    if !config.strict_mode {
        return true;
    }
    let nearest = byte_frequency(frequency_to_byte(frequency, config), config);
    (frequency - nearest).abs() <= config.tolerance
}

/// Fraction of positions where both slices agree, over the shorter length.
///
/// Returns 0.0 when either slice is empty.
pub fn reconstruction_accuracy(original: &[u8], reconstructed: &[u8]) -> f64 {
    let length = original.len().min(reconstructed.len());
    if length == 0 {
        return 0.0;
    }
    let matches = original
        .iter()
        .zip(reconstructed)
        .filter(|(a, b)| a == b)
        .count();
    matches as f64 / length as f64
}
