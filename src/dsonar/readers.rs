use super::reverse::{accept_estimate, estimate_frequency, frequency_to_byte};
use super::types::{DecodeConfig, ReconstructedByte, ReconstructionResult, SourceKind};
use crate::sonar::{
    read_wav_file, MetadataSample, Result, SonarError, CSV_HEADER, REPORT_DATA_SECTION,
};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Builds a result from recovered bytes, failing if there are none.
fn finish(
    source: SourceKind,
    path: &Path,
    samples: Vec<ReconstructedByte>,
    total_samples: usize,
    successful_samples: usize,
) -> Result<ReconstructionResult> {
    if samples.is_empty() {
        return Err(SonarError::NoSamples {
            path: path.to_path_buf(),
        });
    }

    let average_confidence =
        samples.iter().map(|s| s.confidence).sum::<f64>() / samples.len() as f64;

    info!(
        "Reconstructed {} bytes from {} ({}), average confidence {:.3}",
        samples.len(),
        path.display(),
        source,
        average_confidence
    );

    Ok(ReconstructionResult {
        source,
        samples,
        total_samples,
        successful_samples,
        average_confidence,
    })
}

/// Parses one CSV data row into (byte, frequency, amplitude).
fn parse_csv_row(line: &str) -> Option<(u8, f64, f64)> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return None;
    }

    fields[0].parse::<usize>().ok()?;
    let byte = fields[2].parse::<u8>().ok()?;
    let frequency = fields[3].parse::<f64>().ok()?;
    let amplitude = fields[4].parse::<f64>().ok()?;
    fields[5].parse::<f64>().ok()?;
    Some((byte, frequency, amplitude))
}

/// Reconstructs bytes from CSV text.
///
/// The decimal byte column is taken as-is, so CSV is lossless. The stored
/// amplitude doubles as the confidence figure. Rows that do not split into
/// exactly six valid fields are skipped with a warning.
pub fn parse_csv(content: &str, path: &Path) -> Result<ReconstructionResult> {
    let mut lines = content.lines();
    match lines.next() {
        Some(header) if header.trim() == CSV_HEADER => {}
        Some(header) => warn!("Unexpected CSV header in {}: {}", path.display(), header),
        None => {
            return Err(SonarError::Format(format!(
                "Missing CSV header in {}",
                path.display()
            )))
        }
    }

    let mut samples = Vec::new();
    let mut total_samples = 0;

    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        total_samples += 1;

        match parse_csv_row(line) {
            Some((value, frequency, amplitude)) => samples.push(ReconstructedByte {
                value,
                source_frequency: frequency,
                confidence: amplitude.clamp(0.0, 1.0),
                position: samples.len(),
            }),
            None => warn!("Could not parse CSV line {}: {}", line_no + 2, line),
        }
    }

    let successful = samples.len();
    finish(SourceKind::Csv, path, samples, total_samples, successful)
}

/// Parses a `0xXX` byte label.
fn parse_hex_byte(label: &str) -> Option<u8> {
    let digits = label
        .trim()
        .strip_prefix("0x")
        .or_else(|| label.trim().strip_prefix("0X"))?;
    u8::from_str_radix(digits, 16).ok()
}

/// Reconstructs bytes from JSON metadata text.
///
/// Each entry of the `samples` array is read as a whole object, so its byte
/// label and frequency are always paired correctly. The byte is recomputed
/// from the frequency; agreement with the stored label earns the `json_match`
/// confidence, anything else `json_mismatch`. Entries without a numeric
/// frequency are skipped.
pub fn parse_json(
    content: &str,
    path: &Path,
    config: &DecodeConfig,
) -> Result<ReconstructionResult> {
    config.validate()?;
    let document: serde_json::Value = serde_json::from_str(content)?;
    let entries = document
        .get("samples")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| {
            SonarError::Format(format!("No samples array in {}", path.display()))
        })?;

    let weights = &config.weights;
    let mut samples = Vec::with_capacity(entries.len());
    let mut successful = 0;

    for (index, entry) in entries.iter().enumerate() {
        let parsed: MetadataSample = match serde_json::from_value(entry.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping JSON sample {}: {}", index, e);
                continue;
            }
        };

        let value = frequency_to_byte(parsed.frequency, config);
        let stored = parsed.byte.as_deref().and_then(parse_hex_byte);
        let confidence = if stored == Some(value) {
            weights.json_match
        } else {
            weights.json_mismatch
        };
        if confidence > weights.json_threshold {
            successful += 1;
        }

        samples.push(ReconstructedByte {
            value,
            source_frequency: parsed.frequency,
            confidence,
            position: samples.len(),
        });
    }

    finish(SourceKind::Json, path, samples, entries.len(), successful)
}

/// Parses one report row of the form `0x48\t784.71\t\t0.354\t0.050`.
fn parse_report_row(line: &str) -> Option<f64> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return None;
    }
    parse_hex_byte(fields[0])?;
    let frequency = fields[1].parse::<f64>().ok()?;
    fields[2].parse::<f64>().ok()?;
    fields[3].parse::<f64>().ok()?;
    Some(frequency)
}

/// Reconstructs bytes from an analysis report.
///
/// Scans for the "Detailed Sample Data" section, skips its column header and
/// separator lines, then reads one row per sample. Bytes are recomputed from
/// the frequency column.
pub fn parse_report(
    content: &str,
    path: &Path,
    config: &DecodeConfig,
) -> Result<ReconstructionResult> {
    config.validate()?;
    let mut lines = content.lines();
    if !lines.any(|line| line.contains(REPORT_DATA_SECTION)) {
        return Err(SonarError::Format(format!(
            "No '{}' section in {}",
            REPORT_DATA_SECTION,
            path.display()
        )));
    }

    let weights = &config.weights;
    let mut samples = Vec::new();
    let mut total_samples = 0;
    let mut successful = 0;

    // column header and separator
    for line in lines.skip(2) {
        if line.trim_end().len() <= 10 {
            continue;
        }
        total_samples += 1;

        let Some(frequency) = parse_report_row(line) else {
            warn!("Could not parse report line: {}", line);
            continue;
        };

        if weights.report > weights.report_threshold {
            successful += 1;
        }
        samples.push(ReconstructedByte {
            value: frequency_to_byte(frequency, config),
            source_frequency: frequency,
            confidence: weights.report,
            position: samples.len(),
        });
    }

    finish(SourceKind::Report, path, samples, total_samples, successful)
}

/// Reconstructs bytes from a mono 16-bit PCM buffer by zero-crossing analysis.
///
/// The buffer is cut into consecutive windows of `config.window_frames()`
/// frames (a trailing partial window is ignored). Windows without an in-band
/// estimate, or rejected in strict mode, are dropped rather than guessed.
/// Every accepted byte carries the fixed WAV confidence.
pub fn analyze_pcm(
    pcm: &[i16],
    sample_rate: u32,
    path: &Path,
    config: &DecodeConfig,
) -> Result<ReconstructionResult> {
    config.validate()?;
    let window_frames = config.window_frames();
    let confidence = config.weights.wav;
    let mut samples = Vec::new();

    for (window_index, window) in pcm.chunks_exact(window_frames).enumerate() {
        let Some(frequency) = estimate_frequency(window, sample_rate) else {
            debug!("No frequency detected in window {}", window_index);
            continue;
        };
        if !accept_estimate(frequency, config) {
            debug!(
                "Window {} estimate {:.2} Hz rejected in strict mode",
                window_index, frequency
            );
            continue;
        }

        samples.push(ReconstructedByte {
            value: frequency_to_byte(frequency, config),
            source_frequency: frequency,
            confidence,
            position: samples.len(),
        });
    }

    let detected = samples.len();
    let mut result = finish(SourceKind::Wav, path, samples, detected, detected)?;
    // every byte carries the same figure; avoid summation drift
    result.average_confidence = confidence;
    Ok(result)
}

pub fn reconstruct_from_csv(path: &Path) -> Result<ReconstructionResult> {
    info!("Reading frequency data from CSV file {}", path.display());
    parse_csv(&fs::read_to_string(path)?, path)
}

pub fn reconstruct_from_json(path: &Path, config: &DecodeConfig) -> Result<ReconstructionResult> {
    info!("Parsing JSON metadata {}", path.display());
    parse_json(&fs::read_to_string(path)?, path, config)
}

pub fn reconstruct_from_report(
    path: &Path,
    config: &DecodeConfig,
) -> Result<ReconstructionResult> {
    info!("Parsing analysis report {}", path.display());
    parse_report(&fs::read_to_string(path)?, path, config)
}

/// Reconstructs bytes from a WAV file written by the forward codec.
///
/// # Errors
/// * If the file cannot be read or its header is not canonical 16-bit PCM
/// * If the file is not mono
/// * If no window yields a frequency
pub fn reconstruct_from_wav(path: &Path, config: &DecodeConfig) -> Result<ReconstructionResult> {
    info!("Analyzing WAV file {} for frequency reconstruction", path.display());
    let wav = read_wav_file(path)?;
    if wav.channels != 1 {
        return Err(SonarError::WavFormat(format!(
            "Expected mono audio, found {} channels",
            wav.channels
        )));
    }
    debug!(
        "WAV format: {} Hz, {} channels, {} frames",
        wav.sample_rate,
        wav.channels,
        wav.samples.len()
    );
    analyze_pcm(&wav.samples, wav.sample_rate, path, config)
}

/// Reconstructs bytes from `path`, reading it as `kind`.
pub fn reconstruct_from(
    kind: SourceKind,
    path: &Path,
    config: &DecodeConfig,
) -> Result<ReconstructionResult> {
    match kind {
        SourceKind::Csv => reconstruct_from_csv(path),
        SourceKind::Json => reconstruct_from_json(path, config),
        SourceKind::Wav => reconstruct_from_wav(path, config),
        SourceKind::Report => reconstruct_from_report(path, config),
    }
}
