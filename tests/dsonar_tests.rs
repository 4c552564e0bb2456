// Reverse codec tests
//
// This file contains tests for recovering bytes from SONAR artifacts.
// It verifies:
// - The frequency to byte mapping and its exact inverse
// - Zero-crossing frequency estimation
// - Strict and flexible acceptance of WAV estimates
// - The CSV, JSON, report and WAV readers and their confidence figures
// - Decode configuration and format selection


use sonar_codec::dsonar::{
    accept_estimate, byte_frequency, estimate_frequency, frequency_to_byte, parse_csv,
    parse_json, parse_report, reconstruct_from_wav, reconstruction_accuracy, zero_crossings,
    ConfidenceWeights, DecodeConfig, PreferredFormat, SourceKind,
};
use sonar_codec::sonar::{
    self, byte_to_frequency, encode_bytes, write_csv, write_json, write_report, write_wav_file,
    EncodeConfig, SonarError,
};
use std::f64::consts::PI;
use std::path::Path;
use test_utils::{approx_eq, scratch_dir, stored_amplitude, EDGE_BYTES, MIXED_PAYLOAD};

/// Render a pure sine at `frequency` Hz for `frames` frames at 44.1kHz.
fn sine(frequency: f64, frames: usize) -> Vec<i16> {
    (0..frames)
        .map(|i| ((2.0 * PI * frequency * i as f64 / 44100.0).sin() * 16000.0).round() as i16)
        .collect()
}

/// Synthesize `bytes` with the default configuration into a WAV file in `dir`.
fn write_encoded_wav(dir: &Path, bytes: &[u8]) -> std::path::PathBuf {
    let config = EncodeConfig::default();
    let stream = encode_bytes(bytes, &config).expect("Failed to encode bytes");
    let pcm = sonar::synthesize(&stream, &config).expect("Failed to synthesize");
    let path = dir.join("encoded.wav");
    write_wav_file(&path, &pcm, config.sample_rate).expect("Failed to write WAV");
    path
}

/// Tests the frequency to byte mapping.
///
/// This test verifies:
/// - Frequencies below the band clamp to 0
/// - Frequencies above the band clamp to 255
/// - In-band frequencies round to the nearest byte
#[test]
fn test_frequency_to_byte_clamping_and_rounding() {
    let config = DecodeConfig::default();

    assert_eq!(frequency_to_byte(100.0, &config), 0);
    assert_eq!(frequency_to_byte(-5.0, &config), 0);
    assert_eq!(frequency_to_byte(5000.0, &config), 255);
    assert_eq!(frequency_to_byte(1223.92, &config), 0x80);

    // 127.6 of 255 steps rounds up
    let between = 220.0 + 127.6 / 255.0 * 2000.0;
    assert_eq!(frequency_to_byte(between, &config), 128);
    let below_half = 220.0 + 127.4 / 255.0 * 2000.0;
    assert_eq!(frequency_to_byte(below_half, &config), 127);
}

/// Tests that mapping every byte forward and back is the identity.
///
/// This test verifies:
/// - Exact round trip for all 256 bytes with the default band
/// - Exact round trip with a custom band
/// - Round trip survives the 2-decimal formatting used by the sidecars
#[test]
fn test_frequency_round_trip_all_bytes() {
    let configs = [
        (EncodeConfig::default(), DecodeConfig::default()),
        (
            EncodeConfig {
                base_frequency: 500.0,
                frequency_range: 1500.0,
                ..EncodeConfig::default()
            },
            DecodeConfig {
                base_frequency: 500.0,
                frequency_range: 1500.0,
                ..DecodeConfig::default()
            },
        ),
    ];

    for (encode, decode) in &configs {
        for byte in 0..=255u8 {
            let frequency = byte_to_frequency(byte, encode);
            assert_eq!(frequency_to_byte(frequency, decode), byte);

            let formatted: f64 = format!("{:.2}", frequency)
                .parse()
                .expect("Formatted frequency should parse");
            assert_eq!(
                frequency_to_byte(formatted, decode),
                byte,
                "Byte {} should survive 2-decimal rounding",
                byte
            );
            assert!(approx_eq(byte_frequency(byte, decode), frequency, 1e-9));
        }
    }
}

/// Tests counting of sign changes.
///
/// This test verifies:
/// - Each sign flip counts once
/// - Zero counts as positive
/// - Constant signals have no crossings
#[test]
fn test_zero_crossings() {
    assert_eq!(zero_crossings(&[1, -1, 1, -1]), 3);
    assert_eq!(zero_crossings(&[0, 0, 0]), 0);
    assert_eq!(zero_crossings(&[-1, 0]), 1);
    assert_eq!(zero_crossings(&[0, 5, 10]), 0);
    assert_eq!(zero_crossings(&[]), 0);
}

/// Tests zero-crossing frequency estimation.
///
/// This test verifies:
/// - A 1000 Hz sine over 0.1s is estimated close to 1000 Hz
/// - Tones below 200 Hz are rejected
/// - Windows shorter than 10 frames are rejected
/// - Silence yields no estimate
#[test]
fn test_estimate_frequency() {
    let estimate = estimate_frequency(&sine(1000.0, 4410), 44100)
        .expect("A 1000 Hz tone should be detected");
    assert!(
        (990.0..=1005.0).contains(&estimate),
        "Estimate {} should be close to 1000 Hz",
        estimate
    );

    assert_eq!(estimate_frequency(&sine(100.0, 4410), 44100), None);
    assert_eq!(estimate_frequency(&[1, -1, 1, -1, 1], 44100), None);
    assert_eq!(estimate_frequency(&[0; 100], 44100), None);
}

/// Tests strict and flexible acceptance of WAV estimates.
///
/// This test verifies:
/// - Flexible mode accepts any in-band estimate
/// - Strict mode accepts an estimate on a byte frequency
/// - Strict mode rejects an estimate further than the tolerance from every byte
#[test]
fn test_strict_mode_acceptance() {
    let flexible = DecodeConfig::default();
    let strict = DecodeConfig {
        strict_mode: true,
        tolerance: 1.0,
        ..DecodeConfig::default()
    };

    let exact = byte_frequency(10, &strict);
    let off_grid = exact + 3.0;

    assert!(accept_estimate(off_grid, &flexible));
    assert!(accept_estimate(exact, &strict));
    assert!(accept_estimate(exact + 0.5, &strict));
    assert!(!accept_estimate(off_grid, &strict));
}

/// Tests that the CSV reader is lossless.
///
/// This test verifies:
/// - Bytes come straight from the decimal column
/// - Each byte's confidence is its stored amplitude
/// - The average confidence is the mean stored amplitude
#[test]
fn test_csv_reconstruction_lossless() {
    let stream = encode_bytes(&EDGE_BYTES, &EncodeConfig::default()).expect("Failed to encode");
    let mut buffer = Vec::new();
    write_csv(&mut buffer, &stream).expect("Failed to write CSV");
    let text = String::from_utf8(buffer).expect("CSV should be UTF-8");

    let result = parse_csv(&text, Path::new("edge.csv")).expect("Failed to parse CSV");
    assert_eq!(result.source, SourceKind::Csv);
    assert_eq!(result.bytes(), EDGE_BYTES.to_vec());
    assert_eq!(result.total_samples, 3);
    assert_eq!(result.successful_samples, 3);

    for (sample, &byte) in result.samples.iter().zip(EDGE_BYTES.iter()) {
        assert_eq!(sample.confidence, stored_amplitude(byte));
    }
    let expected = EDGE_BYTES.iter().map(|&b| stored_amplitude(b)).sum::<f64>() / 3.0;
    assert!(approx_eq(result.average_confidence, expected, 1e-9));
    assert!(approx_eq(result.average_confidence, (0.1 + 0.329 + 1.0) / 3.0, 1e-9));
}

/// Tests that malformed CSV rows are skipped.
///
/// This test verifies:
/// - A row with too few fields is skipped, the others are kept
/// - Skipped rows count towards the total but not the successes
/// - A file with only a header yields NoSamples
#[test]
fn test_csv_malformed_row_skipped() {
    let text = "Sample,Byte_Hex,Byte_Dec,Frequency_Hz,Amplitude,Duration_s\n\
                0,0x00,0,220.00,0.100,0.050\n\
                1,0x41,65,729.80,0.329,0.050\n\
                2,0xFF,255\n\
                3,0xFF,255,2220.00,1.000,0.050\n";

    let result = parse_csv(text, Path::new("bad.csv")).expect("Failed to parse CSV");
    assert_eq!(result.bytes(), vec![0x00, 0x41, 0xFF]);
    assert_eq!(result.data_length(), 3);
    assert_eq!(result.total_samples, 4);
    assert_eq!(result.successful_samples, 3);
    assert!(approx_eq(result.success_rate(), 75.0, 1e-9));

    let header_only = "Sample,Byte_Hex,Byte_Dec,Frequency_Hz,Amplitude,Duration_s\n";
    assert!(matches!(
        parse_csv(header_only, Path::new("empty.csv")),
        Err(SonarError::NoSamples { .. })
    ));
}

/// Tests reconstruction from JSON metadata written by the encoder.
///
/// This test verifies:
/// - Every byte is recovered
/// - Agreement between stored byte and frequency gives full confidence
/// - Every sample counts as successful
#[test]
fn test_json_reconstruction() {
    let stream = encode_bytes(MIXED_PAYLOAD, &EncodeConfig::default()).expect("Failed to encode");
    let mut buffer = Vec::new();
    write_json(&mut buffer, &stream, 44100, 1.0).expect("Failed to write JSON");
    let text = String::from_utf8(buffer).expect("JSON should be UTF-8");

    let result = parse_json(&text, Path::new("meta.json"), &DecodeConfig::default())
        .expect("Failed to parse JSON");
    assert_eq!(result.source, SourceKind::Json);
    assert_eq!(result.bytes(), MIXED_PAYLOAD.to_vec());
    assert_eq!(result.successful_samples, MIXED_PAYLOAD.len());
    assert!(result.samples.iter().all(|s| s.confidence == 1.0));
    assert_eq!(result.average_confidence, 1.0);
}

/// Tests JSON entries whose byte label is missing or disagrees.
///
/// This test verifies:
/// - The byte is always recomputed from the frequency
/// - Missing or mismatched labels get the reduced confidence
/// - Entries without a frequency are skipped but still counted
/// - Documents without a samples array are a Format error
/// - Invalid JSON is a Json error
#[test]
fn test_json_mismatch_and_errors() {
    let text = r#"{
    "audio_engine": {
        "name": "SONAR Audio Engine",
        "version": "AudioEngine 1.0"
    },
    "samples": [
        {"byte": "0x10", "frequency": 1223.92, "amplitude": 0.552, "duration": 0.050},
        {"frequency": 220.00},
        {"byte": "0x41", "amplitude": 0.329}
    ]
}"#;
    let config = DecodeConfig::default();

    let result = parse_json(text, Path::new("legacy.json"), &config).expect("Failed to parse");
    assert_eq!(result.bytes(), vec![0x80, 0x00]);
    assert_eq!(result.total_samples, 3);
    assert_eq!(result.successful_samples, 2);
    assert!(result.samples.iter().all(|s| s.confidence == 0.8));

    assert!(matches!(
        parse_json(r#"{"audio_engine": {}}"#, Path::new("x.json"), &config),
        Err(SonarError::Format(_))
    ));
    assert!(matches!(
        parse_json("{ not json", Path::new("x.json"), &config),
        Err(SonarError::Json(_))
    ));
}

/// Tests reconstruction from the analysis report.
///
/// This test verifies:
/// - Bytes are recovered from the detailed data section
/// - Every byte carries the report confidence
/// - A report without the data section is a Format error
#[test]
fn test_report_reconstruction() {
    let stream = encode_bytes(MIXED_PAYLOAD, &EncodeConfig::default()).expect("Failed to encode");
    let mut buffer = Vec::new();
    write_report(&mut buffer, &stream).expect("Failed to write report");
    let text = String::from_utf8(buffer).expect("Report should be UTF-8");

    let result = parse_report(&text, Path::new("analysis.txt"), &DecodeConfig::default())
        .expect("Failed to parse report");
    assert_eq!(result.source, SourceKind::Report);
    assert_eq!(result.bytes(), MIXED_PAYLOAD.to_vec());
    assert_eq!(result.total_samples, MIXED_PAYLOAD.len());
    assert_eq!(result.successful_samples, MIXED_PAYLOAD.len());
    assert!(result.samples.iter().all(|s| s.confidence == 0.85));

    assert!(matches!(
        parse_report(
            "SONAR Audio Analysis Report\n",
            Path::new("analysis.txt"),
            &DecodeConfig::default()
        ),
        Err(SonarError::Format(_))
    ));
}

/// Tests reconstruction from synthesized audio.
///
/// This test verifies:
/// - Bytes are recovered from the WAV file
/// - Every recovered byte has confidence 0.7, as does the average
/// - Every detected window counts as successful
/// - A configured WAV weight replaces the default figure
#[test]
fn test_wav_reconstruction_confidence() {
    let dir = scratch_dir();
    let path = write_encoded_wav(dir.path(), b"Hello");

    let result =
        reconstruct_from_wav(&path, &DecodeConfig::default()).expect("Failed to analyze WAV");
    assert_eq!(result.source, SourceKind::Wav);
    assert!(result.data_length() > 0);
    assert!(result.samples.iter().all(|s| s.confidence == 0.7));
    assert_eq!(result.average_confidence, 0.7);
    assert_eq!(result.total_samples, result.successful_samples);
    assert_eq!(result.success_rate(), 100.0);

    let weighted = DecodeConfig {
        weights: ConfidenceWeights {
            wav: 0.9,
            ..ConfidenceWeights::default()
        },
        ..DecodeConfig::default()
    };
    let result = reconstruct_from_wav(&path, &weighted).expect("Failed to analyze WAV");
    assert_eq!(result.average_confidence, 0.9);
}

/// Tests strict mode on synthesized audio.
///
/// This test verifies:
/// - With the default tolerance the estimates are kept
/// - With a tight tolerance every estimate is rejected and decoding fails
#[test]
fn test_wav_strict_mode() {
    let dir = scratch_dir();
    let path = write_encoded_wav(dir.path(), b"Hello");

    let strict = DecodeConfig {
        strict_mode: true,
        ..DecodeConfig::default()
    };
    let result = reconstruct_from_wav(&path, &strict).expect("Failed to analyze WAV");
    assert!(result.data_length() > 0);

    let tight = DecodeConfig {
        strict_mode: true,
        tolerance: 1.0,
        ..DecodeConfig::default()
    };
    assert!(matches!(
        reconstruct_from_wav(&path, &tight),
        Err(SonarError::NoSamples { .. })
    ));
}

/// Tests WAV inputs that cannot be decoded.
///
/// This test verifies:
/// - A silent WAV yields NoSamples
/// - A stereo WAV is rejected
/// - A non-WAV file is a WavFormat error
#[test]
fn test_wav_reconstruction_errors() {
    let dir = scratch_dir();
    let config = DecodeConfig::default();

    let silent = dir.path().join("silent.wav");
    write_wav_file(&silent, &[0; 4410], 44100).expect("Failed to write WAV");
    assert!(matches!(
        reconstruct_from_wav(&silent, &config),
        Err(SonarError::NoSamples { .. })
    ));

    let stereo_path = dir.path().join("stereo.wav");
    let stereo_spec = hound::WavSpec {
        channels: 2,
        ..sonar::mono16_spec(44100)
    };
    let mut writer =
        hound::WavWriter::create(&stereo_path, stereo_spec).expect("Failed to create writer");
    for sample in sine(1000.0, 4410) {
        writer.write_sample(sample).expect("Failed to write sample");
        writer.write_sample(sample).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
    assert!(matches!(
        reconstruct_from_wav(&stereo_path, &config),
        Err(SonarError::WavFormat(_))
    ));

    let text_path = dir.path().join("not_audio.wav");
    std::fs::write(&text_path, "this is not a RIFF file at all, just some text padding")
        .expect("Failed to write file");
    assert!(matches!(
        reconstruct_from_wav(&text_path, &config),
        Err(SonarError::WavFormat(_))
    ));
}

/// Tests the decode configuration.
///
/// This test verifies:
/// - The default window spans 11 frames
/// - Windows shorter than 10 frames are rejected
/// - A negative tolerance is rejected
#[test]
fn test_decode_config_validation() {
    let config = DecodeConfig::default();
    assert_eq!(config.window_frames(), 11);
    assert!(config.validate().is_ok());

    let short_window = DecodeConfig {
        window_duration: 0.01,
        ..DecodeConfig::default()
    };
    assert!(matches!(
        short_window.validate(),
        Err(SonarError::InvalidConfig(_))
    ));

    let negative = DecodeConfig {
        tolerance: -1.0,
        ..DecodeConfig::default()
    };
    assert!(negative.validate().is_err());
}

/// Tests that every reader rejects an invalid configuration before decoding.
///
/// This test verifies:
/// - JSON, report and WAV readers return InvalidConfig for a zero frequency range
/// - The same artifacts decode with a valid configuration
#[test]
fn test_readers_reject_invalid_config() {
    let stream = encode_bytes(&EDGE_BYTES, &EncodeConfig::default()).expect("Failed to encode");
    let mut json = Vec::new();
    write_json(&mut json, &stream, 44100, 1.0).expect("Failed to write JSON");
    let json = String::from_utf8(json).expect("JSON should be UTF-8");
    let mut report = Vec::new();
    write_report(&mut report, &stream).expect("Failed to write report");
    let report = String::from_utf8(report).expect("Report should be UTF-8");

    let invalid = DecodeConfig {
        frequency_range: 0.0,
        ..DecodeConfig::default()
    };

    assert!(matches!(
        parse_json(&json, Path::new("meta.json"), &invalid),
        Err(SonarError::InvalidConfig(_))
    ));
    assert!(matches!(
        parse_report(&report, Path::new("analysis.txt"), &invalid),
        Err(SonarError::InvalidConfig(_))
    ));

    let dir = scratch_dir();
    let path = write_encoded_wav(dir.path(), &EDGE_BYTES);
    assert!(matches!(
        reconstruct_from_wav(&path, &invalid),
        Err(SonarError::InvalidConfig(_))
    ));

    let valid = DecodeConfig::default();
    let decoded = parse_json(&json, Path::new("meta.json"), &valid).expect("Failed to parse JSON");
    assert_eq!(decoded.bytes(), EDGE_BYTES.to_vec());
    let decoded =
        parse_report(&report, Path::new("analysis.txt"), &valid).expect("Failed to parse report");
    assert_eq!(decoded.bytes(), EDGE_BYTES.to_vec());
}

/// Tests input format names and detection.
///
/// This test verifies:
/// - Format names parse case-insensitively, with report aliases
/// - Unknown names are rejected
/// - Auto tries every kind in priority order
/// - Artifact kinds are detected from file extensions
#[test]
fn test_format_selection() {
    assert_eq!("auto".parse::<PreferredFormat>().ok(), Some(PreferredFormat::Auto));
    assert_eq!("CSV".parse::<PreferredFormat>().ok(), Some(PreferredFormat::Csv));
    assert_eq!("wav".parse::<PreferredFormat>().ok(), Some(PreferredFormat::Wav));
    assert_eq!("analysis".parse::<PreferredFormat>().ok(), Some(PreferredFormat::Report));
    assert!("mp3".parse::<PreferredFormat>().is_err());

    assert_eq!(
        PreferredFormat::Auto.candidates(),
        vec![
            SourceKind::Csv,
            SourceKind::Json,
            SourceKind::Wav,
            SourceKind::Report
        ]
    );
    assert_eq!(PreferredFormat::Json.candidates(), vec![SourceKind::Json]);

    assert_eq!(
        SourceKind::detect(Path::new("sonar_partition_0_frequencies.csv")),
        Some(SourceKind::Csv)
    );
    assert_eq!(SourceKind::detect(Path::new("a/b.WAV")), Some(SourceKind::Wav));
    assert_eq!(SourceKind::detect(Path::new("x_analysis.txt")), Some(SourceKind::Report));
    assert_eq!(SourceKind::detect(Path::new("data.bin")), None);
    assert_eq!(SourceKind::Report.to_string(), "report");
}

/// Tests reconstruction accuracy and the result summary.
///
/// This test verifies:
/// - Accuracy is measured over the shorter sequence
/// - Empty inputs give zero accuracy
/// - The summary names the source and the first bytes
#[test]
fn test_accuracy_and_summary() {
    assert!(approx_eq(reconstruction_accuracy(&[1, 2, 3], &[1, 2, 4, 5]), 2.0 / 3.0, 1e-12));
    assert_eq!(reconstruction_accuracy(&[1, 2, 3], &[1, 2, 3]), 1.0);
    assert_eq!(reconstruction_accuracy(&[], &[1]), 0.0);

    let stream = encode_bytes(&EDGE_BYTES, &EncodeConfig::default()).expect("Failed to encode");
    let mut buffer = Vec::new();
    write_csv(&mut buffer, &stream).expect("Failed to write CSV");
    let text = String::from_utf8(buffer).expect("CSV should be UTF-8");
    let result = parse_csv(&text, Path::new("edge.csv")).expect("Failed to parse CSV");

    let summary = result.summary(Path::new("edge.csv"));
    assert!(summary.contains("edge.csv (csv)"));
    assert!(summary.contains("Reconstructed 3 bytes"));
    assert!(summary.contains("0x00 0x41 0xFF"));
}
