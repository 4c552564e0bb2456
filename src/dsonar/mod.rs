/// Reverse direction: recovering bytes from SONAR artifacts.
///
/// This module provides functionality to:
/// - Map frequencies back to bytes
/// - Estimate frequencies from WAV audio by zero-crossing analysis
/// - Parse CSV, JSON and analysis-report sidecars
/// - Choose one artifact per partition and reassemble the original file
mod pipeline;
mod readers;
mod reverse;
mod types;

pub use pipeline::{
    reconstruct_file, reconstruct_partition, reconstruct_single, save_reconstructed,
    select_and_reconstruct, validate_against_file, BatchReconstruction, PartitionReconstruction,
};
pub use readers::{
    analyze_pcm, parse_csv, parse_json, parse_report, reconstruct_from, reconstruct_from_csv,
    reconstruct_from_json, reconstruct_from_report, reconstruct_from_wav,
};
pub use reverse::{
    accept_estimate, byte_frequency, estimate_frequency, frequency_to_byte,
    reconstruction_accuracy, zero_crossings, MAX_DETECTABLE_HZ, MIN_DETECTABLE_HZ,
};
pub use types::{
    ConfidenceWeights, DecodeConfig, PreferredFormat, ReconstructedByte, ReconstructionResult,
    SourceKind, MIN_WINDOW_FRAMES,
};
