/// Forward direction: turning partition bytes into audio and sidecar files.
///
/// This module provides functionality to:
/// - Map bytes to tones and synthesize them into 16-bit PCM
/// - Read and write mono 16-bit WAV files
/// - Write CSV, JSON and plain-text descriptions of a sample stream
/// - Drive a rendering backend over every partition of an input
mod forward;
mod render;
mod sidecar;
mod types;
mod wav;

pub use forward::{
    byte_to_amplitude, byte_to_frequency, byte_to_sample, encode_bytes, envelope, synthesize,
    Synthesizer,
};
pub use render::{BuiltinSynth, EngineSession, RenderBackend, Renderer};
pub use sidecar::{
    engine_version, reconstructed_file_path, write_csv, write_csv_file, write_json,
    write_json_file, write_report, write_report_file, ArtifactPaths, AudioConfigInfo, EngineInfo,
    MetadataDocument, MetadataSample, CSV_HEADER, ENGINE_NAME, REPORT_DATA_SECTION,
};
pub use types::{EncodeConfig, Result, Sample, SampleStream, SonarError, StreamStats};
pub use wav::{
    mono16_spec, read_wav, read_wav_file, write_wav, write_wav_file, WavData, WAV_HEADER_LEN,
};

use crate::partition::PartitionSource;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Which sidecar files accompany each WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SidecarOptions {
    pub csv: bool,
    pub json: bool,
    pub report: bool,
}

impl Default for SidecarOptions {
    fn default() -> Self {
        SidecarOptions {
            csv: true,
            json: true,
            report: true,
        }
    }
}

/// Result of encoding one partition
#[derive(Debug)]
pub struct PartitionEncoding {
    pub index: usize,
    pub stream: SampleStream,
    pub paths: ArtifactPaths,
}

/// Outcome of encoding every partition of an input
#[derive(Debug, Default)]
pub struct BatchEncoding {
    pub encoded: Vec<PartitionEncoding>,
    pub failed: Vec<(usize, SonarError)>,
}

impl BatchEncoding {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Encodes partition `index` of `source` and writes its artifacts into `out_dir`.
///
/// The WAV file always goes through `renderer`; the sidecars selected in
/// `sidecars` are written alongside it. The backend is initialised if it is
/// not already; shutting it down is left to the caller.
///
/// # Errors
/// * If the configuration is invalid
/// * If the partition does not exist
/// * If any artifact cannot be written
pub fn encode_partition(
    source: &dyn PartitionSource,
    index: usize,
    out_dir: &Path,
    config: &EncodeConfig,
    sidecars: &SidecarOptions,
    renderer: &mut Renderer,
) -> Result<PartitionEncoding> {
    config.validate()?;
    let bytes = source
        .partition(index)
        .ok_or(SonarError::PartitionOutOfRange {
            index,
            count: source.partition_count(),
        })?;

    info!("Converting partition {} ({} bytes) to audio", index, bytes.len());
    let stream = encode_bytes(bytes, config)?;
    let paths = ArtifactPaths::for_partition(out_dir, index);

    let backend = renderer.backend();
    backend.init(config.sample_rate)?;
    backend.generate_wav(&paths.wav, &stream)?;

    if sidecars.csv {
        write_csv_file(&paths.csv, &stream)?;
        info!("Frequency data saved: {}", paths.csv.display());
    }
    if sidecars.json {
        write_json_file(&paths.json, &stream, config.sample_rate, backend.master_volume())?;
        info!("Metadata saved: {}", paths.json.display());
    }
    if sidecars.report {
        write_report_file(&paths.report, &stream)?;
        info!("Analysis report saved: {}", paths.report.display());
    }

    Ok(PartitionEncoding {
        index,
        stream,
        paths,
    })
}

/// Encodes every partition of `source`, one artifact set per partition.
///
/// A partition that fails is recorded and the remaining partitions are still
/// encoded. The backend is initialised once up front and shut down at the end.
pub fn encode_all(
    source: &dyn PartitionSource,
    out_dir: &Path,
    config: &EncodeConfig,
    sidecars: &SidecarOptions,
    renderer: &mut Renderer,
) -> Result<BatchEncoding> {
    config.validate()?;
    renderer.backend().init(config.sample_rate)?;

    let mut batch = BatchEncoding::default();
    for index in 0..source.partition_count() {
        match encode_partition(source, index, out_dir, config, sidecars, renderer) {
            Ok(encoding) => batch.encoded.push(encoding),
            Err(e) => {
                warn!("Failed to encode partition {}: {}", index, e);
                batch.failed.push((index, e));
            }
        }
    }

    renderer.backend().cleanup();
    Ok(batch)
}
