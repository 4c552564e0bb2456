use super::readers::reconstruct_from;
use super::reverse::reconstruction_accuracy;
use super::types::{DecodeConfig, PreferredFormat, ReconstructionResult, SourceKind};
use crate::partition::PartitionSource;
use crate::sonar::{reconstructed_file_path, ArtifactPaths, Result, SonarError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

impl ArtifactPaths {
    /// Artifact of the given kind
    pub fn source(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Csv => &self.csv,
            SourceKind::Json => &self.json,
            SourceKind::Wav => &self.wav,
            SourceKind::Report => &self.report,
        }
    }
}

/// A partition successfully rebuilt from one of its artifacts
#[derive(Debug)]
pub struct PartitionReconstruction {
    pub index: usize,
    /// Artifact the bytes were read from
    pub source_path: PathBuf,
    pub result: ReconstructionResult,
    /// Share of matching bytes, when the original partition was available
    pub accuracy: Option<f64>,
    /// Where the partition's bytes were saved
    pub output_path: PathBuf,
}

/// Outcome of rebuilding a whole file partition by partition
#[derive(Debug)]
pub struct BatchReconstruction {
    pub partitions: Vec<PartitionReconstruction>,
    pub failed: Vec<(usize, SonarError)>,
    /// Concatenation of every rebuilt partition, in index order
    pub output_path: PathBuf,
    pub total_bytes: usize,
}

impl BatchReconstruction {
    /// True only if every partition was rebuilt and something was written
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.total_bytes > 0
    }
}

/// Picks and reads one artifact for partition `index`.
///
/// Candidates are tried in priority order (CSV, JSON, WAV, report, or only
/// the forced format); the first one that exists and parses wins. Sources are
/// never merged.
///
/// # Errors
/// * If the configuration is invalid
/// * `MissingArtifacts` if no candidate exists or none parses
pub fn select_and_reconstruct(
    dir: &Path,
    index: usize,
    config: &DecodeConfig,
) -> Result<(PathBuf, ReconstructionResult)> {
    config.validate()?;
    let paths = ArtifactPaths::for_partition(dir, index);

    for kind in config.preferred_format.candidates() {
        let path = paths.source(kind);
        if !path.exists() {
            debug!("No {} artifact for partition {}", kind, index);
            continue;
        }

        info!("Found {} artifact: {}", kind, path.display());
        match reconstruct_from(kind, path, config) {
            Ok(result) => return Ok((path.to_path_buf(), result)),
            Err(e) => warn!("Failed to reconstruct from {}: {}", path.display(), e),
        }
    }

    Err(SonarError::MissingArtifacts { partition: index })
}

/// Writes reconstructed bytes to `path`.
pub fn save_reconstructed(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;
    info!("Reconstructed data saved to: {}", path.display());
    Ok(())
}

/// Rebuilds partition `index` from the artifacts in `dir` and saves it as
/// `dsonar_reconstructed_partition_<index>.bin`.
///
/// When `original` is given, the result is compared against it.
pub fn reconstruct_partition(
    dir: &Path,
    index: usize,
    config: &DecodeConfig,
    original: Option<&[u8]>,
) -> Result<PartitionReconstruction> {
    let (source_path, result) = select_and_reconstruct(dir, index, config)?;
    let bytes = result.bytes();

    let output_path = ArtifactPaths::for_partition(dir, index).reconstructed;
    save_reconstructed(&output_path, &bytes)?;

    let accuracy = original.map(|original| reconstruction_accuracy(original, &bytes));
    if let Some(accuracy) = accuracy {
        info!(
            "Partition {} reconstruction accuracy: {:.2}%",
            index,
            accuracy * 100.0
        );
    }

    Ok(PartitionReconstruction {
        index,
        source_path,
        result,
        accuracy,
        output_path,
    })
}

/// Rebuilds a whole file from the artifacts of `partition_count` partitions.
///
/// Each partition is rebuilt on its own; a failing partition is recorded and
/// the rest still run. The rebuilt partitions are concatenated in index order
/// into `dsonar_reconstructed_<name>.bin`, which is written even when some
/// partitions failed.
pub fn reconstruct_file(
    dir: &Path,
    partition_count: usize,
    name: &str,
    config: &DecodeConfig,
    originals: Option<&dyn PartitionSource>,
) -> Result<BatchReconstruction> {
    config.validate()?;

    let mut partitions = Vec::with_capacity(partition_count);
    let mut failed = Vec::new();
    let mut combined = Vec::new();

    for index in 0..partition_count {
        let original = originals.and_then(|source| source.partition(index));
        match reconstruct_partition(dir, index, config, original) {
            Ok(partition) => {
                combined.extend(partition.result.bytes());
                partitions.push(partition);
            }
            Err(e) => {
                warn!("Failed to process partition {}: {}", index, e);
                failed.push((index, e));
            }
        }
    }

    let output_path = reconstructed_file_path(dir, name);
    save_reconstructed(&output_path, &combined)?;
    info!(
        "Combined {} bytes from {} partitions into {}",
        combined.len(),
        partitions.len(),
        output_path.display()
    );

    Ok(BatchReconstruction {
        partitions,
        failed,
        output_path,
        total_bytes: combined.len(),
    })
}

/// Rebuilds bytes from a single artifact file and saves them in `out_dir` as
/// `dsonar_reconstructed_<stem>.bin`.
///
/// The artifact kind comes from `config.preferred_format`, or from the file
/// name when that is `Auto`.
pub fn reconstruct_single(
    path: &Path,
    config: &DecodeConfig,
    out_dir: &Path,
) -> Result<(PathBuf, ReconstructionResult)> {
    config.validate()?;
    let kind = match config.preferred_format {
        PreferredFormat::Auto => SourceKind::detect(path).ok_or_else(|| {
            SonarError::Format(format!(
                "Cannot detect input format of {}",
                path.display()
            ))
        })?,
        forced => forced.candidates()[0],
    };

    let result = reconstruct_from(kind, path, config)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    let output_path = reconstructed_file_path(out_dir, &stem);
    save_reconstructed(&output_path, &result.bytes())?;

    Ok((output_path, result))
}

/// Compares a reconstruction against the original file on disk.
pub fn validate_against_file(result: &ReconstructionResult, original: &Path) -> Result<f64> {
    let original = fs::read(original)?;
    Ok(reconstruction_accuracy(&original, &result.bytes()))
}
