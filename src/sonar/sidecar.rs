use super::types::{Result, SampleStream};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name written into JSON metadata and analysis reports
pub const ENGINE_NAME: &str = "SONAR Audio Engine";

/// CSV header line, also used by the reader to recognise the file
pub const CSV_HEADER: &str = "Sample,Byte_Hex,Byte_Dec,Frequency_Hz,Amplitude,Duration_s";

/// Section title that introduces per-sample rows in the analysis report
pub const REPORT_DATA_SECTION: &str = "Detailed Sample Data";

/// Engine version string, e.g. "AudioEngine 1.1.0"
pub fn engine_version() -> String {
    format!("AudioEngine {}", env!("CARGO_PKG_VERSION"))
}

/// File names of every artifact belonging to one partition.
///
/// Encode writes `sonar_partition_<i>.wav` plus the `_frequencies.csv`,
/// `_metadata.json` and `_analysis.txt` sidecars; decode writes
/// `dsonar_reconstructed_partition_<i>.bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub wav: PathBuf,
    pub csv: PathBuf,
    pub json: PathBuf,
    pub report: PathBuf,
    pub reconstructed: PathBuf,
}

impl ArtifactPaths {
    pub fn for_partition(dir: &Path, index: usize) -> Self {
        let base = format!("sonar_partition_{}", index);
        ArtifactPaths {
            wav: dir.join(format!("{}.wav", base)),
            csv: dir.join(format!("{}_frequencies.csv", base)),
            json: dir.join(format!("{}_metadata.json", base)),
            report: dir.join(format!("{}_analysis.txt", base)),
            reconstructed: dir.join(format!("dsonar_reconstructed_partition_{}.bin", index)),
        }
    }
}

/// Output path of a whole reconstructed file
pub fn reconstructed_file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("dsonar_reconstructed_{}.bin", name))
}

/// Top-level layout of the `_metadata.json` sidecar
#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub audio_engine: EngineInfo,
    pub audio_config: AudioConfigInfo,
    pub samples: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AudioConfigInfo {
    pub sample_rate: u32,
    pub master_volume: f64,
}

/// One entry of the `samples` array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSample {
    /// Source byte formatted as `0xXX`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte: Option<String>,
    pub frequency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn hex_byte(byte: Option<u8>) -> String {
    format!("0x{:02X}", byte.unwrap_or(0))
}

/// Writes the CSV frequency table.
///
/// One row per sample: index, `0xXX` byte, decimal byte, frequency (2 dp),
/// amplitude (3 dp) and duration (3 dp).
pub fn write_csv<W: Write>(writer: &mut W, stream: &SampleStream) -> Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for (index, sample) in stream.iter().enumerate() {
        writeln!(
            writer,
            "{},{},{},{:.2},{:.3},{:.3}",
            index,
            hex_byte(sample.source_byte),
            sample.source_byte.unwrap_or(0),
            sample.frequency,
            sample.amplitude,
            sample.duration
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the JSON metadata document, samples in stream order.
pub fn write_json<W: Write>(
    writer: &mut W,
    stream: &SampleStream,
    sample_rate: u32,
    master_volume: f64,
) -> Result<()> {
    let samples = stream
        .iter()
        .map(|sample| {
            serde_json::to_value(MetadataSample {
                byte: Some(hex_byte(sample.source_byte)),
                frequency: round_to(sample.frequency, 2),
                amplitude: Some(round_to(sample.amplitude, 3)),
                duration: Some(round_to(sample.duration, 3)),
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let document = MetadataDocument {
        audio_engine: EngineInfo {
            name: ENGINE_NAME.to_string(),
            version: engine_version(),
        },
        audio_config: AudioConfigInfo {
            sample_rate,
            master_volume: round_to(master_volume, 2),
        },
        samples,
    };

    serde_json::to_writer_pretty(&mut *writer, &document)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes the human-readable analysis report.
///
/// A statistics block is followed by the "Detailed Sample Data" section, whose
/// rows look like `0x48\t784.71\t\t0.354\t0.050`. An empty stream produces
/// only the title block.
pub fn write_report<W: Write>(writer: &mut W, stream: &SampleStream) -> Result<()> {
    writeln!(writer, "SONAR Audio Analysis Report")?;
    writeln!(writer, "===========================")?;
    writeln!(writer)?;
    writeln!(writer, "Generated by: {}", ENGINE_NAME)?;
    writeln!(writer, "Version: {}", engine_version())?;
    writeln!(writer)?;

    if let Some(stats) = stream.stats() {
        writeln!(writer, "Sample Statistics:")?;
        writeln!(writer, "- Total samples: {}", stats.count)?;
        writeln!(writer, "- Average frequency: {:.2} Hz", stats.average_frequency)?;
        writeln!(
            writer,
            "- Frequency range: {:.2} - {:.2} Hz",
            stats.min_frequency, stats.max_frequency
        )?;
        writeln!(writer, "- Average amplitude: {:.3}", stats.average_amplitude)?;
        writeln!(
            writer,
            "- Amplitude range: {:.3} - {:.3}",
            stats.min_amplitude, stats.max_amplitude
        )?;
        writeln!(writer, "- Total duration: {:.3} s", stats.total_duration)?;
        writeln!(writer)?;

        writeln!(writer, "{}:", REPORT_DATA_SECTION)?;
        writeln!(writer, "Byte\tFreq(Hz)\tAmp\tDuration(s)")?;
        writeln!(writer, "----\t--------\t---\t-----------")?;
        for sample in stream {
            writeln!(
                writer,
                "{}\t{:.2}\t\t{:.3}\t{:.3}",
                hex_byte(sample.source_byte),
                sample.frequency,
                sample.amplitude,
                sample.duration
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

pub fn write_csv_file(path: &Path, stream: &SampleStream) -> Result<()> {
    write_csv(&mut create(path)?, stream)
}

pub fn write_json_file(
    path: &Path,
    stream: &SampleStream,
    sample_rate: u32,
    master_volume: f64,
) -> Result<()> {
    write_json(&mut create(path)?, stream, sample_rate, master_volume)
}

pub fn write_report_file(path: &Path, stream: &SampleStream) -> Result<()> {
    write_report(&mut create(path)?, stream)
}
