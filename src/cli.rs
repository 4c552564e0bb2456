use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sonar_codec::config::{self, Config};
use sonar_codec::dsonar::{self, PreferredFormat};
use sonar_codec::partition::{PartitionSource, PartitionedFile};
use sonar_codec::sonar::{self, BuiltinSynth, Renderer, SampleStream};
use sonar_codec::SonarError;

/// Sonify binary files and reconstruct them from the resulting audio
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to sonar.toml if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a file's partitions to WAV audio and sidecar files
    Encode(EncodeArgs),

    /// Rebuild a file from the artifacts of all its partitions
    Decode(DecodeArgs),

    /// Rebuild bytes from a single artifact (WAV, CSV, JSON or report)
    DecodeFile(DecodeFileArgs),
}

/// Convert a file's partitions to WAV audio and sidecar files
#[derive(Parser)]
struct EncodeArgs {
    /// Path to the input file
    #[arg(required = true)]
    file: PathBuf,

    /// Number of partitions to split the file into
    #[arg(short, long, default_value_t = 4)]
    partitions: usize,

    /// Directory to write artifacts to (overrides the config file)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

/// Rebuild a file from the artifacts of all its partitions
#[derive(Parser)]
struct DecodeArgs {
    /// Number of partitions to reconstruct
    #[arg(short, long, default_value_t = 4)]
    partitions: usize,

    /// Name used for the combined output file
    #[arg(short, long, default_value = "original_file")]
    name: String,

    /// Directory holding the artifacts (overrides the config file)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Input format: auto, csv, json, wav or report
    #[arg(short, long)]
    format: Option<PreferredFormat>,

    /// Original file to measure reconstruction accuracy against
    #[arg(long)]
    original: Option<PathBuf>,
}

/// Rebuild bytes from a single artifact
#[derive(Parser)]
struct DecodeFileArgs {
    /// Path to the artifact
    #[arg(required = true)]
    artifact: PathBuf,

    /// Input format: auto, csv, json, wav or report
    #[arg(short, long)]
    format: Option<PreferredFormat>,

    /// Directory to write the reconstructed file to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn print_stream_summary(index: usize, stream: &SampleStream) {
    println!("=== SONAR Partition {} ===", index);
    for sample in stream.iter().take(10) {
        println!(
            "Byte 0x{:02X} -> {:.2} Hz (Amp: {:.2})",
            sample.source_byte.unwrap_or(0),
            sample.frequency,
            sample.amplitude
        );
    }
    if let Some(stats) = stream.stats() {
        println!("Average frequency: {:.2} Hz", stats.average_frequency);
        println!(
            "Frequency range: {:.2} - {:.2} Hz",
            stats.min_frequency, stats.max_frequency
        );
        println!("Total audio duration: {:.2} seconds", stats.total_duration);
    }
    println!();
}

fn require_file(path: &Path) -> Result<(), SonarError> {
    if !path.exists() {
        return Err(SonarError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }
    Ok(())
}

fn run_encode(args: &EncodeArgs, config: &Config) -> Result<bool, SonarError> {
    require_file(&args.file)?;
    config.encode.validate()?;

    let out_dir = match &args.out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => config::ensure_output_dir(&config.output)?,
    };

    let source = PartitionedFile::open(&args.file, args.partitions)?;
    println!("File size: {} bytes", source.total_size());
    println!(
        "Partition size: {} bytes each ({} partitions)\n",
        source.partition_size(),
        source.partition_count()
    );

    let mut renderer =
        Renderer::Builtin(BuiltinSynth::new().with_master_volume(config.output.master_volume));
    let batch = sonar::encode_all(
        &source,
        &out_dir,
        &config.encode,
        &config.output.sidecars,
        &mut renderer,
    )?;

    for encoding in &batch.encoded {
        print_stream_summary(encoding.index, &encoding.stream);
    }
    for (index, err) in &batch.failed {
        eprintln!("Failed to encode partition {}: {}", index, err);
    }
    if source.partition_count() != args.partitions {
        println!(
            "Only {} of {} requested partitions were written; decode with --partitions {}",
            source.partition_count(),
            args.partitions,
            source.partition_count()
        );
    }

    Ok(batch.is_success())
}

fn run_decode(args: &DecodeArgs, config: &Config) -> Result<bool, SonarError> {
    let mut decode = config.decode.clone();
    if let Some(format) = args.format {
        decode.preferred_format = format;
    }
    let dir = args.dir.clone().unwrap_or_else(|| config.output.dir());

    let originals = match &args.original {
        Some(path) => Some(PartitionedFile::open(path, args.partitions)?),
        None => None,
    };

    let batch = dsonar::reconstruct_file(
        &dir,
        args.partitions,
        &args.name,
        &decode,
        originals.as_ref().map(|o| o as &dyn PartitionSource),
    )?;

    for partition in &batch.partitions {
        println!("=== dSONAR Partition {} ===", partition.index);
        println!("{}", partition.result.summary(&partition.source_path));
        if let Some(accuracy) = partition.accuracy {
            println!("Reconstruction accuracy: {:.2}%", accuracy * 100.0);
        }
        println!();
    }
    for (index, err) in &batch.failed {
        eprintln!("Failed to process partition {}: {}", index, err);
    }
    println!(
        "Combined {} bytes into {}",
        batch.total_bytes,
        batch.output_path.display()
    );

    Ok(batch.is_success())
}

fn run_decode_file(args: &DecodeFileArgs, config: &Config) -> Result<bool, SonarError> {
    require_file(&args.artifact)?;
    let mut decode = config.decode.clone();
    if let Some(format) = args.format {
        decode.preferred_format = format;
    }

    std::fs::create_dir_all(&args.out_dir)?;
    let (output, result) = dsonar::reconstruct_single(&args.artifact, &decode, &args.out_dir)?;
    println!("{}", result.summary(&args.artifact));
    println!("Output: {}", output.display());
    Ok(true)
}

fn run() -> Result<bool, SonarError> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Encode(args) => run_encode(args, &config),
        Commands::Decode(args) => run_decode(args, &config),
        Commands::DecodeFile(args) => run_decode_file(args, &config),
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sonar_codec=info,sonar=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(err) => {
            eprintln!("\nERROR: {}\n", err);
            match err {
                SonarError::Io(ref io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                    eprintln!("Please check that:");
                    eprintln!("1. The file path is correct");
                    eprintln!("2. The file exists");
                    eprintln!("3. You have permission to read the file");
                }
                SonarError::InvalidConfig(_) | SonarError::Toml(_) => {
                    eprintln!("Check the values in {}", config::DEFAULT_CONFIG_FILE);
                }
                _ => {}
            }
            process::exit(1);
        }
    }
}
