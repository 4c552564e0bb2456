use crate::dsonar::DecodeConfig;
use crate::sonar::{EncodeConfig, Result, SidecarOptions};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sonar.toml";

/// Common configuration for encoding and decoding
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encode: EncodeConfig,
    pub decode: DecodeConfig,
    pub output: OutputConfig,
}

/// Where artifacts go and which ones are produced
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory artifacts are written to and read from
    pub dir: String,
    /// Gain applied by the built-in synthesizer, 0.0 - 1.0
    pub master_volume: f64,
    #[serde(flatten)]
    pub sidecars: SidecarOptions,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: ".".to_string(),
            master_volume: 1.0,
            sidecars: SidecarOptions::default(),
        }
    }
}

impl OutputConfig {
    pub fn dir(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }
}

fn has_key(table: &toml::Table, section: &str, key: &str) -> bool {
    table
        .get(section)
        .and_then(toml::Value::as_table)
        .is_some_and(|section| section.contains_key(key))
}

/// Parses configuration from TOML text. Missing keys keep their defaults.
///
/// The decode band follows `[encode]` unless `[decode]` sets it explicitly.
/// An explicit band that differs from the encode band is kept, with a warning.
pub fn parse_config(contents: &str) -> Result<Config> {
    let table: toml::Table = toml::from_str(contents)?;
    let mut config: Config = toml::from_str(contents)?;

    if has_key(&table, "decode", "base_frequency") {
        if config.decode.base_frequency != config.encode.base_frequency {
            warn!(
                "Decode base frequency {:.2}Hz differs from encode base frequency {:.2}Hz",
                config.decode.base_frequency, config.encode.base_frequency
            );
        }
    } else {
        config.decode.base_frequency = config.encode.base_frequency;
    }

    if has_key(&table, "decode", "frequency_range") {
        if config.decode.frequency_range != config.encode.frequency_range {
            warn!(
                "Decode frequency range {:.2}Hz differs from encode frequency range {:.2}Hz",
                config.decode.frequency_range, config.encode.frequency_range
            );
        }
    } else {
        config.decode.frequency_range = config.encode.frequency_range;
    }

    Ok(config)
}

/// Load configuration from `path`, or from `sonar.toml` when no path is given.
///
/// A missing file yields the default configuration; a file that exists but
/// does not parse is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

/// Ensure the output directory exists
pub fn ensure_output_dir(config: &OutputConfig) -> Result<PathBuf> {
    let dir = config.dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}
