use super::types::{Result, SonarError};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// Size of the header written for mono 16-bit PCM (RIFF, `fmt ` and `data` chunk headers)
pub const WAV_HEADER_LEN: usize = 44;

/// Represents the data from a WAV file after reading
#[derive(Debug)]
pub struct WavData {
    /// Raw 16-bit PCM samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of audio channels
    pub channels: u16,
}

/// Format of every WAV file the codec writes: mono, 16-bit integer PCM.
pub fn mono16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn wav_error(err: hound::Error) -> SonarError {
    match err {
        hound::Error::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            SonarError::WavFormat("Truncated WAV file".to_string())
        }
        hound::Error::IoError(e) => SonarError::Io(e),
        other => SonarError::WavFormat(other.to_string()),
    }
}

fn write_samples<W: Write + Seek>(mut writer: WavWriter<W>, pcm: &[i16]) -> Result<()> {
    for &sample in pcm {
        writer.write_sample(sample).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)
}

/// Writes `pcm` as a mono 16-bit PCM WAV stream.
pub fn write_wav<W: Write + Seek>(writer: W, pcm: &[i16], sample_rate: u32) -> Result<()> {
    let writer = WavWriter::new(writer, mono16_spec(sample_rate)).map_err(wav_error)?;
    write_samples(writer, pcm)
}

/// Creates (or truncates) `path` and writes `pcm` as a WAV file.
pub fn write_wav_file(path: &Path, pcm: &[i16], sample_rate: u32) -> Result<()> {
    let writer = WavWriter::create(path, mono16_spec(sample_rate)).map_err(wav_error)?;
    write_samples(writer, pcm)
}

fn read_samples<R: Read>(reader: WavReader<R>) -> Result<WavData> {
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(SonarError::WavFormat(format!(
            "Unsupported WAV format: {:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()
        .map_err(wav_error)?;

    Ok(WavData {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Reads a 16-bit integer PCM WAV stream.
///
/// # Errors
/// * If the RIFF/WAVE magic is missing or the header is truncated
/// * If the format is anything other than 16-bit integer PCM
pub fn read_wav<R: Read>(reader: R) -> Result<WavData> {
    read_samples(WavReader::new(reader).map_err(wav_error)?)
}

/// Reads a 16-bit integer PCM WAV file.
pub fn read_wav_file(path: &Path) -> Result<WavData> {
    read_samples(WavReader::open(path).map_err(wav_error)?)
}
