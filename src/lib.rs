//! Sonification of binary data and its lossy inverse.
//!
//! Each byte of a file partition becomes a tone whose frequency and amplitude
//! are linear in the byte value. The tones are rendered to a 16-bit mono WAV
//! file, optionally accompanied by CSV, JSON and plain-text descriptions of the
//! same sample stream. The [`dsonar`] side recovers the bytes from whichever of
//! those artifacts is available, preferring the exact sidecars over audio.
pub mod config;
pub mod dsonar;
pub mod partition;
pub mod sonar;

pub use sonar::{Result, SonarError};
