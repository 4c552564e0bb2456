use super::forward::Synthesizer;
use super::types::{Result, SampleStream, SonarError};
use super::wav::write_wav_file;
use std::path::Path;
use tracing::{debug, info};

/// Explicit state of a rendering engine.
///
/// Holds what a process-wide audio engine would otherwise keep in globals:
/// the sample rate, the master volume and whether `init` has run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSession {
    sample_rate: u32,
    master_volume: f64,
    initialized: bool,
}

impl Default for EngineSession {
    fn default() -> Self {
        EngineSession {
            sample_rate: 44100,
            master_volume: 1.0,
            initialized: false,
        }
    }
}

impl EngineSession {
    /// Starts the session. Calling it on a running session is a no-op.
    pub fn init(&mut self, sample_rate: u32) -> Result<()> {
        if self.initialized {
            debug!("Engine session already initialized");
            return Ok(());
        }
        if sample_rate == 0 {
            return Err(SonarError::Backend(
                "Sample rate must be positive".to_string(),
            ));
        }
        self.sample_rate = sample_rate;
        self.initialized = true;
        Ok(())
    }

    /// Stops the session and resets the master volume.
    pub fn cleanup(&mut self) {
        self.master_volume = 1.0;
        self.initialized = false;
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(SonarError::Backend("Engine not initialized".to_string()))
        }
    }
}

/// A capability that can turn sample streams into sound.
///
/// Mirrors the contract of an external audio engine: initialise with a
/// sample rate, play single tones, render a stream to a WAV file, shut down.
pub trait RenderBackend {
    /// Human-readable backend name, used in logs
    fn name(&self) -> &str;

    fn init(&mut self, sample_rate: u32) -> Result<()>;

    fn play(&mut self, frequency: f64, amplitude: f64, duration: f64) -> Result<()>;

    fn generate_wav(&mut self, path: &Path, stream: &SampleStream) -> Result<()>;

    fn cleanup(&mut self);

    /// Master volume the backend applies, recorded in JSON metadata
    fn master_volume(&self) -> f64 {
        1.0
    }

    /// Plays every sample in order.
    fn play_stream(&mut self, stream: &SampleStream) -> Result<()> {
        for sample in stream {
            self.play(sample.frequency, sample.amplitude, sample.duration)?;
        }
        Ok(())
    }
}

/// The in-process synthesizer backed by [`Synthesizer`] and the WAV writer.
///
/// There is no audio device behind it: `play` only records the tone in the log.
#[derive(Debug, Clone, Default)]
pub struct BuiltinSynth {
    session: EngineSession,
}

impl BuiltinSynth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_master_volume(mut self, volume: f64) -> Self {
        self.session.set_master_volume(volume);
        self
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }
}

impl RenderBackend for BuiltinSynth {
    fn name(&self) -> &str {
        "builtin"
    }

    fn init(&mut self, sample_rate: u32) -> Result<()> {
        self.session.init(sample_rate)
    }

    fn play(&mut self, frequency: f64, amplitude: f64, duration: f64) -> Result<()> {
        self.session.ensure_initialized()?;
        debug!(
            "Tone {:.2} Hz at {:.2} amplitude for {:.3} s",
            frequency,
            amplitude * self.session.master_volume(),
            duration
        );
        Ok(())
    }

    fn generate_wav(&mut self, path: &Path, stream: &SampleStream) -> Result<()> {
        self.session.ensure_initialized()?;
        let pcm = Synthesizer::new(self.session.sample_rate())
            .with_gain(self.session.master_volume())
            .render(stream);
        write_wav_file(path, &pcm, self.session.sample_rate())?;
        info!("Audio saved to: {}", path.display());
        Ok(())
    }

    fn cleanup(&mut self) {
        let volume = self.session.master_volume();
        self.session.cleanup();
        // master volume is a configuration choice, not per-run state
        self.session.set_master_volume(volume);
    }

    fn master_volume(&self) -> f64 {
        self.session.master_volume()
    }
}

/// Rendering capability chosen at configuration time.
///
/// Callers go through [`Renderer::backend`] and never inspect which variant
/// they hold.
pub enum Renderer {
    Builtin(BuiltinSynth),
    External(Box<dyn RenderBackend>),
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::Builtin(BuiltinSynth::new())
    }
}

impl Renderer {
    pub fn external<B: RenderBackend + 'static>(backend: B) -> Self {
        Renderer::External(Box::new(backend))
    }

    pub fn backend(&mut self) -> &mut dyn RenderBackend {
        match self {
            Renderer::Builtin(synth) => synth,
            Renderer::External(backend) => backend.as_mut(),
        }
    }
}
