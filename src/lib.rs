//! # node-voice
//!
//! Synthesizes one spoken-text track per node and writes it to
//! `output_audio/output_<node_id>.wav` at 22050 Hz.
//!
//! ## Features
//!
//! - **Kokoro TTS**: CPU inference of the Kokoro-82M ONNX model (feature `kokoro`)
//! - **Percent-encoded input**: text arrives URL-encoded on the command line
//! - **Fixed output contract**: mono 16-bit PCM WAV, resampled to 22050 Hz
//!
//! ## Quick Start
//!
//! ```text
//! synthesizer 5 Hello%20world
//! Audio generato: output_audio/output_5.wav
//! ```
//!
//! ```ignore
//! use node_voice::{cli::Invocation, config::SynthesizerConfig, engines::kokoro::KokoroEngine};
//!
//! let invocation = Invocation::from_args(["synthesizer", "5", "Hello%20world"])?;
//! let mut engine = KokoroEngine::new();
//! let path = node_voice::run(&invocation, &SynthesizerConfig::default(), &mut engine)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod engines;
pub mod error;
pub mod model_name;
pub mod wav;

use std::path::{Path, PathBuf};

pub use error::Error;

use cli::Invocation;
use config::SynthesizerConfig;
use model_name::ModelName;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate the model produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for Kokoro)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio as a 16-bit PCM WAV file at `sample_rate`.
    pub fn write_wav(
        &self,
        path: &Path,
        sample_rate: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        wav::write_wav(path, self, sample_rate)?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// Both parameter types are derived from a [`SynthesizerConfig`], which is how
/// [`run`] drives any engine without knowing its knobs.
pub trait SynthesisEngine {
    /// Parameters for configuring inference behavior (voice, speed, etc.)
    type SynthesisParams: for<'a> From<&'a SynthesizerConfig>;
    /// Parameters for configuring model loading (threads, etc.)
    type ModelParams: Default + for<'a> From<&'a SynthesizerConfig>;

    /// Load a model from the specified path using default parameters.
    fn load_model(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load a model from the specified path with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>>;

    /// Synthesize speech from the given text and write it to a WAV file at `sample_rate`.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        sample_rate: u32,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(text, params)?.write_wav(wav_path, sample_rate)
    }
}

/// Synthesize `invocation.text` and write it to the node's output file.
///
/// Creates the output directory, loads the configured model into `engine`,
/// synthesizes, and writes the WAV at `config.sample_rate`. Returns the path
/// that was written. The model is unloaded again before returning.
pub fn run<E: SynthesisEngine>(
    invocation: &Invocation,
    config: &SynthesizerConfig,
    engine: &mut E,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    cli::prepare_output_dir(&config.output_dir)?;
    let output_path = invocation.output_path(&config.output_dir);

    let model: ModelName = config.model_name.parse()?;
    let model_dir = model.resolve(&config.models_root);
    log::info!("Loading {} from {}", model, model_dir.display());
    engine.load_model_with_params(&model_dir, E::ModelParams::from(config))?;

    let waveform = engine.synthesize(&invocation.text, Some(E::SynthesisParams::from(config)));
    engine.unload_model();
    let waveform = waveform?;
    log::info!(
        "Node {}: synthesized {:.2}s of audio",
        invocation.node_id,
        waveform.duration_secs()
    );

    waveform.write_wav(&output_path, config.sample_rate)?;
    Ok(output_path)
}
