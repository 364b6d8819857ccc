use std::path::{Path, PathBuf};

use crate::config::SynthesizerConfig;
use crate::{SynthesisEngine, SynthesisResult};

use super::model::{KokoroError, KokoroModel, SAMPLE_RATE};
use super::phonemizer::EspeakConfig;

/// Parameters for loading a Kokoro model.
#[derive(Debug, Clone, Default)]
pub struct KokoroModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
}

impl From<&SynthesizerConfig> for KokoroModelParams {
    fn from(config: &SynthesizerConfig) -> Self {
        Self {
            num_threads: config.num_threads,
        }
    }
}

/// Parameters for one Kokoro synthesis request.
#[derive(Debug, Clone)]
pub struct KokoroInferenceParams {
    /// Voice name (e.g. `"af_heart"`, `"bf_emma"`).
    pub voice: String,
    /// Speech speed multiplier, 1.0 is normal.
    pub speed: f32,
}

impl Default for KokoroInferenceParams {
    fn default() -> Self {
        Self::from(&SynthesizerConfig::default())
    }
}

impl From<&SynthesizerConfig> for KokoroInferenceParams {
    fn from(config: &SynthesizerConfig) -> Self {
        Self {
            voice: config.voice.clone(),
            speed: config.speed,
        }
    }
}

/// Kokoro text-to-speech engine.
///
/// Runs the Kokoro-82M ONNX model on the CPU. Requires espeak-ng for
/// phonemization.
///
/// ```rust,no_run
/// use node_voice::{SynthesisEngine, engines::kokoro::KokoroEngine};
/// use std::path::PathBuf;
///
/// let mut engine = KokoroEngine::new();
/// engine.load_model(&PathBuf::from("models/tts_models/en/kokoro/v1.0"))?;
/// let result = engine.synthesize("Hello, world!", None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct KokoroEngine {
    model: Option<KokoroModel>,
    model_path: Option<PathBuf>,
    espeak: EspeakConfig,
}

impl Default for KokoroEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KokoroEngine {
    /// Create an engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::with_espeak(None, None)
    }

    /// Create an engine with explicit espeak-ng binary and data paths.
    ///
    /// Either path can be `None` to fall back to the system default.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self {
            model: None,
            model_path: None,
            espeak: EspeakConfig {
                bin_path,
                data_path,
            },
        }
    }

    /// Directory of the loaded model, if any.
    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    /// List all available voice names (requires model to be loaded).
    pub fn list_voices(&self) -> Vec<&str> {
        self.model
            .as_ref()
            .map(|m| m.list_voices())
            .unwrap_or_default()
    }
}

impl SynthesisEngine for KokoroEngine {
    type SynthesisParams = KokoroInferenceParams;
    type ModelParams = KokoroModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let model = KokoroModel::load(model_path, params.num_threads, self.espeak.clone())?;
        self.model = Some(model);
        self.model_path = Some(model_path.to_path_buf());
        Ok(())
    }

    fn unload_model(&mut self) {
        self.model = None;
        self.model_path = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let model = self.model.as_mut().ok_or(KokoroError::ModelNotLoaded)?;

        let p = params.unwrap_or_default();
        let samples = model.synthesize_text(text, &p.voice, p.speed)?;

        Ok(SynthesisResult {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesizerConfigBuilder;

    #[test]
    fn params_follow_config() {
        let config = SynthesizerConfigBuilder::default()
            .voice("bf_emma")
            .speed(0.9f32)
            .num_threads(1usize)
            .build()
            .unwrap();

        let inference = KokoroInferenceParams::from(&config);
        assert_eq!(inference.voice, "bf_emma");
        assert_eq!(inference.speed, 0.9);
        assert_eq!(KokoroModelParams::from(&config).num_threads, Some(1));
    }

    #[test]
    fn default_params_match_default_config() {
        let config = SynthesizerConfig::default();
        let params = KokoroInferenceParams::default();
        assert_eq!(params.voice, config.voice);
        assert_eq!(params.speed, config.speed);
    }

    #[test]
    fn synthesize_requires_loaded_model() {
        let mut engine = KokoroEngine::new();
        let err = engine.synthesize("hello", None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KokoroError>(),
            Some(KokoroError::ModelNotLoaded)
        ));
    }

    #[test]
    fn missing_model_directory_fails_to_load() {
        let tmp = tempfile::tempdir().unwrap();
        let mut engine = KokoroEngine::new();
        let err = engine
            .load_model(&tmp.path().join("tts_models/en/kokoro/v1.0"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KokoroError>(),
            Some(KokoroError::MissingFile(_))
        ));
        assert!(engine.model_path().is_none());
        assert!(engine.list_voices().is_empty());
    }
}
