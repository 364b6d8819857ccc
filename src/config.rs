use std::path::PathBuf;

use derive_builder::Builder;

/// Sample rate every output file is written at.
pub const OUTPUT_SAMPLE_RATE: u32 = 22050;

/// The one pretrained model this program speaks with.
pub const DEFAULT_MODEL_NAME: &str = "tts_models/en/kokoro/v1.0";

/// Everything fixed about a synthesis run.
///
/// The binary always uses [`SynthesizerConfig::default`]; the builder exists
/// so tests and embedding code can point the run elsewhere.
///
/// ```
/// use node_voice::config::SynthesizerConfigBuilder;
///
/// let config = SynthesizerConfigBuilder::default()
///     .output_dir("/tmp/voices")
///     .build()
///     .unwrap();
/// assert_eq!(config.sample_rate, 22050);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(default, setter(into))]
pub struct SynthesizerConfig {
    /// Directory the WAV files land in.
    pub output_dir: PathBuf,
    /// Root directory pretrained models are resolved against.
    pub models_root: PathBuf,
    /// `tts_models/<language>/<dataset>/<model>`
    pub model_name: String,
    /// Voice style used for synthesis.
    pub voice: String,
    /// Speech speed multiplier.
    pub speed: f32,
    /// Sample rate of the written file.
    pub sample_rate: u32,
    /// Inference threads; `None` leaves the runtime default.
    #[builder(setter(into, strip_option))]
    pub num_threads: Option<usize>,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output_audio"),
            models_root: PathBuf::from("models"),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            voice: "af_heart".to_string(),
            speed: 1.0,
            sample_rate: OUTPUT_SAMPLE_RATE,
            num_threads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_defaults_for_unset_fields() {
        let config = SynthesizerConfigBuilder::default()
            .output_dir("elsewhere")
            .num_threads(2usize)
            .build()
            .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.models_root, PathBuf::from("models"));
        assert_eq!(config.model_name, DEFAULT_MODEL_NAME);
        assert_eq!(config.sample_rate, OUTPUT_SAMPLE_RATE);
        assert_eq!(config.num_threads, Some(2));
    }
}
