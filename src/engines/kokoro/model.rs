use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView2};
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::phonemizer::{EspeakConfig, Phonemizer};
use super::voices::{VoiceStore, STYLE_DIM};

/// Maximum number of phoneme tokens per inference call (before padding).
pub const MAX_PHONEME_LEN: usize = 510;

/// Output sample rate of the Kokoro model.
pub const SAMPLE_RATE: u32 = 24000;

/// Preferred model file inside the model directory.
const PREFERRED_ONNX: &str = "kokoro-quant-convinteger.onnx";

const VOICES_FILE: &str = "voices-v1.0.bin";

/// Crossfade (in samples) used when joining chunk audio.
const CHUNK_CROSSFADE_SAMPLES: usize = 240; // 10ms @ 24kHz

#[derive(thiserror::Error, Debug)]
pub enum KokoroError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Model file missing: {0}")]
    MissingFile(PathBuf),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("Text {0:?} produced no speakable phonemes")]
    NoPhonemes(String),
    #[error("Voice '{0}' not found. Call list_voices() to see available voices.")]
    VoiceNotFound(String),
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
    #[error("Invalid config.json: {0}")]
    Config(String),
    #[error("Failed to parse voice file: {0}")]
    VoiceParse(String),
    #[error("Model produced no output tensor")]
    NoOutput,
}

/// How the loaded graph names and types its inputs.
///
/// Exported Kokoro graphs differ: older ones call the token input `tokens`
/// and take a float speed, newer ones use `input_ids` and an int32 speed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InputLayout {
    tokens: String,
    speed_is_int32: bool,
}

impl InputLayout {
    fn detect(session: &Session) -> Self {
        let tokens = session
            .inputs()
            .iter()
            .map(|input| input.name())
            .find(|name| *name == "input_ids" || *name == "tokens")
            .unwrap_or("input_ids")
            .to_string();

        let speed_is_int32 = session
            .inputs()
            .iter()
            .find(|input| input.name() == "speed")
            .map(|input| format!("{:?}", input.dtype()).to_lowercase().contains("int32"))
            .unwrap_or(true);

        Self {
            tokens,
            speed_is_int32,
        }
    }
}

/// A loaded Kokoro ONNX session with its voices and vocabulary.
pub struct KokoroModel {
    session: Session,
    voices: VoiceStore,
    phonemizer: Phonemizer,
    layout: InputLayout,
    /// Token ids a long sequence may be split after.
    split_ids: Vec<i64>,
}

impl KokoroModel {
    /// Load the model directory.
    ///
    /// Expects an `.onnx` graph (preferably `kokoro-quant-convinteger.onnx`),
    /// the `voices-v1.0.bin` archive, and optionally `config.json` carrying
    /// the vocabulary. Execution is CPU-only and nothing is cached between
    /// loads.
    pub fn load(
        model_dir: &Path,
        num_threads: Option<usize>,
        espeak: EspeakConfig,
    ) -> Result<Self, KokoroError> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!("Loading Kokoro graph from {}", onnx_path.display());

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers([CPUExecutionProvider::default().build()])?;
        if let Some(threads) = num_threads {
            builder = builder
                .with_intra_threads(threads)?
                .with_inter_threads(threads)?;
        }
        let session = builder.commit_from_file(&onnx_path)?;

        let layout = InputLayout::detect(&session);
        log::debug!("Kokoro input layout: {:?}", layout);

        let voices_path = model_dir.join(VOICES_FILE);
        if !voices_path.exists() {
            return Err(KokoroError::MissingFile(voices_path));
        }
        let voices = VoiceStore::load(&voices_path)?;

        let config_path = model_dir.join("config.json");
        let vocab = if config_path.exists() {
            super::vocab::load_vocab(&config_path)?
        } else {
            log::warn!("config.json not found, using built-in vocab");
            super::vocab::builtin_vocab()
        };

        let phonemizer = Phonemizer::new(vocab, espeak);
        let split_ids = phonemizer.clause_break_ids();

        Ok(Self {
            session,
            voices,
            phonemizer,
            layout,
            split_ids,
        })
    }

    /// Synthesize `text` with `voice` at `speed`.
    ///
    /// Fails with [`KokoroError::NoPhonemes`] when the text yields nothing to
    /// speak, e.g. an empty string.
    pub fn synthesize_text(
        &mut self,
        text: &str,
        voice: &str,
        speed: f32,
    ) -> Result<Vec<f32>, KokoroError> {
        let ids = self.phonemizer.tokenize(text, voice)?;
        if ids.is_empty() {
            return Err(KokoroError::NoPhonemes(text.to_string()));
        }

        // The style row is picked from the full sequence length so every
        // chunk of a long text shares the same prosody.
        let style = self.voices.style(voice, ids.len())?;

        let chunks = split_chunks(&ids, MAX_PHONEME_LEN, &self.split_ids);
        if chunks.len() > 1 {
            log::debug!(
                "{} phoneme tokens exceed {}, synthesizing {} chunks",
                ids.len(),
                MAX_PHONEME_LEN,
                chunks.len()
            );
        }

        let mut combined = Vec::with_capacity(ids.len() * 300);
        for chunk in chunks {
            let audio = self.infer(chunk, &style, speed)?;
            append_with_crossfade(&mut combined, &audio, CHUNK_CROSSFADE_SAMPLES);
        }
        Ok(combined)
    }

    /// Run the graph once on `tokens`, padded with a zero on each side.
    fn infer(
        &mut self,
        tokens: &[i64],
        style: &[f32; STYLE_DIM],
        speed: f32,
    ) -> Result<Vec<f32>, KokoroError> {
        let padded: Vec<i64> = std::iter::once(0)
            .chain(tokens.iter().copied())
            .chain(std::iter::once(0))
            .collect();
        let tokens_arr = Array2::from_shape_vec((1, padded.len()), padded)?;
        let style_view = ArrayView2::from_shape((1, STYLE_DIM), style.as_slice())?;

        let tokens_name = self.layout.tokens.as_str();
        let outputs = if self.layout.speed_is_int32 {
            let speed_arr = ndarray::arr1(&[speed.round() as i32]);
            let inputs = inputs![
                tokens_name => TensorRef::from_array_view(tokens_arr.view())?,
                "style" => TensorRef::from_array_view(style_view)?,
                "speed" => TensorRef::from_array_view(speed_arr.view())?,
            ];
            self.session.run(inputs)?
        } else {
            let speed_arr = ndarray::arr1(&[speed]);
            let inputs = inputs![
                tokens_name => TensorRef::from_array_view(tokens_arr.view())?,
                "style" => TensorRef::from_array_view(style_view)?,
                "speed" => TensorRef::from_array_view(speed_arr.view())?,
            ];
            self.session.run(inputs)?
        };

        let (_, waveform) = outputs.iter().next().ok_or(KokoroError::NoOutput)?;
        let waveform = waveform.try_extract_array::<f32>()?;
        Ok(waveform.iter().copied().collect())
    }

    /// Voice names available in the loaded archive, sorted.
    pub fn list_voices(&self) -> Vec<&str> {
        self.voices.names()
    }
}

/// Locate the `.onnx` graph, preferring the quantized export.
fn find_onnx_file(model_dir: &Path) -> Result<PathBuf, KokoroError> {
    let preferred = model_dir.join(PREFERRED_ONNX);
    if preferred.exists() {
        return Ok(preferred);
    }
    if !model_dir.is_dir() {
        return Err(KokoroError::MissingFile(model_dir.to_path_buf()));
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(model_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("onnx"))
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| KokoroError::MissingFile(model_dir.join(PREFERRED_ONNX)))
}

/// Split `ids` into runs of at most `max_len`, cutting after the last
/// `split_ids` token in each window when there is one.
fn split_chunks<'a>(ids: &'a [i64], max_len: usize, split_ids: &[i64]) -> Vec<&'a [i64]> {
    let mut chunks = Vec::new();
    let mut rest = ids;

    while rest.len() > max_len {
        let window = &rest[..max_len];
        let cut = window
            .iter()
            .rposition(|id| split_ids.contains(id))
            .map(|i| i + 1)
            .unwrap_or(max_len);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Append `src` to `dst`, linearly blending up to `crossfade` overlapping samples.
fn append_with_crossfade(dst: &mut Vec<f32>, src: &[f32], crossfade: usize) {
    let overlap = crossfade.min(dst.len()).min(src.len());
    let start = dst.len() - overlap;
    for (i, (d, s)) in dst[start..].iter_mut().zip(&src[..overlap]).enumerate() {
        let t = (i + 1) as f32 / (overlap + 1) as f32;
        *d = *d * (1.0 - t) + s * t;
    }
    dst.extend_from_slice(&src[overlap..]);
}
