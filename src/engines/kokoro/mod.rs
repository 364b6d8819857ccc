//! Kokoro-82M text-to-speech engine.
//!
//! Converts text to speech with the Kokoro-82M ONNX model on the CPU, using
//! espeak-ng for phonemization.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//!
//! # Model Directory Layout
//!
//! The model named `tts_models/en/kokoro/v1.0` resolves to:
//!
//! ```text
//! models/tts_models/en/kokoro/v1.0/
//! ├── kokoro-quant-convinteger.onnx   # 8-bit quantized model (any *.onnx works)
//! ├── voices-v1.0.bin                  # Voice style archive (.npz format)
//! └── config.json                      # Optional vocabulary
//! ```
//!
//! Download links:
//! - Model: <https://github.com/taylorchu/kokoro-onnx/releases/tag/v0.2.0>
//! - Voices: <https://github.com/thewh1teagle/kokoro-onnx/releases/tag/model-files-v1.0>
//!
//! Voices are named `{language_prefix}_{name}`; the prefix picks the
//! espeak-ng language (`af_`/`am_` American English, `bf_`/`bm_` British
//! English, `if_`/`im_` Italian, and so on).

pub mod engine;
pub mod model;
pub mod phonemizer;
pub mod vocab;
pub mod voices;

pub use engine::{KokoroEngine, KokoroInferenceParams, KokoroModelParams};
pub use model::KokoroError;
