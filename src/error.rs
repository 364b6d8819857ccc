/// Errors raised outside the synthesis engine itself.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Usage: {0} <node_id> <percent_encoded_text>")]
    Usage(String),
    #[error("Invalid model name '{0}', expected tts_models/<language>/<dataset>/<model>")]
    InvalidModelName(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Resampling failed: {0}")]
    Resample(String),
}

pub type Result<T> = std::result::Result<T, Error>;
