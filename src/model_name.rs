use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

const MODEL_TYPE: &str = "tts_models";

/// A pretrained model addressed as `tts_models/<language>/<dataset>/<model>`.
///
/// The name maps one-to-one onto a directory below a models root, e.g.
/// `tts_models/en/kokoro/v1.0` lives in `<root>/tts_models/en/kokoro/v1.0/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelName {
    pub language: String,
    pub dataset: String,
    pub model: String,
}

impl ModelName {
    /// Directory holding this model's files under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(MODEL_TYPE)
            .join(&self.language)
            .join(&self.dataset)
            .join(&self.model)
    }
}

impl FromStr for ModelName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidModelName(s.to_string());
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [MODEL_TYPE, language, dataset, model]
                if [language, dataset, model]
                    .iter()
                    .all(|p| !matches!(**p, "" | "." | "..")) =>
            {
                Ok(Self {
                    language: language.to_string(),
                    dataset: dataset.to_string(),
                    model: model.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{MODEL_TYPE}/{}/{}/{}",
            self.language, self.dataset, self.model
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_resolves() {
        let name: ModelName = "tts_models/en/kokoro/v1.0".parse().unwrap();
        assert_eq!(name.language, "en");
        assert_eq!(name.dataset, "kokoro");
        assert_eq!(name.model, "v1.0");
        assert_eq!(
            name.resolve(Path::new("models")),
            PathBuf::from("models/tts_models/en/kokoro/v1.0")
        );
        assert_eq!(name.to_string(), "tts_models/en/kokoro/v1.0");
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in [
            "",
            "kokoro",
            "tts_models/en/kokoro",
            "vocoder_models/en/kokoro/v1.0",
            "tts_models/en//v1.0",
            "tts_models/en/../v1.0",
            "tts_models/en/kokoro/v1.0/extra",
        ] {
            assert!(
                matches!(bad.parse::<ModelName>(), Err(Error::InvalidModelName(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
