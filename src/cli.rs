//! Command-line surface: argument validation, text decoding and output naming.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Program name shown in the usage line when argv is empty.
const DEFAULT_PROGRAM: &str = "synthesizer";

/// A validated request to synthesize one node's track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Opaque token naming the output file.
    pub node_id: String,
    /// Text to speak, already percent-decoded.
    pub text: String,
}

impl Invocation {
    /// Build an invocation from the full argv, program name included.
    ///
    /// Exactly two positional arguments must follow the program name:
    /// the node id and the percent-encoded text.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let program = args
            .first()
            .map(|p| p.as_ref().to_string())
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());

        match args.as_slice() {
            [_, node_id, encoded] => Ok(Self {
                node_id: node_id.as_ref().to_string(),
                text: decode_text(encoded.as_ref()),
            }),
            _ => Err(Error::Usage(program)),
        }
    }

    /// Path of the WAV file this invocation writes under `dir`.
    pub fn output_path(&self, dir: &Path) -> PathBuf {
        output_path(dir, &self.node_id)
    }
}

/// Percent-decode `encoded`. Invalid UTF-8 becomes U+FFFD; `+` stays `+`.
pub fn decode_text(encoded: &str) -> String {
    let bytes = urlencoding::decode_binary(encoded.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Percent-encode `plain`, leaving only `A-Z a-z 0-9 - _ . ~` unescaped.
pub fn encode_text(plain: &str) -> String {
    urlencoding::encode(plain).into_owned()
}

/// `dir/output_<node_id>.wav`
pub fn output_path(dir: &Path, node_id: &str) -> PathBuf {
    dir.join(format!("output_{node_id}.wav"))
}

/// Line printed once the file for a node has been written.
pub fn confirmation(path: &Path) -> String {
    format!("Audio generato: {}", path.display())
}

/// Create the output directory (and parents) if it does not exist yet.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}
