use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::model::KokoroError;

/// Where to find espeak-ng. `None` fields fall back to `espeak-ng` on PATH
/// and its compiled-in data directory.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

/// Voice prefix → espeak-ng language.
const VOICE_LANGS: &[(&str, &str)] = &[
    ("af", "en-us"),
    ("am", "en-us"),
    ("bf", "en-gb"),
    ("bm", "en-gb"),
    ("ef", "es"),
    ("em", "es"),
    ("ff", "fr"),
    ("hf", "hi"),
    ("hm", "hi"),
    ("if", "it"),
    ("im", "it"),
    ("jf", "ja"),
    ("jm", "ja"),
    ("pf", "pt-br"),
    ("pm", "pt-br"),
    ("zf", "cmn"),
    ("zm", "cmn"),
];

/// espeak-ng language for a `{prefix}_{name}` voice; American English otherwise.
pub fn voice_lang(voice: &str) -> &'static str {
    let prefix = voice.split('_').next().unwrap_or_default();
    VOICE_LANGS
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, lang)| *lang)
        .unwrap_or("en-us")
}

const CLAUSE_BREAKS: [char; 6] = [';', ':', ',', '.', '!', '?'];

/// A run of words to phonemize, or a punctuation mark passed straight to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Words(String),
    Mark(char),
}

/// Turns text into Kokoro token ids through espeak-ng IPA output.
pub struct Phonemizer {
    vocab: HashMap<char, i64>,
    espeak: EspeakConfig,
}

impl Phonemizer {
    pub fn new(vocab: HashMap<char, i64>, espeak: EspeakConfig) -> Self {
        Self { vocab, espeak }
    }

    /// Vocab ids of `; : , . ! ?`, the tokens a long sequence may be split after.
    pub fn clause_break_ids(&self) -> Vec<i64> {
        CLAUSE_BREAKS
            .iter()
            .filter_map(|ch| self.vocab.get(ch).copied())
            .collect()
    }

    /// Token ids for `text` spoken by `voice`.
    ///
    /// Punctuation is kept as its own token so the model can pause on it.
    /// IPA symbols missing from the vocabulary are dropped.
    pub fn tokenize(&self, text: &str, voice: &str) -> Result<Vec<i64>, KokoroError> {
        let segments = segment(text);
        let words: Vec<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Words(w) => Some(w.as_str()),
                Segment::Mark(_) => None,
            })
            .collect();

        let mut word_ids = if words.is_empty() {
            Vec::new()
        } else {
            self.phonemize_all(&words, voice_lang(voice))?
        }
        .into_iter();

        let mut ids = Vec::new();
        for segment in &segments {
            match segment {
                Segment::Words(_) => ids.extend(word_ids.next().unwrap_or_default()),
                Segment::Mark(ch) => ids.extend(self.vocab.get(ch)),
            }
        }
        Ok(ids)
    }

    /// Phonemize every word run in one espeak-ng call, one line per run.
    fn phonemize_all(&self, words: &[&str], lang: &str) -> Result<Vec<Vec<i64>>, KokoroError> {
        let ipa = self.espeak_ipa(&words.join("\n"), lang)?;
        let lines: Vec<&str> = ipa.lines().collect();
        if lines.len() == words.len() {
            return Ok(lines.iter().map(|line| self.ipa_ids(line)).collect());
        }

        log::debug!(
            "espeak-ng returned {} lines for {} segments, phonemizing one at a time",
            lines.len(),
            words.len()
        );
        words
            .iter()
            .map(|w| Ok(self.ipa_ids(&self.espeak_ipa(w, lang)?)))
            .collect()
    }

    fn ipa_ids(&self, ipa: &str) -> Vec<i64> {
        ipa.lines()
            .flat_map(|line| line.trim().chars())
            .filter(|ch| *ch != '_')
            .filter_map(|ch| self.vocab.get(&ch).copied())
            .collect()
    }

    fn espeak_ipa(&self, input: &str, lang: &str) -> Result<String, KokoroError> {
        let bin = self
            .espeak
            .bin_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("espeak-ng"));
        let mut cmd = Command::new(bin);
        cmd.args(["--ipa", "--stdin", "-q", "-v", lang])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(data) = &self.espeak.data_path {
            cmd.env("ESPEAK_DATA_PATH", data);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KokoroError::EspeakNotFound,
            _ => KokoroError::Io(e),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(line_terminated(input).as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(KokoroError::PhonemizerFailed(format!(
                "espeak-ng exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// espeak-ng reads stdin line by line and under-processes an unterminated last line.
fn line_terminated(input: &str) -> String {
    if input.ends_with('\n') {
        input.to_string()
    } else {
        format!("{input}\n")
    }
}

/// Split text into word runs and punctuation marks.
///
/// Whitespace collapses to single spaces, newlines act as full stops, and a
/// `.` or `,` between two digits stays inside the number.
fn segment(text: &str) -> Vec<Segment> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut words = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        let in_number = matches!(ch, '.' | ',')
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit());

        match mark_for(ch) {
            Some(mark) if !in_number => {
                flush_words(&mut words, &mut segments);
                segments.push(Segment::Mark(mark));
            }
            _ if ch.is_whitespace() => {
                if !words.is_empty() && !words.ends_with(' ') {
                    words.push(' ');
                }
            }
            _ => words.push(ch),
        }
    }
    flush_words(&mut words, &mut segments);
    segments
}

fn flush_words(words: &mut String, segments: &mut Vec<Segment>) {
    let trimmed = words.trim();
    if !trimmed.is_empty() {
        segments.push(Segment::Words(trimmed.to_string()));
    }
    words.clear();
}

fn mark_for(ch: char) -> Option<char> {
    match ch {
        '.' | '!' | '?' | ',' | ';' | ':' | '—' | '…' | '"' | '(' | ')' | '\u{201c}'
        | '\u{201d}' => Some(ch),
        '\n' | '\r' => Some('.'),
        _ => None,
    }
}
