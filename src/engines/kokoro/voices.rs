use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::KokoroError;

/// Length of one Kokoro style vector.
pub const STYLE_DIM: usize = 256;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Style vectors for every voice in a `voices-*.bin` archive.
///
/// Each voice holds one style row per phoneme-sequence length; the row for
/// a sequence of `n` tokens is `rows[n]`, clamped to the last row.
pub struct VoiceStore {
    voices: HashMap<String, Vec<[f32; STYLE_DIM]>>,
}

impl VoiceStore {
    /// Read an `.npz` archive whose entries are `<voice>.npy` float32 arrays.
    pub fn load(path: &Path) -> Result<Self, KokoroError> {
        let mut archive = zip::ZipArchive::new(File::open(path)?)
            .map_err(|e| KokoroError::VoiceParse(format!("{}: {e}", path.display())))?;

        let mut voices = HashMap::new();
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| KokoroError::VoiceParse(format!("entry {i}: {e}")))?;
            if entry.is_dir() {
                continue;
            }

            let entry_name = entry.name().to_string();
            let voice = entry_name.trim_end_matches(".npy");
            if voice.is_empty() {
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            voices.insert(voice.to_string(), parse_npy(&data, &entry_name)?);
        }

        log::info!("Loaded {} voices from {}", voices.len(), path.display());
        Ok(Self { voices })
    }

    /// Style row for `voice` at sequence length `len`.
    pub fn style(&self, voice: &str, len: usize) -> Result<[f32; STYLE_DIM], KokoroError> {
        let rows = self
            .voices
            .get(voice)
            .filter(|rows| !rows.is_empty())
            .ok_or_else(|| KokoroError::VoiceNotFound(voice.to_string()))?;
        Ok(rows[len.min(rows.len() - 1)])
    }

    /// Voice names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.voices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Decode a little-endian float32 `.npy` of shape `[N, 256]` (or `[N, 1, 256]`).
fn parse_npy(data: &[u8], name: &str) -> Result<Vec<[f32; STYLE_DIM]>, KokoroError> {
    let fail = |msg: String| KokoroError::VoiceParse(format!("{name}: {msg}"));

    if data.len() < 10 || !data.starts_with(NPY_MAGIC) {
        return Err(fail("not a .npy file".to_string()));
    }

    // v1 headers carry a u16 length at [8..10], v2+ a u32 at [8..12].
    let (header_len, prefix) = match data[6] {
        1 => (u16::from_le_bytes([data[8], data[9]]) as usize, 10),
        _ if data.len() >= 12 => (
            u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize,
            12,
        ),
        _ => return Err(fail("header truncated".to_string())),
    };

    let body = data
        .get(prefix + header_len..)
        .ok_or_else(|| fail(format!("header claims {header_len} bytes")))?;
    if body.len() % (4 * STYLE_DIM) != 0 {
        return Err(fail(format!(
            "{} data bytes is not a whole number of {STYLE_DIM}-float rows",
            body.len()
        )));
    }

    Ok(body
        .chunks_exact(4 * STYLE_DIM)
        .map(|row| {
            let mut style = [0f32; STYLE_DIM];
            for (dst, bytes) in style.iter_mut().zip(row.chunks_exact(4)) {
                *dst = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            style
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npy(rows: usize, fill: impl Fn(usize) -> f32) -> Vec<u8> {
        let header = b"{'descr': '<f4', 'fortran_order': False, 'shape': (1, 256), }\n";
        let mut data = NPY_MAGIC.to_vec();
        data.extend_from_slice(&[1, 0]);
        data.extend_from_slice(&(header.len() as u16).to_le_bytes());
        data.extend_from_slice(header);
        for i in 0..rows * STYLE_DIM {
            data.extend_from_slice(&fill(i).to_le_bytes());
        }
        data
    }

    #[test]
    fn parses_rows_in_order() {
        let rows = parse_npy(&npy(2, |i| i as f32), "af_test.npy").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], 0.0);
        assert_eq!(rows[0][255], 255.0);
        assert_eq!(rows[1][0], 256.0);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = npy(1, |_| 0.0);
        data[1] = b'X';
        assert!(matches!(
            parse_npy(&data, "x.npy"),
            Err(KokoroError::VoiceParse(_))
        ));
    }

    #[test]
    fn rejects_partial_rows() {
        let mut data = npy(1, |_| 0.0);
        data.truncate(data.len() - 4);
        assert!(parse_npy(&data, "x.npy").is_err());
    }

    #[test]
    fn style_index_is_clamped() {
        let mut voices = HashMap::new();
        voices.insert(
            "af_heart".to_string(),
            parse_npy(&npy(3, |i| (i / STYLE_DIM) as f32), "af_heart.npy").unwrap(),
        );
        let store = VoiceStore { voices };

        assert_eq!(store.style("af_heart", 1).unwrap()[0], 1.0);
        assert_eq!(store.style("af_heart", 500).unwrap()[0], 2.0);
        assert!(matches!(
            store.style("bf_emma", 1),
            Err(KokoroError::VoiceNotFound(v)) if v == "bf_emma"
        ));
        assert_eq!(store.names(), vec!["af_heart"]);
    }
}
