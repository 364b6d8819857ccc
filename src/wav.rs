//! WAV serialization of synthesized waveforms.

use std::path::Path;

use rubato::{FftFixedIn, Resampler};

use crate::error::{Error, Result};
use crate::SynthesisResult;

const RESAMPLE_CHUNK: usize = 1024;

/// Write `waveform` as a mono 16-bit PCM WAV at `sample_rate`.
///
/// An existing file at `path` is truncated. When the model produced audio at
/// a different rate the samples are resampled first, so the header rate
/// always describes the audio.
pub fn write_wav(path: &Path, waveform: &SynthesisResult, sample_rate: u32) -> Result<()> {
    let samples = if waveform.sample_rate == sample_rate {
        waveform.samples.clone()
    } else {
        log::debug!(
            "Resampling {} samples from {}Hz to {}Hz",
            waveform.samples.len(),
            waveform.sample_rate,
            sample_rate
        );
        resample(&waveform.samples, waveform.sample_rate, sample_rate)?
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Read a WAV file back into f32 samples, mixing multichannel audio to mono.
pub fn read_wav(path: &Path) -> Result<SynthesisResult> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, hound::Error>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, hound::Error>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(SynthesisResult {
        samples,
        sample_rate: spec.sample_rate,
    })
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Resample mono audio from `source_rate` to `target_rate`.
///
/// The resampler's output delay is skipped, so the result is aligned with
/// the input and holds `len * target / source` samples.
fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == 0 || target_rate == 0 {
        return Err(Error::Resample(format!(
            "cannot resample {source_rate}Hz to {target_rate}Hz"
        )));
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let expected =
        (samples.len() as u64 * target_rate as u64 / source_rate as u64) as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        RESAMPLE_CHUNK,
        2,
        1,
    )
    .map_err(|e| Error::Resample(e.to_string()))?;
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK);
    let mut pos = 0;

    // Feed silence past the end of input until the delayed tail has come out.
    while pos < samples.len() || output.len() < expected + delay {
        let frames_needed = resampler.input_frames_next();
        let end = (pos + frames_needed).min(samples.len());

        let mut chunk = samples[pos..end].to_vec();
        chunk.resize(frames_needed, 0.0);

        let input = vec![chunk];
        let resampled = resampler
            .process(&input, None)
            .map_err(|e| Error::Resample(e.to_string()))?;
        if let Some(channel) = resampled.into_iter().next() {
            output.extend(channel);
        }

        pos = end;
    }

    output.truncate(expected + delay);
    output.drain(..delay);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_rate: u32, secs: f32) -> SynthesisResult {
        let n = (sample_rate as f32 * secs) as usize;
        let step = 440.0 * std::f32::consts::TAU / sample_rate as f32;
        let samples = (0..n).map(|i| (i as f32 * step).sin() * 0.5).collect();
        SynthesisResult {
            samples,
            sample_rate,
        }
    }

    #[test]
    fn writes_mono_pcm16_at_requested_rate() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.wav");
        let waveform = tone(22050, 0.5);

        write_wav(&path, &waveform, 22050).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        assert_eq!(reader.len() as usize, waveform.samples.len());
    }

    #[test]
    fn written_samples_read_back_within_quantization() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.wav");
        let waveform = tone(22050, 0.1);

        write_wav(&path, &waveform, 22050).unwrap();
        let back = read_wav(&path).unwrap();

        assert_eq!(back.sample_rate, 22050);
        assert_eq!(back.samples.len(), waveform.samples.len());
        for (a, b) in waveform.samples.iter().zip(&back.samples) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn resamples_model_rate_to_output_rate() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.wav");

        write_wav(&path, &tone(24000, 1.0), 22050).unwrap();

        let back = read_wav(&path).unwrap();
        assert_eq!(back.sample_rate, 22050);
        assert_eq!(back.samples.len(), 22050);
    }

    fn onset(samples: &[f32]) -> usize {
        samples.iter().position(|s| s.abs() > 0.05).unwrap()
    }

    fn last_loud(samples: &[f32]) -> usize {
        samples.iter().rposition(|s| s.abs() > 0.05).unwrap()
    }

    #[test]
    fn resampled_audio_stays_aligned() {
        // Silent first half, 200 Hz tone in the second half.
        let samples: Vec<f32> = (0..24000)
            .map(|i| {
                if i < 12000 {
                    0.0
                } else {
                    (i as f32 * 200.0 * std::f32::consts::TAU / 24000.0).sin() * 0.5
                }
            })
            .collect();

        let out = resample(&samples, 24000, 22050).unwrap();

        assert_eq!(out.len(), 22050);
        let start = onset(&out) as i64;
        assert!((start - 11025).abs() <= 8, "tone starts at {start}");
        let end = last_loud(&out) as i64;
        assert!(end >= 22050 - 16, "tone ends early at {end}");
    }

    #[test]
    fn zero_source_rate_is_an_error() {
        let waveform = SynthesisResult {
            samples: vec![0.1; 100],
            sample_rate: 0,
        };
        let tmp = tempfile::tempdir().unwrap();
        let err = write_wav(&tmp.path().join("out.wav"), &waveform, 22050).unwrap_err();
        assert!(matches!(err, Error::Resample(_)));
    }

    #[test]
    fn clamps_out_of_range_samples() {
        assert_eq!(to_pcm16(2.0), i16::MAX);
        assert_eq!(to_pcm16(-2.0), -i16::MAX);
        assert_eq!(to_pcm16(0.0), 0);
    }

    #[test]
    fn overwrites_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.wav");

        write_wav(&path, &tone(22050, 1.0), 22050).unwrap();
        write_wav(&path, &tone(22050, 0.25), 22050).unwrap();

        assert_eq!(read_wav(&path).unwrap().samples.len(), 5512);
    }

    #[test]
    fn mixes_stereo_down_to_mono() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..10 {
            writer.write_sample(0.5f32).unwrap();
            writer.write_sample(-0.1f32).unwrap();
        }
        writer.finalize().unwrap();

        let back = read_wav(&path).unwrap();
        assert_eq!(back.samples.len(), 10);
        assert!(back.samples.iter().all(|s| (s - 0.2).abs() < 1e-6));
    }
}
