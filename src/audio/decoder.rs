//! WAV decoding and input validation.
//!
//! Accepts PCM integer and IEEE float WAV containers with any channel count
//! and sample rate. Output is always mono f32 at 16 kHz. Undecodable, empty,
//! and near-silent inputs are rejected here so the classifier never sees them.

use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use tracing::debug;

use crate::audio::resampler::resample_to_target;
use crate::config::SAMPLE_RATE;
use crate::error::EmotionError;

/// Decode an in-memory WAV buffer into a validated mono 16 kHz waveform.
pub fn decode(bytes: &[u8], min_energy: f32) -> Result<Vec<f32>, EmotionError> {
    if bytes.is_empty() {
        return Err(EmotionError::InvalidAudio("empty byte buffer".to_string()));
    }

    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| EmotionError::InvalidAudio(format!("not a decodable WAV container: {}", e)))?;

    let spec = reader.spec();
    debug!(
        "Decoding WAV: {} Hz, {} channels, {} bits, {:?}",
        spec.sample_rate, spec.channels, spec.bits_per_sample, spec.sample_format
    );

    let samples = read_samples(&mut reader)?;
    if samples.is_empty() {
        return Err(EmotionError::InvalidAudio("decoded signal is empty".to_string()));
    }

    let mono = downmix(&samples, spec.channels as usize);

    let waveform = if spec.sample_rate != SAMPLE_RATE {
        resample_to_target(&mono, spec.sample_rate)?
    } else {
        mono
    };

    // Silence gate runs on the full decoded signal, before windowing
    let energy = rms_energy(&waveform);
    if energy < min_energy {
        return Err(EmotionError::InvalidAudio(format!(
            "signal is silent or near-silent (RMS {:.2e} below {:.2e})",
            energy, min_energy
        )));
    }

    Ok(waveform)
}

/// Read interleaved samples as f32 in [-1.0, 1.0]
fn read_samples(reader: &mut WavReader<Cursor<&[u8]>>) -> Result<Vec<f32>, EmotionError> {
    let spec = reader.spec();

    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect(),
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    };

    samples.map_err(|e| EmotionError::InvalidAudio(format!("corrupt WAV data: {}", e)))
}

/// Collapse interleaved multi-channel audio to mono by averaging
fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Root-mean-square energy of a signal
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer
                    .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn sine(freq: f32, secs: f32, sample_rate: u32) -> Vec<f32> {
        (0..(secs * sample_rate as f32) as usize)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_decode_mono_16k() {
        let samples = sine(440.0, 1.0, 16000);
        let bytes = wav_bytes(&samples, 16000, 1);

        let wave = decode(&bytes, 1e-3).unwrap();
        assert_eq!(wave.len(), 16000);
        // RMS of a 0.5-amplitude sine is ~0.354
        assert!((rms_energy(&wave) - 0.354).abs() < 0.01);
    }

    #[test]
    fn test_decode_stereo_downmix() {
        let mono = sine(440.0, 0.5, 16000);
        let interleaved: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();
        let bytes = wav_bytes(&interleaved, 16000, 2);

        let wave = decode(&bytes, 1e-3).unwrap();
        assert_eq!(wave.len(), mono.len());
    }

    #[test]
    fn test_decode_resamples_other_rates() {
        let samples = sine(440.0, 1.0, 44100);
        let bytes = wav_bytes(&samples, 44100, 1);

        let wave = decode(&bytes, 1e-3).unwrap();
        // Output should land close to one second at 16 kHz
        assert!((wave.len() as i64 - 16000).unsigned_abs() < 200);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let result = decode(&[], 1e-3);
        assert!(matches!(result, Err(EmotionError::InvalidAudio(_))));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = decode(b"definitely not a wav file", 1e-3);
        assert!(matches!(result, Err(EmotionError::InvalidAudio(_))));
    }

    #[test]
    fn test_silence_rejected() {
        let samples = vec![0.0f32; 16000];
        let bytes = wav_bytes(&samples, 16000, 1);

        let result = decode(&bytes, 1e-3);
        assert!(matches!(result, Err(EmotionError::InvalidAudio(_))));
    }

    #[test]
    fn test_rms_energy() {
        assert_eq!(rms_energy(&[]), 0.0);
        assert_eq!(rms_energy(&[0.0; 100]), 0.0);
        let e = rms_energy(&[1.0, -1.0, 1.0, -1.0]);
        assert!((e - 1.0).abs() < 1e-6);
    }
}
