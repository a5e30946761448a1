//! MFCC extraction.
//!
//! Produces per-frame cepstral coefficients matching the configuration the
//! classifier was trained with: centered frames with reflect padding, a
//! periodic Hann window, a Slaney-scale mel filterbank with area
//! normalization, dB conversion capped at 80 dB of dynamic range, and an
//! orthonormal DCT-II.

use realfft::{RealFftPlanner, RealToComplex};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::config::MfccConfig;
use crate::error::EmotionError;

/// MFCC extractor with pre-computed filterbank, window, and DCT basis
pub struct MfccExtractor {
    config: MfccConfig,
    fft: Arc<dyn RealToComplex<f32>>,
    mel_filterbank: Vec<Vec<f32>>,
    window: Vec<f32>,
    dct_basis: Vec<Vec<f32>>,
}

impl MfccExtractor {
    /// Create a new extractor with the given configuration
    pub fn new(config: MfccConfig) -> Self {
        // Periodic Hann window over the full FFT size
        let window: Vec<f32> = (0..config.n_fft)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / config.n_fft as f32).cos()))
            .collect();

        let mel_filterbank = create_mel_filterbank(
            config.n_mels,
            config.n_fft / 2 + 1,
            config.sample_rate as f32,
            config.fmin,
            config.fmax,
        );

        let dct_basis = create_dct_basis(config.n_mfcc, config.n_mels);

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(config.n_fft);

        Self {
            config,
            fft,
            mel_filterbank,
            window,
            dct_basis,
        }
    }

    /// Compute MFCCs for a mono 16 kHz waveform.
    ///
    /// Returns coefficient-major data: `out[c][t]` is coefficient `c` at
    /// frame `t`, with `n_mfcc` rows and `1 + len / hop_length` frames.
    pub fn compute(&self, audio: &[f32]) -> Result<Vec<Vec<f32>>, EmotionError> {
        if audio.is_empty() {
            return Err(EmotionError::InvalidAudio("empty waveform".to_string()));
        }

        let n_fft = self.config.n_fft;
        let n_bins = n_fft / 2 + 1;
        let pad = n_fft / 2;
        let n_frames = self.config.n_frames(audio.len());

        // Centered analysis: frame t is the window around sample t * hop
        let padded = reflect_pad(audio, pad);

        let mut fft_input = vec![0.0f32; n_fft];
        let mut fft_output = vec![realfft::num_complex::Complex::new(0.0f32, 0.0); n_bins];
        let mut scratch = self.fft.make_scratch_vec();
        let mut power_spec = vec![0.0f32; n_bins];

        // Log-mel spectrogram, mel-band major
        let mut log_mel = vec![vec![0.0f32; n_frames]; self.config.n_mels];
        let mut db_max = f32::NEG_INFINITY;

        for frame_idx in 0..n_frames {
            let start = frame_idx * self.config.hop_length;
            for (i, x) in fft_input.iter_mut().enumerate() {
                *x = padded[start + i] * self.window[i];
            }

            self.fft
                .process_with_scratch(&mut fft_input, &mut fft_output, &mut scratch)
                .map_err(|e| EmotionError::InvalidAudio(format!("FFT failed: {}", e)))?;

            for (p, c) in power_spec.iter_mut().zip(fft_output.iter()) {
                *p = c.re * c.re + c.im * c.im;
            }

            for (band, filter) in self.mel_filterbank.iter().enumerate() {
                let energy: f32 = filter
                    .iter()
                    .zip(power_spec.iter())
                    .map(|(f, p)| f * p)
                    .sum();
                let db = 10.0 * energy.max(self.config.amin).log10();
                db_max = db_max.max(db);
                log_mel[band][frame_idx] = db;
            }
        }

        // Cap dynamic range relative to the spectrogram maximum
        let floor = db_max - self.config.top_db;
        for row in log_mel.iter_mut() {
            for v in row.iter_mut() {
                *v = v.max(floor);
            }
        }

        // DCT-II along the mel axis, keep the first n_mfcc coefficients
        let mut mfcc = vec![vec![0.0f32; n_frames]; self.config.n_mfcc];
        for (c, basis) in self.dct_basis.iter().enumerate() {
            for t in 0..n_frames {
                let mut sum = 0.0f32;
                for (m, &w) in basis.iter().enumerate() {
                    sum += w * log_mel[m][t];
                }
                mfcc[c][t] = sum;
            }
        }

        Ok(mfcc)
    }

    pub fn config(&self) -> &MfccConfig {
        &self.config
    }
}

/// Pad a signal on both sides by reflecting around the endpoints
/// (no edge repetition), bouncing for signals shorter than the pad.
fn reflect_pad(audio: &[f32], pad: usize) -> Vec<f32> {
    let n = audio.len();
    let mut out = Vec::with_capacity(n + 2 * pad);
    for i in 0..n + 2 * pad {
        out.push(audio[reflect_index(i as isize - pad as isize, n)]);
    }
    out
}

fn reflect_index(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let mut j = i.rem_euclid(period);
    if j >= n as isize {
        j = period - j;
    }
    j as usize
}

/// Convert frequency to the Slaney mel scale (linear below 1 kHz,
/// logarithmic above)
fn hz_to_mel(hz: f32) -> f32 {
    const MIN_LOG_HZ: f32 = 1000.0;
    const MIN_LOG_MEL: f32 = 15.0;
    // ln(6.4) / 27
    const LOG_STEP: f32 = 0.068_751_78;

    if hz < MIN_LOG_HZ {
        hz * 3.0 / 200.0
    } else {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / LOG_STEP
    }
}

/// Convert Slaney mel scale back to frequency
fn mel_to_hz(mel: f32) -> f32 {
    const MIN_LOG_HZ: f32 = 1000.0;
    const MIN_LOG_MEL: f32 = 15.0;
    const LOG_STEP: f32 = 0.068_751_78;

    if mel < MIN_LOG_MEL {
        mel * 200.0 / 3.0
    } else {
        MIN_LOG_HZ * ((mel - MIN_LOG_MEL) * LOG_STEP).exp()
    }
}

/// Create a Slaney-normalized triangular mel filterbank.
///
/// Each filter is a triangle in the frequency domain between three adjacent
/// mel-spaced center frequencies, scaled by 2 / bandwidth so filters have
/// equal area.
fn create_mel_filterbank(
    n_mels: usize,
    n_fft_bins: usize,
    sample_rate: f32,
    fmin: f32,
    fmax: f32,
) -> Vec<Vec<f32>> {
    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);

    // n_mels + 2 mel-spaced points converted back to Hz
    let hz_points: Vec<f32> = (0..=n_mels + 1)
        .map(|i| mel_min + (mel_max - mel_min) * (i as f32) / ((n_mels + 1) as f32))
        .map(mel_to_hz)
        .collect();

    // Center frequency of each FFT bin
    let fft_freqs: Vec<f32> = (0..n_fft_bins)
        .map(|k| k as f32 * sample_rate / (2.0 * (n_fft_bins as f32 - 1.0)))
        .collect();

    let mut filterbank = Vec::with_capacity(n_mels);
    for i in 0..n_mels {
        let left = hz_points[i];
        let center = hz_points[i + 1];
        let right = hz_points[i + 2];
        let norm = 2.0 / (right - left);

        let filter: Vec<f32> = fft_freqs
            .iter()
            .map(|&f| {
                let rising = (f - left) / (center - left);
                let falling = (right - f) / (right - center);
                rising.min(falling).max(0.0) * norm
            })
            .collect();

        filterbank.push(filter);
    }

    filterbank
}

/// Orthonormal DCT-II basis: `n_mfcc` rows over `n_mels` inputs
fn create_dct_basis(n_mfcc: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let mut basis = Vec::with_capacity(n_mfcc);
    for c in 0..n_mfcc {
        let norm = if c == 0 {
            (1.0 / n_mels as f32).sqrt()
        } else {
            (2.0 / n_mels as f32).sqrt()
        };
        let row: Vec<f32> = (0..n_mels)
            .map(|m| norm * (PI * c as f32 * (m as f32 + 0.5) / n_mels as f32).cos())
            .collect();
        basis.push(row);
    }
    basis
}
