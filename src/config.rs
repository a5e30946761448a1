//! Pipeline configuration.
//!
//! The extraction parameters are not tunable knobs: the classifier was fit on
//! features produced with exactly these values, so changing any of them
//! silently degrades accuracy. They live in config structs so the contract is
//! written down in one place.

use std::path::PathBuf;

/// Target sample rate for the whole pipeline (Hz)
pub const SAMPLE_RATE: u32 = 16_000;

/// Fixed clip duration in seconds
pub const CLIP_DURATION_SECS: f32 = 3.5;

/// Samples per normalized clip: 16000 * 3.5
pub const CLIP_SAMPLES: usize = 56_000;

/// Number of cepstral coefficients per frame
pub const N_MFCC: usize = 40;

/// Final feature vector length: 40 coefficients x {base, delta, delta-delta}
/// x {mean, std}
pub const FEATURE_DIM: usize = N_MFCC * 6;

/// Number of emotion classes
pub const N_EMOTIONS: usize = 8;

/// RMS energy below this is treated as silence and rejected
pub const MIN_AUDIO_ENERGY: f32 = 1e-3;

/// Configuration for MFCC extraction
#[derive(Debug, Clone)]
pub struct MfccConfig {
    /// Sample rate of input audio (must be 16000 for the trained artifacts)
    pub sample_rate: u32,

    /// FFT size
    pub n_fft: usize,

    /// Hop length between frames (in samples)
    pub hop_length: usize,

    /// Number of mel filterbank bands
    pub n_mels: usize,

    /// Number of cepstral coefficients kept per frame
    pub n_mfcc: usize,

    /// Minimum frequency for the mel filterbank (Hz)
    pub fmin: f32,

    /// Maximum frequency for the mel filterbank (Hz)
    pub fmax: f32,

    /// Floor applied to power values before the dB conversion
    pub amin: f32,

    /// Dynamic range cap in dB, relative to the spectrogram maximum
    pub top_db: f32,

    /// Savitzky-Golay window width for delta features (odd)
    pub delta_width: usize,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            n_mfcc: N_MFCC,
            fmin: 0.0,
            fmax: SAMPLE_RATE as f32 / 2.0,
            amin: 1e-10,
            top_db: 80.0,
            delta_width: 9,
        }
    }
}

impl MfccConfig {
    /// Number of analysis frames produced for `n_samples` of centered input
    pub fn n_frames(&self, n_samples: usize) -> usize {
        1 + n_samples / self.hop_length
    }
}

/// Top-level pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub mfcc: MfccConfig,

    /// RMS energy gate for the silence check
    pub min_audio_energy: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mfcc: MfccConfig::default(),
            min_audio_energy: MIN_AUDIO_ENERGY,
        }
    }
}

/// Default location of the model artifact bundle
pub fn default_bundle_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".emovoice").join("models").join("emotion_bundle.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_samples() {
        assert_eq!(
            CLIP_SAMPLES,
            (SAMPLE_RATE as f32 * CLIP_DURATION_SECS) as usize
        );
    }

    #[test]
    fn test_feature_dim() {
        assert_eq!(FEATURE_DIM, 240);
    }

    #[test]
    fn test_mfcc_defaults() {
        let config = MfccConfig::default();
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.n_fft, 2048);
        assert_eq!(config.hop_length, 512);
        assert_eq!(config.n_mfcc, 40);
        assert_eq!(config.n_mels, 128);
    }

    #[test]
    fn test_frame_count_for_clip() {
        let config = MfccConfig::default();
        // 56000 samples at hop 512 with centered frames
        assert_eq!(config.n_frames(CLIP_SAMPLES), 110);
    }
}
