//! Audio-to-feature pipeline: MFCCs plus their first and second time
//! derivatives, reduced to per-coefficient summary statistics.

pub mod delta;
pub mod mfcc;

pub use mfcc::MfccExtractor;

use crate::config::{FEATURE_DIM, MfccConfig};
use crate::error::EmotionError;
use delta::delta;

/// Turns a fixed-length waveform into the 240-dimensional descriptor the
/// classifier expects.
pub struct FeatureExtractor {
    mfcc: MfccExtractor,
    delta_width: usize,
}

impl FeatureExtractor {
    pub fn new(config: MfccConfig) -> Self {
        let delta_width = config.delta_width;
        Self {
            mfcc: MfccExtractor::new(config),
            delta_width,
        }
    }

    /// Extract the feature vector for a normalized waveform.
    ///
    /// Layout is fixed and must match the order the scaler and classifier
    /// were fit with:
    /// `[mfcc means | mfcc stds | delta means | delta stds | delta2 means | delta2 stds]`,
    /// 40 values per block.
    pub fn extract(&self, waveform: &[f32]) -> Result<Vec<f32>, EmotionError> {
        let mfcc = self.mfcc.compute(waveform)?;
        let d1 = delta(&mfcc, self.delta_width, 1);
        let d2 = delta(&mfcc, self.delta_width, 2);

        let mut features = Vec::with_capacity(FEATURE_DIM);
        for block in [&mfcc, &d1, &d2] {
            for row in block.iter() {
                features.push(mean(row));
            }
            for row in block.iter() {
                features.push(std_dev(row));
            }
        }

        debug_assert_eq!(features.len(), FEATURE_DIM);
        Ok(features)
    }
}

/// Mean across frames, accumulated in f64
fn mean(row: &[f32]) -> f32 {
    if row.is_empty() {
        return 0.0;
    }
    (row.iter().map(|&x| x as f64).sum::<f64>() / row.len() as f64) as f32
}

/// Population standard deviation across frames (no sample correction,
/// matching the training-time statistics)
fn std_dev(row: &[f32]) -> f32 {
    if row.is_empty() {
        return 0.0;
    }
    let m = row.iter().map(|&x| x as f64).sum::<f64>() / row.len() as f64;
    let var = row
        .iter()
        .map(|&x| {
            let d = x as f64 - m;
            d * d
        })
        .sum::<f64>()
        / row.len() as f64;
    var.sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CLIP_SAMPLES;
    use std::f32::consts::PI;

    fn tone(freq: f32) -> Vec<f32> {
        (0..CLIP_SAMPLES)
            .map(|i| (2.0 * PI * freq * i as f32 / 16000.0).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_feature_length_invariant() {
        let extractor = FeatureExtractor::new(MfccConfig::default());
        let features = extractor.extract(&tone(440.0)).unwrap();
        assert_eq!(features.len(), 240);
    }

    #[test]
    fn test_feature_length_for_degenerate_input() {
        // All-zero window is computable and still 240-dimensional
        let extractor = FeatureExtractor::new(MfccConfig::default());
        let features = extractor.extract(&vec![0.0f32; CLIP_SAMPLES]).unwrap();
        assert_eq!(features.len(), 240);
        assert!(features.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_extraction_deterministic() {
        let extractor = FeatureExtractor::new(MfccConfig::default());
        let wave = tone(440.0);
        let a = extractor.extract(&wave).unwrap();
        let b = extractor.extract(&wave).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_std_blocks_are_non_negative() {
        let extractor = FeatureExtractor::new(MfccConfig::default());
        let features = extractor.extract(&tone(880.0)).unwrap();
        // Blocks 40..80, 120..160, 200..240 hold standard deviations
        for range in [40..80, 120..160, 200..240] {
            assert!(features[range].iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn test_mean_and_std_helpers() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        // Population std of [1, 2, 3] is sqrt(2/3)
        assert!((std_dev(&[1.0, 2.0, 3.0]) - (2.0f32 / 3.0).sqrt()).abs() < 1e-6);
        assert_eq!(std_dev(&[5.0; 10]), 0.0);
    }

    #[test]
    fn test_different_signals_differ() {
        let extractor = FeatureExtractor::new(MfccConfig::default());
        let a = extractor.extract(&tone(200.0)).unwrap();
        let b = extractor.extract(&tone(2000.0)).unwrap();
        assert_ne!(a, b);
    }
}
