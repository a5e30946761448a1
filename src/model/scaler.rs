//! Per-dimension feature standardization.
//!
//! The transform parameters were fit on training data; applying them with a
//! different feature layout silently produces garbage, so the length check
//! here is strict.

use serde::{Deserialize, Serialize};

use crate::error::EmotionError;

/// Pre-fitted affine transform: `out[i] = (in[i] - mean[i]) / scale[i]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f32>,
    scale: Vec<f32>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f32>, scale: Vec<f32>) -> Result<Self, EmotionError> {
        if mean.len() != scale.len() {
            return Err(EmotionError::InvalidBundle(format!(
                "scaler mean/scale length mismatch: {} vs {}",
                mean.len(),
                scale.len()
            )));
        }
        if scale.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(EmotionError::InvalidBundle(
                "scaler contains zero or non-finite scale values".to_string(),
            ));
        }
        Ok(Self { mean, scale })
    }

    /// Identity scaler of the given dimension
    pub fn identity(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            scale: vec![1.0; dim],
        }
    }

    /// Standardize a feature vector
    pub fn transform(&self, features: &[f32]) -> Result<Vec<f32>, EmotionError> {
        if features.len() != self.mean.len() {
            return Err(EmotionError::DimensionMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&m, &s))| (x - m) / s)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Validate deserialized parameters (the derive bypasses `new`)
    pub fn validate(&self) -> Result<(), EmotionError> {
        Self::new(self.mean.clone(), self.scale.clone()).map(|_| ())
    }
}
