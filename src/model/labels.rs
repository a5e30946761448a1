//! Label encoding for the fixed emotion set.

use serde::{Deserialize, Serialize};

use crate::error::EmotionError;

/// The closed set of supported emotions, in training order (alphabetical)
pub const EMOTIONS: [&str; 8] = [
    "angry",
    "calm",
    "disgust",
    "fearful",
    "happy",
    "neutral",
    "sad",
    "surprised",
];

/// Bijection between classifier class indices and emotion names.
///
/// The order is fixed at training time; the constructor rejects anything
/// that does not match the canonical set exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelEncoder {
    labels: Vec<String>,
}

impl LabelEncoder {
    pub fn new(labels: Vec<String>) -> Result<Self, EmotionError> {
        if labels.len() != EMOTIONS.len() {
            return Err(EmotionError::InvalidBundle(format!(
                "expected {} labels, got {}",
                EMOTIONS.len(),
                labels.len()
            )));
        }
        for (got, expected) in labels.iter().zip(EMOTIONS.iter()) {
            if got != expected {
                return Err(EmotionError::InvalidBundle(format!(
                    "unexpected label '{}' (expected '{}')",
                    got, expected
                )));
            }
        }
        Ok(Self { labels })
    }

    /// Canonical encoder for the fixed emotion set
    pub fn canonical() -> Self {
        Self {
            labels: EMOTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Emotion name for a class index
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
