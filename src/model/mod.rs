//! Model artifact handling.
//!
//! The three trained artifacts (ensemble classifier, feature scaler, label
//! encoder) are versioned and fit as a set; a scaler fit for a different
//! feature order silently produces garbage predictions. They therefore ship
//! in one JSON document and load as one atomic unit, cross-validated before
//! anything is served. The resulting [`ModelBundle`] is immutable and can be
//! shared across any number of concurrent classifications.

pub mod forest;
pub mod labels;
pub mod scaler;

pub use forest::{DecisionTree, ForestClassifier, TreeNode};
pub use labels::{LabelEncoder, EMOTIONS};
pub use scaler::StandardScaler;

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::config::FEATURE_DIM;
use crate::error::EmotionError;

/// Supported bundle schema version
pub const BUNDLE_SCHEMA_VERSION: u32 = 1;

/// Capability interface for the trained classifier.
///
/// `predict` maps a standardized feature vector to a probability
/// distribution over the emotion classes, in label-encoder order.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>, EmotionError>;
    fn n_classes(&self) -> usize;
}

/// On-disk layout of the artifact bundle
#[derive(Debug, Deserialize)]
struct BundleDocument {
    schema_version: u32,
    #[serde(default)]
    version: String,
    labels: Vec<String>,
    scaler: StandardScaler,
    classifier: ForestClassifier,
}

/// The loaded artifact set: classifier, scaler, and label encoder.
///
/// Constructed once at startup, read-only afterwards.
pub struct ModelBundle {
    pub version: String,
    pub labels: LabelEncoder,
    pub scaler: StandardScaler,
    pub classifier: Box<dyn Classifier>,
}

impl ModelBundle {
    /// Load and validate a bundle from a JSON file.
    pub fn load(path: &Path) -> Result<Self, EmotionError> {
        if !path.exists() {
            return Err(EmotionError::ModelNotLoaded(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| EmotionError::InvalidBundle(format!("failed to read bundle: {}", e)))?;
        let doc: BundleDocument = serde_json::from_str(&content)
            .map_err(|e| EmotionError::InvalidBundle(format!("failed to parse bundle: {}", e)))?;

        if doc.schema_version != BUNDLE_SCHEMA_VERSION {
            return Err(EmotionError::InvalidBundle(format!(
                "unsupported bundle schema version {} (expected {})",
                doc.schema_version, BUNDLE_SCHEMA_VERSION
            )));
        }

        let labels = LabelEncoder::new(doc.labels)?;
        doc.scaler.validate()?;
        doc.classifier.validate()?;

        let n_trees = doc.classifier.n_trees();
        let bundle = Self::new(
            Box::new(doc.classifier),
            doc.scaler,
            labels,
            doc.version,
        )?;

        info!(
            "Loaded model bundle from {:?}: version '{}', {} trees, {} classes",
            path,
            bundle.version,
            n_trees,
            bundle.labels.len()
        );
        Ok(bundle)
    }

    /// Assemble a bundle from parts, cross-checking that the artifacts were
    /// fit as a matching set.
    pub fn new(
        classifier: Box<dyn Classifier>,
        scaler: StandardScaler,
        labels: LabelEncoder,
        version: String,
    ) -> Result<Self, EmotionError> {
        if scaler.len() != FEATURE_DIM {
            return Err(EmotionError::InvalidBundle(format!(
                "scaler dimension {} does not match feature dimension {}",
                scaler.len(),
                FEATURE_DIM
            )));
        }
        if classifier.n_classes() != labels.len() {
            return Err(EmotionError::InvalidBundle(format!(
                "classifier has {} classes but label encoder has {}",
                classifier.n_classes(),
                labels.len()
            )));
        }

        Ok(Self {
            version,
            labels,
            scaler,
            classifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_bundle_json(n_scaler: usize, labels: &[&str]) -> String {
        let leaf: Vec<f32> = vec![0.125; 8];
        serde_json::json!({
            "schema_version": 1,
            "version": "test-1",
            "labels": labels,
            "scaler": {
                "mean": vec![0.0f32; n_scaler],
                "scale": vec![1.0f32; n_scaler],
            },
            "classifier": {
                "n_features": 240,
                "n_classes": 8,
                "trees": [ { "nodes": [ { "value": leaf } ] } ],
            },
        })
        .to_string()
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_bundle() {
        let json = minimal_bundle_json(240, &EMOTIONS);
        let file = write_temp(&json);

        let bundle = ModelBundle::load(file.path()).unwrap();
        assert_eq!(bundle.version, "test-1");
        assert_eq!(bundle.labels.len(), 8);
        assert_eq!(bundle.classifier.n_classes(), 8);
    }

    #[test]
    fn test_missing_file_is_model_not_loaded() {
        let result = ModelBundle::load(Path::new("/nonexistent/emotion_bundle.json"));
        assert!(matches!(result, Err(EmotionError::ModelNotLoaded(_))));
    }

    #[test]
    fn test_garbage_json_rejected() {
        let file = write_temp("{ not json");
        let result = ModelBundle::load(file.path());
        assert!(matches!(result, Err(EmotionError::InvalidBundle(_))));
    }

    #[test]
    fn test_wrong_schema_version_rejected() {
        let json = minimal_bundle_json(240, &EMOTIONS).replace("\"schema_version\":1", "\"schema_version\":2");
        let file = write_temp(&json);
        let result = ModelBundle::load(file.path());
        assert!(matches!(result, Err(EmotionError::InvalidBundle(_))));
    }

    #[test]
    fn test_mismatched_scaler_dimension_rejected() {
        // A scaler fit for a different feature order/length must fail the
        // atomic-set check
        let json = minimal_bundle_json(120, &EMOTIONS);
        let file = write_temp(&json);
        let result = ModelBundle::load(file.path());
        assert!(matches!(result, Err(EmotionError::InvalidBundle(_))));
    }

    #[test]
    fn test_wrong_labels_rejected() {
        let labels = ["happy", "sad", "angry", "calm", "disgust", "fearful", "neutral", "surprised"];
        let json = minimal_bundle_json(240, &labels);
        let file = write_temp(&json);
        let result = ModelBundle::load(file.path());
        assert!(matches!(result, Err(EmotionError::InvalidBundle(_))));
    }
}
