//! The classification pipeline.
//!
//! A single linear pass per request: decode and validate, fit to the 3.5 s
//! window, extract the 240-dim descriptor, standardize, run the ensemble,
//! assemble the result. Every stage is a pure function of its input, so the
//! whole pass is deterministic and there is nothing to retry.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::audio::{decode, fit_to_window, peak_normalize};
use crate::config::PipelineConfig;
use crate::error::EmotionError;
use crate::features::FeatureExtractor;
use crate::model::ModelBundle;

/// Outcome of a classification request.
///
/// `valid=false` carries an explanation and empty probabilities; it is the
/// only user-visible failure mode. Internal contract violations surface as
/// errors instead.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub emotion: String,
    pub confidence: f32,
    pub all_probabilities: BTreeMap<String, f32>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    /// Result for input rejected before inference
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            emotion: String::new(),
            confidence: 0.0,
            all_probabilities: BTreeMap::new(),
            valid: false,
            error: Some(reason.into()),
        }
    }
}

/// Emotion classifier over a loaded artifact bundle.
///
/// The bundle is read-only; one classifier value can serve any number of
/// concurrent `classify` calls.
pub struct EmotionClassifier {
    bundle: Arc<ModelBundle>,
    extractor: FeatureExtractor,
    config: PipelineConfig,
}

impl EmotionClassifier {
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self::with_config(bundle, PipelineConfig::default())
    }

    pub fn with_config(bundle: Arc<ModelBundle>, config: PipelineConfig) -> Self {
        let extractor = FeatureExtractor::new(config.mfcc.clone());
        Self {
            bundle,
            extractor,
            config,
        }
    }

    /// Classify the emotional content of a WAV byte buffer.
    ///
    /// Invalid audio (unparseable, empty, silent) returns `Ok` with
    /// `valid=false`; artifact/contract violations return `Err`.
    pub fn classify(&self, bytes: &[u8]) -> Result<PredictionResult, EmotionError> {
        let waveform = match decode(bytes, self.config.min_audio_energy) {
            Ok(wave) => wave,
            Err(e) if e.is_invalid_audio() => {
                warn!("Rejected input: {}", e);
                return Ok(PredictionResult::invalid(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        let mut window = fit_to_window(waveform);
        peak_normalize(&mut window);

        let features = self.extractor.extract(&window)?;
        let scaled = self.bundle.scaler.transform(&features)?;
        let probabilities = self.bundle.classifier.predict(&scaled)?;

        self.assemble(&probabilities)
    }

    /// Map the ensemble output back to emotion names and pick the winner.
    /// Ties break toward the lowest class index.
    fn assemble(&self, probabilities: &[f32]) -> Result<PredictionResult, EmotionError> {
        if probabilities.len() != self.bundle.labels.len() {
            return Err(EmotionError::DimensionMismatch {
                expected: self.bundle.labels.len(),
                actual: probabilities.len(),
            });
        }

        let mut best = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[best] {
                best = i;
            }
        }

        let emotion = self
            .bundle
            .labels
            .decode(best)
            .ok_or(EmotionError::DimensionMismatch {
                expected: self.bundle.labels.len(),
                actual: best,
            })?
            .to_string();

        let all_probabilities: BTreeMap<String, f32> = self
            .bundle
            .labels
            .labels()
            .iter()
            .zip(probabilities.iter())
            .map(|(name, &p)| (name.clone(), p))
            .collect();

        debug!("Predicted '{}' at {:.3}", emotion, probabilities[best]);

        Ok(PredictionResult {
            emotion,
            confidence: probabilities[best],
            all_probabilities,
            valid: true,
            error: None,
        })
    }
}
