//! Voice emotion classification for short spoken-audio clips.
//!
//! The pipeline turns a WAV byte buffer into one of eight emotion labels:
//! decode and validate, fit to a fixed 3.5 second window at 16 kHz, extract
//! MFCC + delta + delta-delta summary statistics (240 values), standardize
//! with a pre-fitted scaler, and run a pre-trained decision-tree ensemble.
//!
//! Model artifacts load once at startup via [`model::ModelBundle`]; the
//! resulting [`pipeline::EmotionClassifier`] is immutable and safe to share
//! across threads.

pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;

pub use config::{PipelineConfig, CLIP_SAMPLES, FEATURE_DIM, N_EMOTIONS, SAMPLE_RATE};
pub use error::EmotionError;
pub use model::{Classifier, ModelBundle, EMOTIONS};
pub use pipeline::{EmotionClassifier, PredictionResult};
