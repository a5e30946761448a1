pub mod decoder;
pub mod resampler;
pub mod segment;

pub use decoder::{decode, rms_energy};
pub use resampler::resample_to_target;
pub use segment::{fit_to_window, peak_normalize};
