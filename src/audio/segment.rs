//! Fixed-duration windowing and amplitude normalization.
//!
//! The classifier was fit on 3.5 second clips, so every waveform is forced to
//! exactly 56,000 samples: longer clips keep their first 3.5 seconds, shorter
//! clips are zero-padded at the end. Both operations are pure functions.

use crate::config::CLIP_SAMPLES;

/// Pad or truncate a waveform to exactly [`CLIP_SAMPLES`] samples.
///
/// Truncation keeps the start of the clip; there is no random cropping, so
/// identical input always yields identical output.
pub fn fit_to_window(mut wave: Vec<f32>) -> Vec<f32> {
    if wave.len() > CLIP_SAMPLES {
        wave.truncate(CLIP_SAMPLES);
    } else {
        wave.resize(CLIP_SAMPLES, 0.0);
    }
    wave
}

/// Scale a waveform so its peak amplitude is 1.0.
///
/// All-zero input is left untouched; the silence gate upstream decides
/// whether that is an error.
pub fn peak_normalize(wave: &mut [f32]) {
    let peak = wave.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    if peak > 0.0 {
        for x in wave.iter_mut() {
            *x /= peak;
        }
    }
}
