use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::config::SAMPLE_RATE;
use crate::error::EmotionError;

/// Chunk size fed to the FFT resampler
const CHUNK_SIZE: usize = 1024;

/// Resample a whole in-memory mono buffer to 16 kHz.
///
/// The FFT resampler is chunked and carries latency, so the input is fed in
/// fixed chunks, the internal delay is drained afterwards, and the output is
/// trimmed to the expected length.
pub fn resample_to_target(input: &[f32], src_rate: u32) -> Result<Vec<f32>, EmotionError> {
    if src_rate == SAMPLE_RATE {
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    debug!(
        "Resampling {} samples: {} Hz -> {} Hz",
        input.len(),
        src_rate,
        SAMPLE_RATE
    );

    let mut resampler = FftFixedIn::<f32>::new(
        src_rate as usize,
        SAMPLE_RATE as usize,
        CHUNK_SIZE,
        2, // sub_chunks for quality
        1, // mono
    )
    .map_err(|e| EmotionError::ResampleError(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected =
        (input.len() as f64 * SAMPLE_RATE as f64 / src_rate as f64).round() as usize;

    let mut output: Vec<f32> = Vec::with_capacity(expected + delay);
    let mut out_buf = resampler.output_buffer_allocate(true);

    // Full chunks
    let mut pos = 0;
    while pos + CHUNK_SIZE <= input.len() {
        let frames = [&input[pos..pos + CHUNK_SIZE]];
        let (_, out_n) = resampler
            .process_into_buffer(&frames, &mut out_buf, None)
            .map_err(|e| EmotionError::ResampleError(e.to_string()))?;
        output.extend_from_slice(&out_buf[0][..out_n]);
        pos += CHUNK_SIZE;
    }

    // Final partial chunk
    if pos < input.len() {
        let frames = [&input[pos..]];
        let (_, out_n) = resampler
            .process_partial_into_buffer(Some(&frames), &mut out_buf, None)
            .map_err(|e| EmotionError::ResampleError(e.to_string()))?;
        output.extend_from_slice(&out_buf[0][..out_n]);
    }

    // Drain the resampler delay
    while output.len() < expected + delay {
        let (_, out_n) = resampler
            .process_partial_into_buffer(None::<&[&[f32]]>, &mut out_buf, None)
            .map_err(|e| EmotionError::ResampleError(e.to_string()))?;
        if out_n == 0 {
            break;
        }
        output.extend_from_slice(&out_buf[0][..out_n]);
    }

    let start = delay.min(output.len());
    let end = (delay + expected).min(output.len());
    Ok(output[start..end].to_vec())
}
