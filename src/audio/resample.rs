use anyhow::{Context, Result};
use rubato::{FftFixedIn, Resampler};

use super::SampleBuffer;

const CHUNK_SIZE: usize = 1024;

/// Convert `audio` to `target_rate`, keeping duration and alignment.
///
/// The resampler's output delay is trimmed from the front and the tail is
/// flushed with silence, so the result has `len * target / source` samples.
pub fn resample(audio: &SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
    if audio.sample_rate == target_rate || audio.is_empty() {
        return Ok(SampleBuffer::new(audio.samples.clone(), target_rate));
    }
    if target_rate == 0 {
        anyhow::bail!("Target sample rate must be positive");
    }

    let mut resampler = FftFixedIn::<f32>::new(
        audio.sample_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        2,
        1,
    )
    .context("Failed to create resampler")?;

    let delay = resampler.output_delay();
    let expected = (audio.len() as u64 * target_rate as u64 / audio.sample_rate as u64) as usize;

    log::debug!(
        "Resampling {} Hz -> {} Hz ({} -> {} samples, delay {})",
        audio.sample_rate,
        target_rate,
        audio.len(),
        expected,
        delay
    );

    let input: Vec<f32> = audio.samples.iter().map(|&s| s as f32 / 32768.0).collect();
    let mut output: Vec<f32> = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut position = 0;

    while output.len() < expected + delay {
        let needed = resampler.input_frames_next();
        let mut chunk = vec![0.0f32; needed];
        if position < input.len() {
            let end = (position + needed).min(input.len());
            chunk[..end - position].copy_from_slice(&input[position..end]);
        }
        position += needed;

        let result = resampler.process(&[chunk], None).context("Resampling failed")?;
        output.extend_from_slice(&result[0]);
    }

    let samples = output[delay..delay + expected]
        .iter()
        .map(|&s| (s * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect();

    Ok(SampleBuffer::new(samples, target_rate))
}
