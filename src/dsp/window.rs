use std::f64::consts::PI;

use crate::fingerprint::error::FingerprintError;

/// Hann coefficients `0.5 * (1 - cos(2πn / (N - 1)))` for a frame of `size` samples.
pub fn hann_window(size: usize) -> Result<Vec<f64>, FingerprintError> {
    if size < 2 {
        return Err(FingerprintError::DegenerateFrame { len: size });
    }

    let denom = (size - 1) as f64;
    Ok((0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos()))
        .collect())
}

/// Window a frame with precomputed coefficients. Both slices must have the same length.
pub fn apply_window(frame: &[f64], window: &[f64]) -> Vec<f64> {
    debug_assert_eq!(frame.len(), window.len());
    frame.iter().zip(window).map(|(s, w)| s * w).collect()
}

/// Window a single frame, computing the coefficients on the fly.
#[allow(dead_code)]
pub fn hann(frame: &[f64]) -> Result<Vec<f64>, FingerprintError> {
    let window = hann_window(frame.len())?;
    Ok(apply_window(frame, &window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_zero_and_centre_is_one() {
        let w = hann_window(9).unwrap();
        assert_eq!(w.len(), 9);
        assert!(w[0].abs() < 1e-12);
        assert!(w[8].abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn window_is_symmetric() {
        let w = hann_window(100).unwrap();
        for i in 0..50 {
            assert!((w[i] - w[99 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn two_sample_frame_is_allowed() {
        let w = hann_window(2).unwrap();
        assert!(w.iter().all(|c| c.abs() < 1e-12));
    }

    #[test]
    fn rejects_degenerate_frames() {
        assert_eq!(hann_window(1), Err(FingerprintError::DegenerateFrame { len: 1 }));
        assert_eq!(hann(&[]), Err(FingerprintError::DegenerateFrame { len: 0 }));
    }

    #[test]
    fn hann_scales_samples_and_preserves_length() {
        let frame = vec![2.0; 5];
        let out = hann(&frame).unwrap();
        assert_eq!(out.len(), 5);
        assert!((out[2] - 2.0).abs() < 1e-12);
        assert!((out[1] - 1.0).abs() < 1e-12);
    }
}
