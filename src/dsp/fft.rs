//! First-party discrete Fourier transform for arbitrary frame lengths.
//!
//! Power-of-two lengths run an iterative radix-2 decimation-in-time
//! transform (bit-reversal permutation followed by butterfly passes).
//! Every other length goes through Bluestein's algorithm, which rewrites
//! the DFT as a circular convolution evaluated with a power-of-two
//! transform of length `M >= 2N - 1`.
//!
//! Output is in natural bin order with DC first. The forward transform is
//! unscaled; the inverse applies `1/N`.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

pub type Complex64 = Complex<f64>;

/// A planned transform for one fixed length, reusable across frames and threads.
pub enum Transform {
    Radix2(Radix2),
    Bluestein(Bluestein),
}

impl Transform {
    pub fn new(len: usize) -> Self {
        if len <= 1 || len.is_power_of_two() {
            Transform::Radix2(Radix2::new(len))
        } else {
            Transform::Bluestein(Bluestein::new(len))
        }
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        match self {
            Transform::Radix2(t) => t.len,
            Transform::Bluestein(t) => t.len,
        }
    }

    /// Forward transform in place. `buffer.len()` must equal [`Transform::len`].
    pub fn process(&self, buffer: &mut [Complex64]) {
        match self {
            Transform::Radix2(t) => t.process(buffer),
            Transform::Bluestein(t) => t.process(buffer),
        }
    }

    /// Inverse transform in place, scaled by `1/N`.
    pub fn process_inverse(&self, buffer: &mut [Complex64]) {
        conjugate(buffer);
        self.process(buffer);
        conjugate(buffer);
        scale(buffer, 1.0 / buffer.len().max(1) as f64);
    }

    /// Magnitude `sqrt(re² + im²)` of every bin of a real frame's transform.
    pub fn magnitude_spectrum(&self, frame: &[f64]) -> Vec<f64> {
        let mut buffer: Vec<Complex64> = frame.iter().map(|&v| Complex::new(v, 0.0)).collect();
        self.process(&mut buffer);
        buffer.iter().map(|c| c.norm()).collect()
    }
}

pub struct Radix2 {
    len: usize,
    // e^{-2πik/len} for k in [0, len/2)
    twiddles: Vec<Complex64>,
}

impl Radix2 {
    pub fn new(len: usize) -> Self {
        assert!(len <= 1 || len.is_power_of_two(), "radix-2 length must be a power of two");
        let twiddles = (0..len / 2)
            .map(|k| Complex::from_polar(1.0, -2.0 * PI * k as f64 / len as f64))
            .collect();
        Self { len, twiddles }
    }

    pub fn process(&self, buffer: &mut [Complex64]) {
        let n = self.len;
        assert_eq!(buffer.len(), n, "buffer length does not match planned length");
        if n <= 1 {
            return;
        }

        bit_reverse_permute(buffer);

        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let stride = n / size;
            for start in (0..n).step_by(size) {
                for k in 0..half {
                    let w = self.twiddles[k * stride];
                    let even = buffer[start + k];
                    let odd = buffer[start + k + half] * w;
                    buffer[start + k] = even + odd;
                    buffer[start + k + half] = even - odd;
                }
            }
            size *= 2;
        }
    }
}

fn bit_reverse_permute(buffer: &mut [Complex64]) {
    let n = buffer.len();
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            buffer.swap(i, j);
        }
    }
}

pub struct Bluestein {
    len: usize,
    // c[k] = e^{-iπk²/N}
    chirp: Vec<Complex64>,
    inner: Radix2,
    // forward transform of the wrapped conjugate chirp
    kernel: Vec<Complex64>,
}

impl Bluestein {
    pub fn new(len: usize) -> Self {
        assert!(len >= 1, "bluestein length must be positive");
        let m = (2 * len - 1).next_power_of_two();

        // k² is reduced mod 2N first; the chirp is periodic in that and it keeps the phase small.
        let modulus = 2 * len as u64;
        let chirp: Vec<Complex64> = (0..len as u64)
            .map(|k| {
                let k2 = (k * k) % modulus;
                Complex::from_polar(1.0, -PI * k2 as f64 / len as f64)
            })
            .collect();

        let mut kernel = vec![Complex::new(0.0, 0.0); m];
        kernel[0] = chirp[0].conj();
        for k in 1..len {
            let b = chirp[k].conj();
            kernel[k] = b;
            kernel[m - k] = b;
        }

        let inner = Radix2::new(m);
        inner.process(&mut kernel);

        Self { len, chirp, inner, kernel }
    }

    pub fn process(&self, buffer: &mut [Complex64]) {
        let n = self.len;
        assert_eq!(buffer.len(), n, "buffer length does not match planned length");
        let m = self.kernel.len();

        let mut work = vec![Complex::new(0.0, 0.0); m];
        for (slot, (x, c)) in work.iter_mut().zip(buffer.iter().zip(&self.chirp)) {
            *slot = x * c;
        }

        self.inner.process(&mut work);
        for (a, b) in work.iter_mut().zip(&self.kernel) {
            *a *= b;
        }

        conjugate(&mut work);
        self.inner.process(&mut work);
        conjugate(&mut work);
        scale(&mut work, 1.0 / m as f64);

        for (out, (w, c)) in buffer.iter_mut().zip(work.iter().zip(&self.chirp)) {
            *out = w * c;
        }
    }
}

fn conjugate(buffer: &mut [Complex64]) {
    for c in buffer.iter_mut() {
        c.im = -c.im;
    }
}

fn scale(buffer: &mut [Complex64], factor: f64) {
    for c in buffer.iter_mut() {
        *c *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::FftPlanner;

    fn signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| ((i * 7919) % 113) as f64 / 10.0 - 5.6 + (i as f64 * 0.3).sin())
            .collect()
    }

    fn to_complex(frame: &[f64]) -> Vec<Complex64> {
        frame.iter().map(|&v| Complex::new(v, 0.0)).collect()
    }

    fn assert_close(a: &[Complex64], b: &[Complex64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).norm() < tol, "bin {i}: {x} vs {y}");
        }
    }

    #[test]
    fn picks_algorithm_by_length() {
        assert!(matches!(Transform::new(1), Transform::Radix2(_)));
        assert!(matches!(Transform::new(1024), Transform::Radix2(_)));
        assert!(matches!(Transform::new(17760), Transform::Bluestein(_)));
        assert_eq!(Transform::new(555).len(), 555);
    }

    #[test]
    fn dc_bin_is_sum_of_samples() {
        for n in [1, 2, 4, 8, 64, 1024] {
            let frame = signal(n);
            let mut buffer = to_complex(&frame);
            Transform::new(n).process(&mut buffer);
            let sum: f64 = frame.iter().sum();
            assert!((buffer[0].re - sum).abs() < 1e-9, "n={n}");
            assert!(buffer[0].im.abs() < 1e-9, "n={n}");
        }
    }

    #[test]
    fn dc_bin_is_sum_for_arbitrary_lengths() {
        for n in [3, 12, 100, 555] {
            let frame = signal(n);
            let mut buffer = to_complex(&frame);
            Transform::new(n).process(&mut buffer);
            let sum: f64 = frame.iter().sum();
            assert!((buffer[0].re - sum).abs() < 1e-7, "n={n}");
        }
    }

    #[test]
    fn real_input_magnitude_is_symmetric() {
        for n in [8, 256, 2048] {
            let mags = Transform::new(n).magnitude_spectrum(&signal(n));
            for k in 1..n {
                assert!((mags[k] - mags[n - k]).abs() < 1e-8, "n={n} k={k}");
            }
        }
    }

    #[test]
    fn round_trip_restores_frame() {
        for n in [2, 16, 1024, 7, 100, 555, 1000] {
            let frame = to_complex(&signal(n));
            let transform = Transform::new(n);
            let mut buffer = frame.clone();
            transform.process(&mut buffer);
            transform.process_inverse(&mut buffer);
            assert_close(&buffer, &frame, 1e-9);
        }
    }

    #[test]
    fn bluestein_agrees_with_radix2_on_power_of_two() {
        for n in [2, 8, 64, 512] {
            let frame = to_complex(&signal(n));
            let mut radix2 = frame.clone();
            Radix2::new(n).process(&mut radix2);
            let mut bluestein = frame.clone();
            Bluestein::new(n).process(&mut bluestein);
            assert_close(&bluestein, &radix2, 1e-8);
        }
    }

    #[test]
    fn matches_rustfft_reference() {
        let mut planner = FftPlanner::<f64>::new();
        for n in [5, 100, 555, 1024, 1776] {
            let frame = to_complex(&signal(n));

            let mut expected = frame.clone();
            planner.plan_fft_forward(n).process(&mut expected);

            let mut actual = frame.clone();
            Transform::new(n).process(&mut actual);

            assert_close(&actual, &expected, 1e-7);
        }
    }

    #[test]
    fn zero_frame_gives_zero_spectrum() {
        for n in [16, 1000] {
            let mags = Transform::new(n).magnitude_spectrum(&vec![0.0; n]);
            assert_eq!(mags.len(), n);
            assert!(mags.iter().all(|&m| m == 0.0));
        }
    }

    #[test]
    fn pure_tone_lands_in_its_bin() {
        let n = 600;
        let frame: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 25.0 * i as f64 / n as f64).cos())
            .collect();
        let mags = Transform::new(n).magnitude_spectrum(&frame);
        assert!((mags[25] - n as f64 / 2.0).abs() < 1e-6);
        assert!(mags[24] < 1e-6);
        assert!(mags[26] < 1e-6);
    }
}
