use rayon::prelude::*;

use super::bands::{BandEnergies, BandLayout};
use super::error::FingerprintError;
use super::hash::sub_fingerprint;
use crate::audio::SampleBuffer;
use crate::config::FingerprintConfig;
use crate::dsp::fft::Transform;
use crate::dsp::window::{apply_window, hann_window};

// Absorbs float error in products like 0.37 * 48000 before flooring to a sample count.
const SAMPLE_EPSILON: f64 = 1e-6;

/// Sample counts derived from a [`FingerprintConfig`] at one sample rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    pub sample_rate: u32,
    pub block_len: usize,
    pub frame_len: usize,
    pub hop_size: usize,
    pub frame_count: usize,
}

/// One 32-bit sub-fingerprint and where it sits in the track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubFingerprint {
    pub hash: u32,
    pub block_index: usize,
    /// Frame within the block; always >= 1 since frame 0 has no predecessor
    pub frame_index: usize,
    /// Start of the frame relative to the start of the track
    pub offset_ms: u32,
}

/// Ordered sub-fingerprints for one track (or one block of it).
#[derive(Clone, Debug, PartialEq)]
pub struct FingerprintSequence {
    pub track_id: String,
    pub fingerprints: Vec<SubFingerprint>,
}

impl FrameLayout {
    pub fn new(config: &FingerprintConfig, sample_rate: u32) -> Result<Self, FingerprintError> {
        if sample_rate == 0 {
            return Err(FingerprintError::InvalidLayout("sample rate must be positive".into()));
        }
        if !(config.frame_seconds > 0.0 && config.block_seconds > 0.0) {
            return Err(FingerprintError::InvalidLayout(format!(
                "durations must be positive (frame {}s, block {}s)",
                config.frame_seconds, config.block_seconds
            )));
        }
        if !(0.0..1.0).contains(&config.overlap) {
            return Err(FingerprintError::InvalidLayout(format!(
                "overlap {} outside [0, 1)",
                config.overlap
            )));
        }

        let frame_len = samples_for(config.frame_seconds, sample_rate);
        if frame_len < 2 {
            return Err(FingerprintError::DegenerateFrame { len: frame_len });
        }

        let hop_size = (frame_len as f64 * (1.0 - config.overlap) + SAMPLE_EPSILON).floor() as usize;
        if hop_size == 0 {
            return Err(FingerprintError::InvalidLayout(format!(
                "hop size rounds to zero for a {frame_len}-sample frame at overlap {}",
                config.overlap
            )));
        }

        let block_len = samples_for(config.block_seconds, sample_rate);
        if block_len < frame_len {
            return Err(FingerprintError::InvalidLayout(format!(
                "block of {block_len} samples cannot hold a {frame_len}-sample frame"
            )));
        }

        Ok(Self {
            sample_rate,
            block_len,
            frame_len,
            hop_size,
            frame_count: (block_len - frame_len) / hop_size + 1,
        })
    }

    /// Sub-fingerprints per block: one fewer than frames.
    pub fn hash_count(&self) -> usize {
        self.frame_count - 1
    }

    pub fn offset_ms(&self, block_index: usize, frame_index: usize) -> u32 {
        let sample = block_index as u64 * self.block_len as u64 + frame_index as u64 * self.hop_size as u64;
        u32::try_from(sample * 1000 / self.sample_rate as u64).unwrap_or(u32::MAX)
    }
}

fn samples_for(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64 + SAMPLE_EPSILON).floor() as usize
}

/// Frames, windows, transforms, bands and hashes fixed-length sample blocks.
///
/// Everything planned here is immutable, so one pipeline is shared by all
/// worker threads and blocks are processed independently of each other.
pub struct FingerprintPipeline {
    layout: FrameLayout,
    window: Vec<f64>,
    transform: Transform,
    bands: BandLayout,
}

impl FingerprintPipeline {
    pub fn new(config: &FingerprintConfig, sample_rate: u32) -> Result<Self, FingerprintError> {
        let layout = FrameLayout::new(config, sample_rate)?;

        if !(2..=33).contains(&config.band_count) {
            return Err(FingerprintError::InvalidLayout(format!(
                "band count {} outside 2..=33 (hash is 32 bits)",
                config.band_count
            )));
        }
        let nyquist = sample_rate as f64 / 2.0;
        if !(config.low_hz > 0.0 && config.low_hz < config.high_hz && config.high_hz <= nyquist) {
            return Err(FingerprintError::InvalidLayout(format!(
                "band range {}-{} Hz must be increasing and below Nyquist ({} Hz)",
                config.low_hz, config.high_hz, nyquist
            )));
        }

        let window = hann_window(layout.frame_len)?;
        let transform = Transform::new(layout.frame_len);
        let bands = BandLayout::new(
            sample_rate,
            layout.frame_len,
            config.low_hz,
            config.high_hz,
            config.band_count,
        );

        log::info!(
            "Frame layout @ {}Hz: block={} frame={} hop={} frames/block={} bands={} ({:.2} Hz/bin)",
            sample_rate,
            layout.block_len,
            layout.frame_len,
            layout.hop_size,
            layout.frame_count,
            bands.band_count(),
            bands.bin_hz()
        );
        for (b, edge) in bands.edges().windows(2).enumerate() {
            let (lo, hi) = bands.band_range_hz(b);
            log::debug!("band {:2}: {:7.1}-{:7.1} Hz, bins {}..{}", b, lo, hi, edge[0], edge[1]);
        }

        Ok(Self { layout, window, transform, bands })
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Band energies of every frame in a block, in frame order.
    pub fn band_energies(&self, block: &[i16]) -> Result<Vec<BandEnergies>, FingerprintError> {
        self.check_block(block)?;

        Ok((0..self.layout.frame_count)
            .into_par_iter()
            .map(|frame_idx| {
                let start = frame_idx * self.layout.hop_size;
                let frame: Vec<f64> = block[start..start + self.layout.frame_len]
                    .iter()
                    .map(|&s| s as f64)
                    .collect();
                let windowed = apply_window(&frame, &self.window);
                let magnitudes = self.transform.magnitude_spectrum(&windowed);
                self.bands.energies(&magnitudes)
            })
            .collect())
    }

    /// Fingerprint one block of exactly `layout().block_len` samples.
    pub fn process_block(
        &self,
        block: &[i16],
        block_index: usize,
        track_id: &str,
    ) -> Result<FingerprintSequence, FingerprintError> {
        let energies = self.band_energies(block)?;

        let fingerprints: Vec<SubFingerprint> = energies
            .par_windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let frame_index = i + 1;
                SubFingerprint {
                    hash: sub_fingerprint(&pair[0], &pair[1]),
                    block_index,
                    frame_index,
                    offset_ms: self.layout.offset_ms(block_index, frame_index),
                }
            })
            .collect();

        log::debug!(
            "Block {}: {} frames -> {} sub-fingerprints",
            block_index,
            energies.len(),
            fingerprints.len()
        );

        Ok(FingerprintSequence {
            track_id: track_id.to_string(),
            fingerprints,
        })
    }

    /// Consecutive whole blocks of `samples`; a trailing partial block is not yielded.
    pub fn blocks<'a>(&self, samples: &'a [i16]) -> std::slice::ChunksExact<'a, i16> {
        samples.chunks_exact(self.layout.block_len)
    }

    /// Fingerprint every whole block of a track in parallel, calling
    /// `on_block` once per finished block.
    pub fn fingerprint_track<F>(
        &self,
        audio: &SampleBuffer,
        track_id: &str,
        on_block: F,
    ) -> Result<FingerprintSequence, FingerprintError>
    where
        F: Fn(usize) + Sync,
    {
        if audio.sample_rate != self.layout.sample_rate {
            return Err(FingerprintError::InvalidLayout(format!(
                "audio is {}Hz but pipeline was planned for {}Hz",
                audio.sample_rate, self.layout.sample_rate
            )));
        }

        let blocks = self.blocks(&audio.samples);
        let tail = blocks.remainder().len();
        if tail > 0 {
            log::debug!(
                "Dropping {} trailing samples ({:.2}s) shorter than one block",
                tail,
                tail as f64 / audio.sample_rate as f64
            );
        }

        let per_block: Vec<FingerprintSequence> = blocks
            .collect::<Vec<_>>()
            .into_par_iter()
            .enumerate()
            .map(|(block_index, block)| -> Result<FingerprintSequence, FingerprintError> {
                let sequence = self.process_block(block, block_index, track_id)?;
                on_block(block_index);
                Ok(sequence)
            })
            .collect::<Result<_, FingerprintError>>()?;

        Ok(FingerprintSequence {
            track_id: track_id.to_string(),
            fingerprints: per_block.into_iter().flat_map(|s| s.fingerprints).collect(),
        })
    }

    fn check_block(&self, block: &[i16]) -> Result<(), FingerprintError> {
        if block.len() != self.layout.block_len {
            return Err(FingerprintError::InvalidBlockLength {
                expected: self.layout.block_len,
                actual: block.len(),
            });
        }
        Ok(())
    }
}

#[allow(dead_code)]
impl FingerprintSequence {
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}
