use thiserror::Error;

/// Errors raised by the fingerprint core.
///
/// Silence and other all-zero input are not errors: they produce zero
/// spectra, zero band energies and zero hashes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FingerprintError {
    #[error("block has {actual} samples, pipeline expects exactly {expected}")]
    InvalidBlockLength { expected: usize, actual: usize },

    #[error("frame length {len} is too short for windowing (need at least 2 samples)")]
    DegenerateFrame { len: usize },

    #[error("invalid frame layout: {0}")]
    InvalidLayout(String),
}
