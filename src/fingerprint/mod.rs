//! Fingerprint generation: band energies per frame, hashed pairwise.
//!
//! Flow per block: frame -> Hann window -> magnitude spectrum -> band
//! energies -> slope hash against the previous frame's energies.

pub mod bands;
pub mod error;
pub mod hash;
pub mod pipeline;

pub use pipeline::{FingerprintPipeline, FingerprintSequence};
