//! Validation errors for the reconstruction core.
//!
//! Only malformed input is surfaced to the caller as a distinct failure;
//! every other failure mode (degenerate input, budget exhaustion, internal
//! consistency) becomes a flag on the returned [`crate::reconstruct::ReconstructResult`]
//! instead.

use thiserror::Error;

/// Errors that reject a `reconstruct()` call before any work is done.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("k must be at least 2, got {0}")]
    KTooSmall(usize),

    #[error("k must be at most 64, got {0}")]
    KTooLarge(usize),

    #[error("n ({n}) must be >= k ({k})")]
    NSmallerThanK { n: usize, k: usize },

    #[error("spectrum is empty")]
    EmptySpectrum,

    #[error("k-mer at spectrum index {index} has invalid base {byte:#x}")]
    AlphabetViolation { index: usize, byte: u8 },

    #[error("k-mer at spectrum index {index} has length {actual}, expected {expected}")]
    WrongLength {
        index: usize,
        actual: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, ReconstructError>;
