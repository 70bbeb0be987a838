// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]

//! SBH: Sequencing-by-Hybridization spectrum reconstruction.
//!
//! Given a (possibly corrupted) multiset of fixed-length oligonucleotide
//! fragments hybridized from an unknown DNA string of known length, this
//! crate reconstructs a string over `{A, C, G, T}` of that length whose
//! k-mer multiset is as close as possible to the input spectrum.
//!
//! The pipeline is strictly linear: spectrum -> profile -> reliable set ->
//! overlap graph -> contigs -> merged backbone -> extended sequence of
//! length `n`. No stage mutates an earlier stage's output.
//!
//! # Example
//!
//! ```rust
//! use sbh_reconstruct::{kmer::KMer, reconstruct::{reconstruct, Options}};
//!
//! let d = "ACGTACGTAC";
//! let kmers: Vec<KMer> = d.as_bytes().windows(3).map(|w| KMer::new(w).unwrap()).collect();
//! let result = reconstruct(kmers, 10, 3, Options::default()).unwrap();
//! assert_eq!(result.sequence, d);
//! ```

pub mod contig;
pub mod distance;
pub mod error;
pub mod extend;
pub mod generator;
pub mod graph;
pub mod kmer;
pub mod merger;
pub mod reconstruct;
pub mod reliability;
pub mod spectrum;

pub use error::{ReconstructError, Result};
pub use reconstruct::{reconstruct, Options, ReconstructResult};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::distance::{levenshtein, similarity};
    pub use crate::kmer::KMer;
    pub use crate::reconstruct::{reconstruct, Options, ReconstructResult};
    pub use crate::spectrum::{Mode, Spectrum};
}

#[cfg(test)]
mod tests {
    use crate::generator;
    use crate::kmer::KMer;
    use crate::reconstruct::{reconstruct, Options};

    #[test]
    fn test_basic_workflow() {
        let d = "ACGTACGTAC";
        let kmers: Vec<KMer> = d.as_bytes().windows(3).map(|w| KMer::new(w).unwrap()).collect();
        let result = reconstruct(kmers, 10, 3, Options::default()).unwrap();
        assert_eq!(result.sequence, d);
        assert!(!result.incomplete);
    }

    #[test]
    fn test_generated_spectrum_round_trip() {
        let k = 8;
        let n = 300;
        let d = generator::random_dna(n, 1);
        let spectrum = generator::spectrum_of(&d, k);
        let options = Options {
            seed: 1,
            ..Options::default()
        };
        let result = reconstruct(spectrum, n, k, options).unwrap();
        assert_eq!(result.sequence.len(), n);
        assert!(crate::distance::similarity(&result.sequence, &d) > 0.9);
    }
}
