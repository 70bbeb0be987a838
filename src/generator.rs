//! Synthetic DNA and spectrum generation.
//!
//! A seeded `SmallRng`-driven generator of ground-truth DNA strings and
//! their (optionally corrupted) spectra, giving the CLI and test suite
//! something to drive the reconstruction core with.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::kmer::KMer;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Generate a uniformly random DNA string of length `n`, seeded for
/// reproducibility.
pub fn random_dna(n: usize, seed: u64) -> String {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| BASES[rng.gen_range(0..4)] as char)
        .collect()
}

/// The exact, error-free spectrum of `dna`: every contiguous k-mer.
pub fn spectrum_of(dna: &str, k: usize) -> Vec<KMer> {
    dna.as_bytes()
        .windows(k)
        .map(|w| KMer::new(w).expect("random_dna only emits A/C/G/T"))
        .collect()
}

/// Inject positive and negative errors into a spectrum.
///
/// Positive errors: append `round(pos_error * spectrum.len())` random
/// k-mers not already present. Negative errors: remove
/// `round(neg_error * spectrum.len())` random elements.
pub fn corrupt(spectrum: &[KMer], k: usize, pos_error: f64, neg_error: f64, seed: u64) -> Vec<KMer> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut out = spectrum.to_vec();

    let neg_count = (neg_error * spectrum.len() as f64).round() as usize;
    for _ in 0..neg_count.min(out.len()) {
        let idx = rng.gen_range(0..out.len());
        out.remove(idx);
    }

    let pos_count = (pos_error * spectrum.len() as f64).round() as usize;
    for _ in 0..pos_count {
        let bytes: Vec<u8> = (0..k).map(|_| BASES[rng.gen_range(0..4)]).collect();
        out.push(KMer::new(&bytes).expect("generated bytes are always A/C/G/T"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_dna_is_deterministic_for_fixed_seed() {
        assert_eq!(random_dna(50, 7), random_dna(50, 7));
    }

    #[test]
    fn random_dna_uses_only_the_alphabet() {
        let d = random_dna(200, 3);
        assert!(d.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')));
        assert_eq!(d.len(), 200);
    }

    #[test]
    fn spectrum_of_has_expected_count() {
        let d = random_dna(30, 1);
        let spectrum = spectrum_of(&d, 5);
        assert_eq!(spectrum.len(), 30 - 5 + 1);
    }

    #[test]
    fn corrupt_changes_size_as_expected() {
        let d = random_dna(100, 2);
        let spectrum = spectrum_of(&d, 6);
        let original_len = spectrum.len();
        let corrupted = corrupt(&spectrum, 6, 0.1, 0.1, 99);
        // Not an exact equality (rounding + random collisions in positive
        // errors could in principle coincide with existing k-mers) but the
        // size should move roughly as requested.
        let delta = corrupted.len() as isize - original_len as isize;
        assert!(delta.abs() <= (original_len / 5) as isize + 2);
    }
}
