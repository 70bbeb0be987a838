//! Spectrum, profiling, and the mode that parameterizes every downstream
//! threshold.

use crate::error::{ReconstructError, Result};
use crate::kmer::{shannon_entropy, KMer, MAX_K};

/// An immutable multiset of k-mers, recorded with the parameters it was
/// hybridized under.
#[derive(Debug, Clone)]
pub struct Spectrum {
    kmers: Vec<KMer>,
    n: usize,
    k: usize,
    expected_count: usize,
}

impl Spectrum {
    /// Build a `Spectrum`, validating every k-mer's length and alphabet and
    /// the `(n, k)` relationship.
    pub fn new(kmers: Vec<KMer>, n: usize, k: usize) -> Result<Self> {
        if k < 2 {
            return Err(ReconstructError::KTooSmall(k));
        }
        if k > MAX_K {
            return Err(ReconstructError::KTooLarge(k));
        }
        if n < k {
            return Err(ReconstructError::NSmallerThanK { n, k });
        }
        if kmers.is_empty() {
            return Err(ReconstructError::EmptySpectrum);
        }
        for (index, kmer) in kmers.iter().enumerate() {
            if kmer.len() != k {
                return Err(ReconstructError::WrongLength {
                    index,
                    actual: kmer.len(),
                    expected: k,
                });
            }
        }
        Ok(Self {
            kmers,
            n,
            k,
            expected_count: n - k + 1,
        })
    }

    /// Build a `Spectrum` from raw strings, e.g. lines read from a spectrum
    /// file. Validates alphabet membership byte-by-byte up front so a bad
    /// base is reported as `ReconstructError::AlphabetViolation` with the
    /// offending index and byte, rather than surfacing as a `KMer`-level
    /// `InvalidBase` the caller has to translate itself.
    pub fn from_raw(raw: &[&str], n: usize, k: usize) -> Result<Self> {
        let mut kmers = Vec::with_capacity(raw.len());
        for (index, s) in raw.iter().enumerate() {
            for &byte in s.as_bytes() {
                if !matches!(byte, b'A' | b'C' | b'G' | b'T') {
                    return Err(ReconstructError::AlphabetViolation { index, byte });
                }
            }
            kmers.push(KMer::new(s.as_bytes()).expect("alphabet already validated above"));
        }
        Self::new(kmers, n, k)
    }

    #[inline]
    pub fn kmers(&self) -> &[KMer] {
        &self.kmers
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn expected_count(&self) -> usize {
        self.expected_count
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.kmers.len()
    }

    /// Unique k-mers, sorted lexicographically (deterministic ordering for
    /// every downstream consumer that needs a stable iteration order).
    pub fn unique(&self) -> Vec<KMer> {
        let mut unique: Vec<KMer> = self.kmers.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }
}

/// One of three reconstruction modes, selected once per run by
/// [`profile`] and never upgraded afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mode {
    Conservative,
    Aggressive,
    Rescue,
}

impl Mode {
    /// One step down the downgrade ladder; `Rescue` is terminal.
    pub fn downgrade(self) -> Self {
        match self {
            Mode::Conservative => Mode::Aggressive,
            Mode::Aggressive => Mode::Rescue,
            Mode::Rescue => Mode::Rescue,
        }
    }

    /// The tunable parameters associates with this mode.
    pub fn params(self) -> ModeParams {
        match self {
            Mode::Conservative => ModeParams {
                mode: self,
                candidate_size: 8,
                min_overlap_for_jump: |k| k - 1,
                reliability_entropy_threshold: 1.4,
                require_local_consistency: false,
            },
            Mode::Aggressive => ModeParams {
                mode: self,
                candidate_size: 20,
                min_overlap_for_jump: |k| k.saturating_sub(2),
                reliability_entropy_threshold: 1.2,
                require_local_consistency: true,
            },
            Mode::Rescue => ModeParams {
                mode: self,
                candidate_size: 30,
                min_overlap_for_jump: |k| k.saturating_sub(3),
                reliability_entropy_threshold: 1.2,
                require_local_consistency: true,
            },
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Conservative => "conservative",
            Mode::Aggressive => "aggressive",
            Mode::Rescue => "rescue",
        };
        f.write_str(s)
    }
}

/// Every downstream threshold this mode fixes, gathered in one record so
/// the rest of the pipeline never branches on `Mode` directly.
#[derive(Clone, Copy)]
pub struct ModeParams {
    pub mode: Mode,
    /// Number of top-by-out-degree candidates considered by the aggressive
    /// jump strategy, unless overridden by `Options::candidate_size`.
    pub candidate_size: usize,
    /// Minimum overlap `(tail, candidate)` must clear for a jump, as a
    /// function of k.
    pub min_overlap_for_jump: fn(usize) -> usize,
    /// Shannon-entropy floor a k-mer's own bases must clear to count as
    /// reliable, unless the distinct-base-count shortcut already fired.
    pub reliability_entropy_threshold: f64,
    /// Whether reliability additionally requires a (k-1)-overlap neighbor
    /// elsewhere in the spectrum (aggressive/rescue only).
    pub require_local_consistency: bool,
}

/// Summary statistics over a `Spectrum`, produced once and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    pub size: usize,
    pub unique_count: usize,
    pub duplication_ratio: f64,
    pub coverage_ratio: f64,
    pub entropy: f64,
    pub mode: Mode,
}

/// Classify a spectrum's quality and select a reconstruction mode.
/// Calling this twice on the same spectrum yields an identical `Profile`
/// since it reads only the immutable `Spectrum`.
pub fn profile(spectrum: &Spectrum, force_mode: Option<Mode>) -> Profile {
    let size = spectrum.size();
    let unique = spectrum.unique();
    let unique_count = unique.len();
    let duplication_ratio = 1.0 - (unique_count as f64 / size as f64);
    let coverage_ratio = size as f64 / spectrum.expected_count() as f64;
    let entropy = shannon_entropy(spectrum.kmers().iter().flat_map(|k| k.as_bytes().iter().copied()));

    let mode = force_mode.unwrap_or_else(|| select_mode(coverage_ratio, duplication_ratio, entropy));

    Profile {
        size,
        unique_count,
        duplication_ratio,
        coverage_ratio,
        entropy,
        mode,
    }
}

fn select_mode(coverage_ratio: f64, duplication_ratio: f64, entropy: f64) -> Mode {
    if (0.95..=1.05).contains(&coverage_ratio) && duplication_ratio < 0.05 && entropy > 1.9 {
        Mode::Conservative
    } else if (0.80..=1.20).contains(&coverage_ratio) && entropy > 1.7 {
        Mode::Aggressive
    } else {
        Mode::Rescue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kmer(s: &str) -> KMer {
        KMer::from_str(s).unwrap()
    }

    #[test]
    fn rejects_empty_spectrum() {
        let err = Spectrum::new(vec![], 10, 3).unwrap_err();
        assert_eq!(err, ReconstructError::EmptySpectrum);
    }

    #[test]
    fn rejects_n_less_than_k() {
        let err = Spectrum::new(vec![kmer("ACG")], 2, 3).unwrap_err();
        assert_eq!(err, ReconstructError::NSmallerThanK { n: 2, k: 3 });
    }

    #[test]
    fn rejects_k_out_of_range() {
        assert!(Spectrum::new(vec![kmer("A")], 10, 1).is_err());
        let long = KMer::from_str(&"A".repeat(65)).unwrap();
        assert!(Spectrum::new(vec![long], 100, 65).is_err());
    }

    #[test]
    fn from_raw_builds_spectrum_from_strings() {
        let raw = ["ACG", "CGT", "GTA"];
        let spectrum = Spectrum::from_raw(&raw, 5, 3).unwrap();
        assert_eq!(spectrum.size(), 3);
    }

    #[test]
    fn from_raw_rejects_invalid_alphabet_with_index_and_byte() {
        let raw = ["ACG", "CGX", "GTA"];
        let err = Spectrum::from_raw(&raw, 5, 3).unwrap_err();
        assert_eq!(err, ReconstructError::AlphabetViolation { index: 1, byte: b'X' });
    }

    #[test]
    fn rejects_wrong_length_kmer() {
        let err = Spectrum::new(vec![kmer("ACGT")], 10, 3).unwrap_err();
        assert_eq!(
            err,
            ReconstructError::WrongLength {
                index: 0,
                actual: 4,
                expected: 3
            }
        );
    }

    #[test]
    fn profile_is_idempotent() {
        let kmers = "ACGTACGTAC"
            .as_bytes()
            .windows(3)
            .map(|w| KMer::new(w).unwrap())
            .collect::<Vec<_>>();
        let spectrum = Spectrum::new(kmers, 10, 3).unwrap();
        assert_eq!(profile(&spectrum, None), profile(&spectrum, None));
    }

    #[test]
    fn clean_full_coverage_spectrum_is_conservative() {
        // Full 3-mer spectrum of a 10-base string, no errors.
        let d = "ACGTACGTAC";
        let kmers: Vec<KMer> = d
            .as_bytes()
            .windows(3)
            .map(|w| KMer::new(w).unwrap())
            .collect();
        let spectrum = Spectrum::new(kmers, 10, 3).unwrap();
        let p = profile(&spectrum, None);
        assert_eq!(p.mode, Mode::Conservative);
        assert_eq!(p.size, 8);
    }

    #[test]
    fn all_identical_kmers_is_rescue() {
        // S5 shape: n=50, k=5, spectrum is "AAAAA" repeated.
        let kmers: Vec<KMer> = std::iter::repeat(kmer("AAAAA")).take(46).collect();
        let spectrum = Spectrum::new(kmers, 50, 5).unwrap();
        let p = profile(&spectrum, None);
        assert_eq!(p.mode, Mode::Rescue);
    }

    #[test]
    fn force_mode_skips_profiler() {
        let kmers: Vec<KMer> = "ACGTACGTAC"
            .as_bytes()
            .windows(3)
            .map(|w| KMer::new(w).unwrap())
            .collect();
        let spectrum = Spectrum::new(kmers, 10, 3).unwrap();
        let p = profile(&spectrum, Some(Mode::Rescue));
        assert_eq!(p.mode, Mode::Rescue);
    }

    #[test]
    fn mode_downgrade_is_one_way() {
        assert_eq!(Mode::Conservative.downgrade(), Mode::Aggressive);
        assert_eq!(Mode::Aggressive.downgrade(), Mode::Rescue);
        assert_eq!(Mode::Rescue.downgrade(), Mode::Rescue);
    }
}
