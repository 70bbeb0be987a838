//! Reliability filter: selects the trusted k-mer subset `R` that every
//! later component builds on.

use rustc_hash::FxHashSet;

use crate::kmer::KMer;
use crate::spectrum::{Mode, ModeParams, Spectrum};

/// A subset of unique k-mers flagged reliable. Membership is final once
/// built.
#[derive(Debug, Clone)]
pub struct ReliableSet {
    kmers: Vec<KMer>,
}

impl ReliableSet {
    #[inline]
    pub fn kmers(&self) -> &[KMer] {
        &self.kmers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    pub fn contains(&self, kmer: &KMer) -> bool {
        self.kmers.binary_search(kmer).is_ok()
    }
}

/// Run the reliability filter, downgrading the mode and retrying with
/// relaxed thresholds if the result is degenerate.
/// Returns the `ReliableSet` together with the mode actually used to build
/// it (which may be strictly more downgraded than `mode`: downgrade is
/// one-way and never reverses mid-retry).
///
/// `coverage_ratio`/`error_threshold` together decide how deep that
/// downgrade goes: this implementation assigns `error_threshold` solely to
/// the depth of this downgrade path (never to the extender's jump
/// thresholds). A spectrum whose coverage is within `error_threshold` of
/// the ideal 1.0 is given one gentler step (Conservative -> Aggressive)
/// before falling all the way to Rescue; a spectrum further off than that
/// skips straight to Rescue, on the reasoning that its coverage gap alone
/// is already evidence Aggressive's assumptions won't hold either.
pub fn filter(spectrum: &Spectrum, mode: Mode, coverage_ratio: f64, error_threshold: f64) -> (ReliableSet, Mode) {
    let unique = spectrum.unique();
    let neighbors = NeighborIndex::build(&unique, spectrum.k());

    let mut effective_mode = mode;
    let mut selected = select_reliable(&unique, &neighbors, effective_mode);

    if selected.len() < 2 && effective_mode == Mode::Conservative {
        let within_tolerance = (coverage_ratio - 1.0).abs() <= error_threshold;
        effective_mode = if within_tolerance { Mode::Aggressive } else { Mode::Rescue };
        selected = select_reliable(&unique, &neighbors, effective_mode);
    }

    if selected.len() < 2 && effective_mode != Mode::Rescue {
        effective_mode = Mode::Rescue;
        selected = select_reliable(&unique, &neighbors, effective_mode);
    }

    if selected.len() < 2 {
        // Fallback: ties / still-degenerate input proceeds with the full
        // unique spectrum as R.
        selected = unique;
    }

    selected.sort_unstable();
    selected.dedup();

    (ReliableSet { kmers: selected }, effective_mode)
}

fn select_reliable(unique: &[KMer], neighbors: &NeighborIndex, mode: Mode) -> Vec<KMer> {
    let params = mode.params();
    unique
        .iter()
        .filter(|kmer| is_reliable(kmer, neighbors, mode, &params))
        .cloned()
        .collect()
}

fn is_reliable(kmer: &KMer, neighbors: &NeighborIndex, mode: Mode, params: &ModeParams) -> bool {
    match mode {
        Mode::Rescue => neighbors.has_overlap_neighbor(kmer),
        Mode::Conservative | Mode::Aggressive => {
            let k = kmer.len();
            let entropy_ok = kmer.distinct_bases() >= 3 || kmer.entropy() >= params.reliability_entropy_threshold;
            let homopolymer_ok = kmer.longest_homopolymer() <= (k + 1) / 2;
            let local_consistency_ok = !params.require_local_consistency || neighbors.has_overlap_neighbor(kmer);
            entropy_ok && homopolymer_ok && local_consistency_ok
        }
    }
}

/// Index of (k-1)-prefixes and suffixes across the unique spectrum, used
/// only to answer "does some other k-mer overlap this one by k-1 at either
/// end" (the local-consistency condition above).
struct NeighborIndex {
    prefixes: FxHashSet<Box<[u8]>>,
    suffixes: FxHashSet<Box<[u8]>>,
}

impl NeighborIndex {
    fn build(unique: &[KMer], k: usize) -> Self {
        let w = k.saturating_sub(1);
        let mut prefixes = FxHashSet::default();
        let mut suffixes = FxHashSet::default();
        for kmer in unique {
            prefixes.insert(kmer.prefix(w).to_vec().into_boxed_slice());
            suffixes.insert(kmer.suffix(w).to_vec().into_boxed_slice());
        }
        Self { prefixes, suffixes }
    }

    /// True iff some *other* k-mer's (k-1)-prefix matches this k-mer's
    /// (k-1)-suffix (this k-mer could extend it), or vice versa.
    fn has_overlap_neighbor(&self, kmer: &KMer) -> bool {
        let w = kmer.len().saturating_sub(1);
        self.prefixes.contains(kmer.suffix(w)) || self.suffixes.contains(kmer.prefix(w))
    }
}
