//! Adaptive path extender: a bounded-backtracking walk that appends one
//! base per step via four graded jump strategies.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::OverlapGraph;
use crate::kmer::KMer;
use crate::reliability::ReliableSet;
use crate::spectrum::Spectrum;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Tunable budgets for one extension run.
#[derive(Debug, Clone, Copy)]
pub struct ExtendBudget {
    pub max_iterations: usize,
    pub max_backtracks: usize,
    pub wall_time: Duration,
    pub max_desperation: usize,
    pub candidate_size: usize,
}

/// Outcome of running the extender to completion or exhaustion.
#[derive(Debug, Clone)]
pub struct ExtendOutcome {
    pub sequence: String,
    pub iterations: usize,
    pub backtracks: usize,
    pub incomplete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Standard,
    Aggressive,
    Conservative,
    Desperate,
}

/// Extend `seed` to length `n` using the reliable set `R` and its overlap
/// graph, following escalation ladder.
#[allow(clippy::too_many_arguments)]
pub fn extend(
    seed: &str,
    n: usize,
    k: usize,
    spectrum: &Spectrum,
    reliable: &ReliableSet,
    graph: &OverlapGraph,
    budget: ExtendBudget,
    rng: &mut SmallRng,
) -> ExtendOutcome {
    let mut sequence = seed.to_string();
    let reliable_set: FxHashSet<KMer> = reliable.kmers().iter().cloned().collect();
    let multiplicity = count_multiplicity(spectrum);

    let mut used: FxHashSet<KMer> = FxHashSet::default();
    register_all_windows(&sequence, k, &mut used);

    let mut dead: FxHashSet<(Box<[u8]>, u8)> = FxHashSet::default();

    let mut strategy = Strategy::Standard;
    let mut fail_standard = 0usize;
    let mut fail_aggressive = 0usize;
    let mut fail_conservative = 0usize;

    let mut iterations = 0usize;
    let mut backtracks = 0usize;
    let mut desperation = 0usize;
    let start = Instant::now();
    let mut incomplete = false;

    while sequence.len() < n {
        if iterations >= budget.max_iterations || start.elapsed() >= budget.wall_time {
            incomplete = true;
            break;
        }
        iterations += 1;

        let tail = tail_bytes(&sequence, k);
        let remaining = n - sequence.len();
        let old_len = sequence.len();

        let success = match strategy {
            Strategy::Standard => try_standard(
                &mut sequence,
                &tail,
                &reliable_set,
                graph,
                &multiplicity,
                &used,
                &dead,
                remaining,
            ),
            Strategy::Aggressive => try_aggressive(
                &mut sequence,
                &tail,
                &reliable_set,
                graph,
                &used,
                budget.candidate_size,
                k,
                remaining,
            ),
            Strategy::Conservative => {
                try_conservative(&mut sequence, &tail, &reliable_set, &used, k, remaining)
            }
            Strategy::Desperate => {
                if desperation >= budget.max_desperation {
                    false
                } else {
                    let did = try_desperate(&mut sequence, &tail, &reliable_set, &used, rng, remaining);
                    if did {
                        desperation += 1;
                    }
                    did
                }
            }
        };

        if success {
            register_new_windows(&sequence, k, old_len, &mut used);
            strategy = Strategy::Standard;
            fail_standard = 0;
            fail_aggressive = 0;
            fail_conservative = 0;
            continue;
        }

        match strategy {
            Strategy::Standard => {
                fail_standard += 1;
                if fail_standard >= 3 {
                    strategy = Strategy::Aggressive;
                    fail_standard = 0;
                }
            }
            Strategy::Aggressive => {
                fail_aggressive += 1;
                if fail_aggressive >= 2 {
                    strategy = Strategy::Conservative;
                    fail_aggressive = 0;
                }
            }
            Strategy::Conservative => {
                fail_conservative += 1;
                if fail_conservative >= 1 {
                    strategy = Strategy::Desperate;
                    fail_conservative = 0;
                }
            }
            Strategy::Desperate => {
                if backtracks < budget.max_backtracks && sequence.len() > k {
                    if let Some((tail_before, base)) = backtrack(&mut sequence, k, &mut used) {
                        dead.insert((tail_before, base));
                    }
                    backtracks += 1;
                    strategy = Strategy::Standard;
                } else {
                    incomplete = true;
                    break;
                }
            }
        }
    }

    if sequence.len() < n {
        incomplete = true;
        sequence.push_str(&"A".repeat(n - sequence.len()));
    }

    ExtendOutcome {
        sequence,
        iterations,
        backtracks,
        incomplete,
    }
}

fn count_multiplicity(spectrum: &Spectrum) -> FxHashMap<KMer, usize> {
    let mut counts = FxHashMap::default();
    for kmer in spectrum.kmers() {
        *counts.entry(kmer.clone()).or_insert(0) += 1;
    }
    counts
}

fn tail_bytes(sequence: &str, k: usize) -> Vec<u8> {
    let w = k.saturating_sub(1);
    let bytes = sequence.as_bytes();
    bytes[bytes.len().saturating_sub(w)..].to_vec()
}

/// Register every full-length-k window of `sequence` into `used` (idempotent).
/// Used once, for the initial seed; subsequent steps use `register_new_windows`
/// to stay `O(appended length)` instead of rescanning the whole sequence.
fn register_all_windows(sequence: &str, k: usize, used: &mut FxHashSet<KMer>) {
    let bytes = sequence.as_bytes();
    if bytes.len() < k {
        return;
    }
    for window in bytes.windows(k) {
        if let Ok(kmer) = KMer::new(window) {
            used.insert(kmer);
        }
    }
}

/// Register only the windows newly completed since `sequence` had length
/// `old_len` (i.e. those ending at or after position `old_len`).
fn register_new_windows(sequence: &str, k: usize, old_len: usize, used: &mut FxHashSet<KMer>) {
    let bytes = sequence.as_bytes();
    if bytes.len() < k {
        return;
    }
    let first_new_start = old_len.saturating_sub(k - 1).max(0);
    let start = first_new_start.min(bytes.len().saturating_sub(k));
    for window in bytes[start..].windows(k) {
        if let Ok(kmer) = KMer::new(window) {
            used.insert(kmer);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn try_standard(
    sequence: &mut String,
    tail: &[u8],
    reliable: &FxHashSet<KMer>,
    graph: &OverlapGraph,
    multiplicity: &FxHashMap<KMer, usize>,
    used: &FxHashSet<KMer>,
    dead: &FxHashSet<(Box<[u8]>, u8)>,
    remaining: usize,
) -> bool {
    if remaining == 0 {
        return false;
    }
    let mut best: Option<(u8, usize, usize)> = None;
    for &b in &BASES {
        if dead.contains(&(tail.to_vec().into_boxed_slice(), b)) {
            continue;
        }
        let mut candidate_bytes = tail.to_vec();
        candidate_bytes.push(b);
        let candidate = match KMer::new(&candidate_bytes) {
            Ok(c) => c,
            Err(_) => continue,
        };
        if !reliable.contains(&candidate) || used.contains(&candidate) {
            continue;
        }
        let out_degree = graph.find(&candidate).map(|id| graph.out_degree(id)).unwrap_or(0);
        let mult = multiplicity.get(&candidate).copied().unwrap_or(0);
        let better = match &best {
            None => true,
            Some((_, bo, bm)) => out_degree > *bo || (out_degree == *bo && mult > *bm),
        };
        if better {
            best = Some((b, out_degree, mult));
        }
    }
    match best {
        Some((b, _, _)) => {
            sequence.push(b as char);
            true
        }
        None => false,
    }
}

#[allow(clippy::too_many_arguments)]
fn try_aggressive(
    sequence: &mut String,
    tail: &[u8],
    reliable: &FxHashSet<KMer>,
    graph: &OverlapGraph,
    used: &FxHashSet<KMer>,
    candidate_size: usize,
    k: usize,
    remaining: usize,
) -> bool {
    if remaining == 0 {
        return false;
    }
    let mut ranked: Vec<(usize, &KMer)> = reliable
        .iter()
        .filter(|c| !used.contains(*c))
        .map(|c| {
            let degree = graph.find(c).map(|id| graph.out_degree(id)).unwrap_or(0);
            (degree, c)
        })
        .collect();
    ranked.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(b.1)));
    ranked.truncate(candidate_size);

    let min_o = k.saturating_sub(3);
    let max_o = k.saturating_sub(1);
    let mut best: Option<(usize, usize, &KMer)> = None;
    for &(degree, candidate) in &ranked {
        if let Some(o) = bounded_overlap(tail, candidate, min_o, max_o) {
            let better = match &best {
                None => true,
                Some((bo, bd, _)) => o > *bo || (o == *bo && degree > *bd),
            };
            if better {
                best = Some((o, degree, candidate));
            }
        }
    }
    match best {
        Some((o, _, candidate)) => {
            append_suffix(sequence, candidate, o, remaining);
            true
        }
        None => false,
    }
}

fn try_conservative(
    sequence: &mut String,
    tail: &[u8],
    reliable: &FxHashSet<KMer>,
    used: &FxHashSet<KMer>,
    k: usize,
    remaining: usize,
) -> bool {
    if remaining == 0 {
        return false;
    }
    let min_o = k.saturating_sub(2);
    let max_o = k.saturating_sub(1);
    let w = k.saturating_sub(1);

    let mut best: Option<(usize, &KMer)> = None;
    for candidate in reliable.iter().filter(|c| !used.contains(*c)) {
        if bounded_overlap(tail, candidate, min_o, max_o).is_some() {
            let distance = hamming_distance(tail, candidate.prefix(w));
            let better = match &best {
                None => true,
                Some((bd, _)) => distance < *bd,
            };
            if better {
                best = Some((distance, candidate));
            }
        }
    }
    match best {
        Some((_, candidate)) => {
            let o = bounded_overlap(tail, candidate, min_o, max_o).unwrap_or(w);
            append_suffix(sequence, candidate, o, remaining);
            true
        }
        None => false,
    }
}

fn try_desperate(
    sequence: &mut String,
    tail: &[u8],
    reliable: &FxHashSet<KMer>,
    used: &FxHashSet<KMer>,
    rng: &mut SmallRng,
    remaining: usize,
) -> bool {
    if remaining == 0 {
        return false;
    }
    let pool: Vec<&KMer> = reliable.iter().filter(|c| !used.contains(*c)).collect();
    if pool.is_empty() {
        return false;
    }
    let pick = &pool[rng.gen_range(0..pool.len())];

    let pad = BASES
        .iter()
        .find(|&&b| {
            let mut window = tail.to_vec();
            window.push(b);
            KMer::new(&window).map(|k| !used.contains(&k)).unwrap_or(false)
        })
        .copied()
        .unwrap_or(b'A');

    let mut appended = String::new();
    appended.push(pad as char);
    appended.push_str(pick.as_str());
    append_str(sequence, &appended, remaining);
    true
}

fn bounded_overlap(suffix: &[u8], candidate: &KMer, min_o: usize, max_o: usize) -> Option<usize> {
    let max_o = max_o.min(suffix.len()).min(candidate.len());
    if max_o < min_o {
        return None;
    }
    for o in (min_o..=max_o).rev() {
        let tail_part = &suffix[suffix.len() - o..];
        if tail_part == candidate.prefix(o) {
            return Some(o);
        }
    }
    None
}

fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count() + a.len().abs_diff(b.len())
}

fn append_suffix(sequence: &mut String, candidate: &KMer, overlap: usize, remaining: usize) {
    let suffix = candidate.suffix(candidate.len() - overlap);
    append_bytes(sequence, suffix, remaining);
}

fn append_str(sequence: &mut String, s: &str, remaining: usize) {
    append_bytes(sequence, s.as_bytes(), remaining);
}

fn append_bytes(sequence: &mut String, bytes: &[u8], remaining: usize) {
    let take = bytes.len().min(remaining);
    for &b in &bytes[..take] {
        sequence.push(b as char);
    }
}

/// Pop the last base off `sequence`, undo its window registration in `used`,
/// and return the `(tail, base)` pair that led to it so callers can add it
/// to the dead-set.
fn backtrack(sequence: &mut String, k: usize, used: &mut FxHashSet<KMer>) -> Option<(Box<[u8]>, u8)> {
    if sequence.len() <= k {
        return None;
    }
    if sequence.len() >= k {
        let bytes = sequence.as_bytes();
        if let Ok(last_window) = KMer::new(&bytes[bytes.len() - k..]) {
            used.remove(&last_window);
        }
    }
    let base = sequence.pop()? as u8;
    let tail_before = tail_bytes(sequence, k).into_boxed_slice();
    Some((tail_before, base))
}
