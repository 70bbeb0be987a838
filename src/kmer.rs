//! Core k-mer type and overlap primitives.

use std::fmt;

/// Maximum k-mer length the core will accept.
pub const MAX_K: usize = 64;

/// An immutable string of length `k` over the alphabet `{A, C, G, T}`.
///
/// Equality and hashing are both structural (content-based): two `KMer`
/// values are equal iff their bytes are equal, regardless of where either
/// one came from in a spectrum or a genome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KMer(Box<[u8]>);

impl KMer {
    /// Build a `KMer` from raw bytes, validating alphabet membership.
    pub fn new(bytes: &[u8]) -> Result<Self, InvalidBase> {
        for &b in bytes {
            if !matches!(b, b'A' | b'C' | b'G' | b'T') {
                return Err(InvalidBase(b));
            }
        }
        Ok(Self(bytes.to_vec().into_boxed_slice()))
    }

    /// Build a `KMer` from an ASCII string slice.
    pub fn from_str(s: &str) -> Result<Self, InvalidBase> {
        Self::new(s.as_bytes())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Safe: constructed only from the {A,C,G,T} alphabet.
        std::str::from_utf8(&self.0).expect("KMer bytes are always valid ASCII")
    }

    #[inline]
    pub fn prefix(&self, len: usize) -> &[u8] {
        &self.0[..len.min(self.0.len())]
    }

    #[inline]
    pub fn suffix(&self, len: usize) -> &[u8] {
        let n = self.0.len();
        &self.0[n.saturating_sub(len)..]
    }

    /// Number of distinct bases present in this k-mer.
    pub fn distinct_bases(&self) -> usize {
        let mut seen = [false; 4];
        for &b in self.0.iter() {
            seen[base_index(b)] = true;
        }
        seen.iter().filter(|&&x| x).count()
    }

    /// Shannon entropy (base-2) of this k-mer's own base frequencies, in `[0, 2]`.
    pub fn entropy(&self) -> f64 {
        shannon_entropy(self.0.iter().copied())
    }

    /// Length of the longest homopolymer run (maximal run of one repeated base).
    pub fn longest_homopolymer(&self) -> usize {
        longest_run(&self.0)
    }
}

impl fmt::Display for KMer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a byte outside `{A, C, G, T}` is encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid base byte {0:#x}, expected one of A/C/G/T")]
pub struct InvalidBase(pub u8);

#[inline]
fn base_index(b: u8) -> usize {
    match b {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' => 3,
        _ => unreachable!("KMer invariant: alphabet-checked at construction"),
    }
}

/// Shannon entropy (base-2) of the base-frequency distribution over an
/// arbitrary run of `{A,C,G,T}` bytes. Returns 0.0 for an empty input.
pub fn shannon_entropy(bytes: impl IntoIterator<Item = u8>) -> f64 {
    let mut counts = [0u64; 4];
    let mut total = 0u64;
    for b in bytes {
        counts[base_index(b)] += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Longest run of a single repeated byte within `bytes`.
pub fn longest_run(bytes: &[u8]) -> usize {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<u8> = None;
    for &b in bytes {
        if Some(b) == prev {
            run += 1;
        } else {
            run = 1;
            prev = Some(b);
        }
        best = best.max(run);
    }
    best
}

/// Length of the longest overlap where a suffix of `u` equals a prefix of
/// `v` (i.e. the weight of a would-be edge `u -> v`). Runs in `O(k)`.
///
/// Ties favor the *longest* overlap, edge-weight rule ("no
/// longer such overlap exists").
pub fn overlap_len(u: &KMer, v: &KMer) -> usize {
    let max_possible = u.len().min(v.len());
    for w in (1..=max_possible).rev() {
        if u.suffix(w) == v.prefix(w) {
            return w;
        }
    }
    0
}
