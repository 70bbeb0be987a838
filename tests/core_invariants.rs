//! Universal invariants the core must uphold on every call with valid
//! inputs, independent of which concrete scenario produced the spectrum.

use sbh_reconstruct::generator;
use sbh_reconstruct::graph::OverlapGraph;
use sbh_reconstruct::kmer::KMer;
use sbh_reconstruct::reconstruct::{reconstruct, Options};
use sbh_reconstruct::reliability;
use sbh_reconstruct::spectrum::{profile, Mode, Spectrum};

fn kmers_of(d: &str, k: usize) -> Vec<KMer> {
    d.as_bytes().windows(k).map(|w| KMer::new(w).unwrap()).collect()
}

// =============================================================================
// Result length is always exactly n, alphabet-only
// =============================================================================

#[test]
fn result_length_is_always_n_and_alphabet_only() {
    let cases = [("ACGTACGTAC", 3usize), ("AAACCCGGGTTTACGTACGTGGGCCCAAATTT", 4), ("AAAAA", 5)];
    for (d, k) in cases {
        let result = reconstruct(kmers_of(d, k), d.len(), k, Options::default()).unwrap();
        assert_eq!(result.sequence.len(), d.len());
        assert!(result.sequence.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')));
    }
}

// =============================================================================
// Determinism for fixed (spectrum, n, k, seed, force_mode)
// =============================================================================

#[test]
fn determinism_given_fixed_seed_and_spectrum() {
    let n = 200;
    let k = 6;
    let d = generator::random_dna(n, 9);
    let clean = generator::spectrum_of(&d, k);
    let spectrum = generator::corrupt(&clean, k, 0.1, 0.1, 9);

    let options = Options {
        seed: 9,
        ..Options::default()
    };
    let a = reconstruct(spectrum.clone(), n, k, options.clone()).unwrap();
    let b = reconstruct(spectrum, n, k, options).unwrap();
    assert_eq!(a.sequence, b.sequence);
}

// =============================================================================
// Idempotence of profiling
// =============================================================================

#[test]
fn profiling_is_idempotent() {
    let d = "AAACCCGGGTTTACGTACGTGGGCCCAAATTT";
    let spectrum = Spectrum::new(kmers_of(d, 4), d.len(), 4).unwrap();
    assert_eq!(profile(&spectrum, None), profile(&spectrum, None));
}

// =============================================================================
// Graph symmetry: v in successors(u, w) iff u in predecessors(v, w)
// =============================================================================

#[test]
fn graph_successors_and_predecessors_are_symmetric() {
    let d = "AAACCCGGGTTTACGTACGTGGGCCCAAATTT";
    let k = 4;
    let spectrum = Spectrum::new(kmers_of(d, k), d.len(), k).unwrap();
    let (reliable, _) = reliability::filter(&spectrum, Mode::Conservative, 1.0, 0.15);
    let graph = OverlapGraph::build(&reliable, k);

    for u in 0..graph.len() {
        for (v, w) in graph.successors(u, graph.k() - 1) {
            let preds = graph.predecessors(v, graph.k() - 1);
            assert!(preds.contains(&(u, w)));
        }
    }
}

// =============================================================================
// Every reliable k-mer appears in exactly one contig
// =============================================================================

#[test]
fn every_reliable_kmer_appears_in_exactly_one_contig() {
    use rustc_hash::FxHashSet;

    let d = "AAACCCGGGTTTACGTACGTGGGCCCAAATTT";
    let k = 4;
    let spectrum = Spectrum::new(kmers_of(d, k), d.len(), k).unwrap();
    let (reliable, _) = reliability::filter(&spectrum, Mode::Conservative, 1.0, 0.15);
    let graph = OverlapGraph::build(&reliable, k);
    let contigs = sbh_reconstruct::contig::extract(&graph);

    let mut seen = FxHashSet::default();
    let mut total = 0;
    for contig in &contigs {
        for &node in &contig.nodes {
            assert!(seen.insert(node));
            total += 1;
        }
    }
    assert_eq!(total, graph.len());
}

// =============================================================================
// Mode downgrade is one-way within a single call
// =============================================================================

#[test]
fn mode_never_upgrades_within_a_call() {
    assert_eq!(Mode::Conservative.downgrade(), Mode::Aggressive);
    assert_eq!(Mode::Aggressive.downgrade(), Mode::Rescue);
    assert_eq!(Mode::Rescue.downgrade(), Mode::Rescue);
}

// =============================================================================
// Quantified property: 0%-error spectrum, n in [300, 600], k in [7, 10],
// reconstructs with >= 95% similarity to the generating DNA string.
// =============================================================================

#[test]
fn clean_spectrum_hits_95_percent_similarity_for_typical_sizes() {
    for (n, k, seed) in [(300usize, 7usize, 1u64), (450, 8, 2), (600, 10, 3)] {
        let d = generator::random_dna(n, seed);
        let spectrum = generator::spectrum_of(&d, k);
        let options = Options {
            seed,
            ..Options::default()
        };
        let result = reconstruct(spectrum, n, k, options).unwrap();
        let sim = sbh_reconstruct::distance::similarity(&result.sequence, &d);
        assert!(sim >= 0.95, "n={n} k={k} similarity={sim}");
    }
}

// =============================================================================
// Quantified property: for p_pos = p_neg at n=400, k=8, mean similarity over
// >= 20 seeds clears 40% at 5%+5% error and 25% at 10%+10% error.
// =============================================================================

fn mean_similarity_at_error_rate(n: usize, k: usize, error_rate: f64, seeds: u64) -> f64 {
    let mut total = 0.0;
    for seed in 0..seeds {
        let d = generator::random_dna(n, seed);
        let clean = generator::spectrum_of(&d, k);
        let spectrum = generator::corrupt(&clean, k, error_rate, error_rate, seed);
        let options = Options {
            seed,
            ..Options::default()
        };
        let result = reconstruct(spectrum, n, k, options).unwrap();
        total += sbh_reconstruct::distance::similarity(&result.sequence, &d);
    }
    total / seeds as f64
}

#[test]
fn five_percent_error_hits_40_percent_mean_similarity() {
    let mean = mean_similarity_at_error_rate(400, 8, 0.05, 20);
    assert!(mean >= 0.40, "mean similarity={mean} at 5%+5% error");
}

#[test]
fn ten_percent_error_hits_25_percent_mean_similarity() {
    let mean = mean_similarity_at_error_rate(400, 8, 0.10, 20);
    assert!(mean >= 0.25, "mean similarity={mean} at 10%+10% error");
}
