// Clippy allows
#![allow(clippy::too_many_arguments)]

//! sbh: Sequencing-by-Hybridization reconstruction CLI.
//!
//! Usage: sbh <COMMAND> [OPTIONS]

use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};

use sbh_reconstruct::distance::{levenshtein, similarity};
use sbh_reconstruct::generator;
use sbh_reconstruct::reconstruct::{reconstruct, Options};
use sbh_reconstruct::spectrum::Mode;

#[derive(Parser)]
#[command(name = "sbh")]
#[command(author = "Manish Kumar Bobbili")]
#[command(version)]
#[command(about = "SBH: Sequencing-by-Hybridization spectrum reconstruction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic DNA string and its (optionally corrupted) spectrum
    Generate {
        /// Length of the generated DNA string
        #[arg(short = 'n', long)]
        length: usize,

        /// k-mer length
        #[arg(short, long)]
        k: usize,

        /// Positive error rate (fraction of spectrum size)
        #[arg(long, default_value = "0.0")]
        pos_error: f64,

        /// Negative error rate (fraction of spectrum size)
        #[arg(long, default_value = "0.0")]
        neg_error: f64,

        /// PRNG seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Reconstruct a DNA string from a generated spectrum and report accuracy
    Reconstruct {
        /// Length of the original DNA string
        #[arg(short = 'n', long)]
        length: usize,

        /// k-mer length
        #[arg(short, long)]
        k: usize,

        /// Positive error rate (fraction of spectrum size)
        #[arg(long, default_value = "0.0")]
        pos_error: f64,

        /// Negative error rate (fraction of spectrum size)
        #[arg(long, default_value = "0.0")]
        neg_error: f64,

        /// Number of candidates considered by the aggressive jump strategy
        #[arg(long)]
        candidates: Option<usize>,

        /// PRNG seed (drives both the generator and the extender's Desperate strategy)
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Skip the profiler and force a specific mode
        #[arg(long)]
        force_mode: Option<String>,

        /// Print the result's stats line to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Run repeated trials across error rates and emit a CSV report
    Bench {
        /// Length of the original DNA string
        #[arg(short = 'n', long)]
        length: usize,

        /// k-mer length
        #[arg(short, long)]
        k: usize,

        /// Error rate applied equally to positive and negative errors
        #[arg(long, default_value = "0.0")]
        error: f64,

        /// Number of repetitions per error rate
        #[arg(long, default_value = "1")]
        repetitions: u64,

        /// Output CSV path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    match s.to_lowercase().as_str() {
        "conservative" => Ok(Mode::Conservative),
        "aggressive" => Ok(Mode::Aggressive),
        "rescue" => Ok(Mode::Rescue),
        other => Err(format!("unknown mode '{other}', expected conservative|aggressive|rescue")),
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            length,
            k,
            pos_error,
            neg_error,
            seed,
        } => run_generate(length, k, pos_error, neg_error, seed),

        Commands::Reconstruct {
            length,
            k,
            pos_error,
            neg_error,
            candidates,
            seed,
            force_mode,
            stats,
        } => run_reconstruct(length, k, pos_error, neg_error, candidates, seed, force_mode, stats),

        Commands::Bench {
            length,
            k,
            error,
            repetitions,
            output,
        } => run_bench(length, k, error, repetitions, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_generate(length: usize, k: usize, pos_error: f64, neg_error: f64, seed: u64) -> Result<(), String> {
    if k < 2 {
        return Err(format!("k must be at least 2, got {k}"));
    }
    let dna = generator::random_dna(length, seed);
    let clean = generator::spectrum_of(&dna, k);
    let spectrum = generator::corrupt(&clean, k, pos_error, neg_error, seed);

    println!("{dna}");
    for kmer in &spectrum {
        println!("{kmer}");
    }
    Ok(())
}

fn run_reconstruct(
    length: usize,
    k: usize,
    pos_error: f64,
    neg_error: f64,
    candidates: Option<usize>,
    seed: u64,
    force_mode: Option<String>,
    stats: bool,
) -> Result<(), String> {
    let force_mode = force_mode.as_deref().map(parse_mode).transpose()?;

    let dna = generator::random_dna(length, seed);
    let clean = generator::spectrum_of(&dna, k);
    let spectrum = generator::corrupt(&clean, k, pos_error, neg_error, seed);

    let options = Options {
        candidate_size: candidates,
        seed,
        force_mode,
        ..Options::default()
    };

    let result = reconstruct(spectrum, length, k, options).map_err(|e| e.to_string())?;

    println!("{}", result.sequence);
    if stats {
        let sim = similarity(&result.sequence, &dna);
        eprintln!("Reconstruct stats: {result} similarity={sim:.4}");
    }
    Ok(())
}

/// One CSV row, matching the column set the reconstruction core's CLI
/// front-ends report.
#[derive(serde::Serialize)]
struct BenchRow {
    k: usize,
    n: usize,
    seq_length: usize,
    error_rate: f64,
    original_length: usize,
    reconstructed_length: usize,
    coverage: f64,
    accuracy: f64,
    edit_distance: usize,
    runtime: f64,
    is_valid: bool,
    success: bool,
    repeat: u64,
}

fn run_bench(length: usize, k: usize, error: f64, repetitions: u64, output: Option<PathBuf>) -> Result<(), String> {
    if k < 2 {
        return Err(format!("k must be at least 2, got {k}"));
    }

    let rows: Vec<BenchRow> = (0..repetitions)
        .map(|repeat| bench_one(length, k, error, repeat))
        .collect::<Result<_, String>>()?;

    let mut writer: csv::Writer<Box<dyn io::Write>> = match output {
        Some(path) => csv::Writer::from_writer(Box::new(
            std::fs::File::create(&path).map_err(|e| format!("cannot create {}: {e}", path.display()))?,
        )),
        None => csv::Writer::from_writer(Box::new(io::stdout())),
    };

    for row in &rows {
        writer.serialize(row).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

fn bench_one(length: usize, k: usize, error: f64, repeat: u64) -> Result<BenchRow, String> {
    let seed = repeat;
    let dna = generator::random_dna(length, seed);
    let clean = generator::spectrum_of(&dna, k);
    let expected_count = clean.len();
    let spectrum = generator::corrupt(&clean, k, error, error, seed);
    let seq_length = spectrum.len();

    let options = Options {
        seed,
        ..Options::default()
    };

    let start = Instant::now();
    let result = reconstruct(spectrum, length, k, options).map_err(|e| e.to_string())?;
    let runtime = start.elapsed().as_secs_f64();

    let is_valid = result
        .sequence
        .bytes()
        .all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'));
    let edit_distance = levenshtein(&result.sequence, &dna);
    let accuracy = similarity(&result.sequence, &dna);

    Ok(BenchRow {
        k,
        n: length,
        seq_length,
        error_rate: error,
        original_length: dna.len(),
        reconstructed_length: result.sequence.len(),
        coverage: seq_length as f64 / expected_count as f64,
        accuracy,
        edit_distance,
        runtime,
        is_valid,
        success: !result.incomplete,
        repeat,
    })
}

