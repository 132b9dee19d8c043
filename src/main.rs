mod bundle;
mod bundle_io;
mod config;
mod errors;
mod fusion;
mod histogram;
mod metrics;
mod output;
mod pipeline;
mod preprocess;

use std::path::{Path, PathBuf};
use std::time::Instant;
use std::fs;
use clap::Parser;
use rayon::prelude::*;

use config::{Config, WeightStore};
use errors::{GestureMatchError, Result};
use bundle_io::{get_bundle_dirs_in_dir, is_bundle_dir, load_bundle};
use output::write_report_csv;
use pipeline::run_match;

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "gesture_match - silhouette histogram gesture identification")]
struct Args {
    /// Path to a bundle directory, or a directory of bundle directories
    #[clap(short, long)]
    input: Option<String>,

    /// Path to output directory
    #[clap(short, long)]
    output: Option<String>,

    /// Path to configuration file
    #[clap(short, long, default_value = "config.toml")]
    config: String,

    /// Update a matching weight and persist it, e.g. --set prob_h=0.4
    /// (may be given multiple times)
    #[clap(long = "set", value_name = "NAME=VALUE")]
    set_weights: Vec<String>,

    /// Enable debug mode (print per-metric scores)
    #[clap(short, long)]
    debug: bool,
}

fn parse_weight_override(arg: &str) -> Result<(String, f64)> {
    let (name, value) = arg.split_once('=').ok_or_else(|| {
        GestureMatchError::Config(format!("expected NAME=VALUE, got '{}'", arg))
    })?;
    let value: f64 = value.trim().parse().map_err(|_| {
        GestureMatchError::Config(format!("weight '{}' is not a number: '{}'", name, value))
    })?;
    Ok((name.trim().to_string(), value))
}

fn process_bundle(dir: &Path, store: &WeightStore, output_dir: &Path, debug: bool) -> Result<()> {
    // Each run reads an immutable snapshot of the weights
    let weights = store.snapshot();

    let bundle = load_bundle(dir)?;
    let report = run_match(&bundle, &weights)?;

    if debug {
        println!("Gesture type: {}", report.gesture_type);
        for metric_report in &report.coarse {
            println!(
                "  coarse {:<13} x={:+.4} y={:+.4} prob={:6.2}% -> {}",
                metric_report.metric.name(),
                metric_report.horizontal.score,
                metric_report.vertical.score,
                metric_report.probability * 100.0,
                metric_report.decision,
            );
        }
        for metric_report in &report.fine {
            println!(
                "  fine   {:<13} f={:+.4} prob={:6.2}% -> {}",
                metric_report.metric.name(),
                metric_report.vertical.score,
                metric_report.probability * 100.0,
                metric_report.decision,
            );
        }
    }

    let name = dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    write_report_csv(&report, output_dir, name)?;

    Ok(())
}

/// Main function
fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration (defaults if the file does not exist yet)
    let config_path = PathBuf::from(&args.config);
    let mut config = if config_path.is_file() {
        Config::from_file(&config_path)?
    } else {
        println!("No config at {}, using defaults", config_path.display());
        Config::default()
    };

    // Override config with command-line arguments
    if let Some(input) = args.input.clone() {
        config.input_path = input;
    }
    if let Some(output) = args.output.clone() {
        config.output_base_dir = output;
    }

    config.validate()?;

    let store = WeightStore::new(config.clone(), &config_path);

    // Administrative weight update: apply, validate and persist atomically
    if !args.set_weights.is_empty() {
        let overrides = args
            .set_weights
            .iter()
            .map(|s| parse_weight_override(s))
            .collect::<Result<Vec<_>>>()?;
        let weights = store.update_and_persist(&overrides)?;
        println!(
            "Weights updated: prob_h={} prob_v={} prob_v_f={} prob_f_h={} prob_f_v={}",
            weights.prob_h, weights.prob_v, weights.prob_v_f, weights.prob_f_h, weights.prob_f_v
        );

        if args.input.is_none() {
            return Ok(());
        }
    }

    // Start timing
    let start_time = Instant::now();

    let output_dir = PathBuf::from(&config.output_base_dir);
    fs::create_dir_all(&output_dir)?;

    // Process input
    let input_path = PathBuf::from(&config.input_path);

    if is_bundle_dir(&input_path) {
        // Process single bundle
        println!("Processing bundle: {}", input_path.display());
        process_bundle(&input_path, &store, &output_dir, args.debug)?;
    } else if input_path.is_dir() {
        // Process all bundle directories underneath
        println!("Processing directory: {}", input_path.display());
        let bundle_dirs = get_bundle_dirs_in_dir(&input_path)?;

        println!("Found {} bundles", bundle_dirs.len());

        if config.use_parallel {
            // Process bundles in parallel; a failed run only aborts itself
            bundle_dirs
                .par_iter()
                .for_each(|dir| {
                    println!("Processing: {}", dir.display());
                    if let Err(e) = process_bundle(dir, &store, &output_dir, args.debug) {
                        eprintln!("Error processing {}: {}", dir.display(), e);
                    }
                });
        } else {
            // Process bundles sequentially
            for dir in &bundle_dirs {
                println!("Processing: {}", dir.display());
                if let Err(e) = process_bundle(dir, &store, &output_dir, args.debug) {
                    eprintln!("Error processing {}: {}", dir.display(), e);
                }
            }
        }
    } else {
        return Err(GestureMatchError::InvalidPath(input_path));
    }

    // Report elapsed time
    let elapsed = start_time.elapsed();
    println!("Processing completed in {:.2} seconds", elapsed.as_secs_f64());

    Ok(())
}
