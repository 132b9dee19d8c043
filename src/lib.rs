// src/lib.rs - Library interface for gesture_match

pub mod bundle;
pub mod bundle_io;
pub mod config;
pub mod errors;
pub mod fusion;
pub mod histogram;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod preprocess;

// Re-export commonly used types and functions
pub use errors::{GestureMatchError, Result};
pub use config::{Config, Weights, WeightStore};
pub use histogram::{interpolate, normalize, prepare, Histogram};
pub use metrics::{
    bhattacharyya, chi_square, correlation, intersection, Metric, MetricResult,
};
pub use preprocess::{
    crop_by_histogram, prepare_bundle, renormalize_fingers, scale_to_reference,
    split_at_midpoint, Prepared, NOISE_FLOOR,
};
pub use fusion::{clamp01, decide, total_probability, Decision, MATCH_THRESHOLD, NO_MATCH_THRESHOLD};
pub use bundle::{Bundle, Half, Orientation};
pub use bundle_io::{get_bundle_dirs_in_dir, is_bundle_dir, load_bundle, parse_histogram_file};
pub use pipeline::{run_match, CoarseMetricReport, FineMetricReport, MatchReport};
pub use output::write_report_csv;
