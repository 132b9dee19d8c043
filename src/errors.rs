use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for gesture matching
#[derive(Error, Debug)]
pub enum GestureMatchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("Malformed histogram ({context}): fewer than 2 distinct bins or zero total mass")]
    MalformedHistogram { context: String },

    #[error("Degenerate {metric} metric ({context}): zero denominator")]
    DegenerateMetric {
        metric: &'static str,
        context: String,
    },

    #[error("Invalid bundle manifest: {0}")]
    Manifest(String),

    #[error("Failed to parse manifest: {0}")]
    ManifestJson(#[from] serde_json::Error),

    #[error("Malformed histogram file {path}, line {line}: {reason}")]
    HistogramParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),

    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, GestureMatchError>;
