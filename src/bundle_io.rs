// src/bundle_io.rs - Loading a match bundle from a directory: manifest,
// projection histogram files, silhouette PNGs.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Deserialize;

use crate::bundle::{Bundle, Orientation};
use crate::errors::{GestureMatchError, Result};
use crate::histogram::Histogram;

/// Names the files making up one bundle, plus the gesture label and the
/// finger orientation tag
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(rename = "type")]
    pub gesture_type: String,
    pub fingers: String,
    pub image: String,
    pub image_x: String,
    pub image_y: String,
    pub reference: String,
    pub reference_x: String,
    pub reference_y: String,
}

pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Check whether a directory holds a single bundle
pub fn is_bundle_dir<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().join(MANIFEST_FILENAME).is_file()
}

/// Collect the immediate child directories that hold bundles
pub fn get_bundle_dirs_in_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(GestureMatchError::InvalidPath(dir_path.to_path_buf()));
    }
    if !dir_path.is_dir() {
        return Err(GestureMatchError::Config(format!(
            "{} is not a directory",
            dir_path.display()
        )));
    }

    let mut bundle_dirs = Vec::new();
    for entry in fs::read_dir(dir_path).map_err(GestureMatchError::Io)? {
        let entry = entry.map_err(GestureMatchError::Io)?;
        let path = entry.path();
        if path.is_dir() && is_bundle_dir(&path) {
            bundle_dirs.push(path);
        }
    }
    bundle_dirs.sort();

    Ok(bundle_dirs)
}

/// Parse a projection histogram file: one `key;count` pair per line,
/// both non-negative integers. Blank lines are ignored.
pub fn parse_histogram_file<P: AsRef<Path>>(path: P) -> Result<Histogram> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(GestureMatchError::Io)?;

    let mut histogram = Histogram::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let malformed = |reason: &str| GestureMatchError::HistogramParse {
            path: path.to_path_buf(),
            line: index + 1,
            reason: reason.to_string(),
        };

        let (key_part, count_part) = line
            .split_once(';')
            .ok_or_else(|| malformed("expected 'key;count'"))?;
        let key: u32 = key_part
            .trim()
            .parse()
            .map_err(|_| malformed("key is not a non-negative integer"))?;
        let count: u32 = count_part
            .trim()
            .parse()
            .map_err(|_| malformed("count is not a non-negative integer"))?;

        histogram.insert(key, count);
    }

    Ok(histogram)
}

/// Load a PNG ensuring RGBA format
fn load_png(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(GestureMatchError::Image)?;
    Ok(img.to_rgba8())
}

/// Load a complete bundle from a directory containing a manifest
pub fn load_bundle<P: AsRef<Path>>(dir: P) -> Result<Bundle> {
    let dir = dir.as_ref();
    let manifest_path = dir.join(MANIFEST_FILENAME);
    if !manifest_path.is_file() {
        return Err(GestureMatchError::Manifest(format!(
            "no {} in {}",
            MANIFEST_FILENAME,
            dir.display()
        )));
    }

    let content = fs::read_to_string(&manifest_path).map_err(GestureMatchError::Io)?;
    let manifest: Manifest = serde_json::from_str(&content)?;

    let orientation = Orientation::parse(&manifest.fingers)?;

    Ok(Bundle {
        gesture_type: manifest.gesture_type,
        orientation,
        image: load_png(&dir.join(&manifest.image))?,
        image_x: parse_histogram_file(dir.join(&manifest.image_x))?,
        image_y: parse_histogram_file(dir.join(&manifest.image_y))?,
        reference: load_png(&dir.join(&manifest.reference))?,
        reference_x: parse_histogram_file(dir.join(&manifest.reference_x))?,
        reference_y: parse_histogram_file(dir.join(&manifest.reference_y))?,
    })
}
