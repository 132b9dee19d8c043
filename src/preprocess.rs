// src/preprocess.rs - Geometric normalization of the candidate capture:
// noise-floor cropping, scaling onto the reference, region segmentation.

use image::imageops::crop_imm;
use image::RgbaImage;

use crate::bundle::Bundle;
use crate::errors::{GestureMatchError, Result};
use crate::histogram::Histogram;

/// Bins below this pixel count are treated as capture noise when cropping
pub const NOISE_FLOOR: u32 = 8;

/// Candidate data after geometric normalization, ready for the metrics
pub struct Prepared {
    pub image_cropped: RgbaImage,
    pub image_x_filtered: Histogram,
    pub image_y_filtered: Histogram,
    /// Bounding box of the significant support, (x0, y0, x1, y1) in
    /// histogram coordinates
    pub bounds: (u32, u32, u32, u32),
    pub image_x_scaled: Histogram,
    pub image_y_scaled: Histogram,
}

/// Drop bins below the noise floor
fn filter_noise(h: &Histogram) -> Histogram {
    h.iter().filter(|&(_, v)| v >= NOISE_FLOOR).collect()
}

/// Crop the candidate image to the statistically significant support of its
/// axis histograms.
///
/// Histogram coordinates originate at the far edge from the image's native
/// origin, so the crop box is mirrored: `dimension - high .. dimension - low`
/// on each axis.
pub fn crop_by_histogram(
    image: &RgbaImage,
    image_x: &Histogram,
    image_y: &Histogram,
) -> Result<(RgbaImage, Histogram, Histogram, (u32, u32, u32, u32))> {
    let filtered_x = filter_noise(image_x);
    let filtered_y = filter_noise(image_y);

    let (x0, x1) = match (filtered_x.min_key(), filtered_x.max_key()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            return Err(GestureMatchError::MalformedHistogram {
                context: "horizontal support after noise filtering".to_string(),
            })
        }
    };
    let (y0, y1) = match (filtered_y.min_key(), filtered_y.max_key()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            return Err(GestureMatchError::MalformedHistogram {
                context: "vertical support after noise filtering".to_string(),
            })
        }
    };

    let (image_w, image_h) = image.dimensions();
    let left = image_w.saturating_sub(x1);
    let top = image_h.saturating_sub(y1);
    let cropped = crop_imm(image, left, top, x1 - x0, y1 - y0).to_image();

    Ok((cropped, filtered_x, filtered_y, (x0, y0, x1, y1)))
}

/// Rescale one candidate axis histogram onto the reference's scale:
/// amplitude by the ratio of maximum bin values, then domain by the ratio of
/// maximum keys. Amplitude strictly first; the domain divisors are the
/// pre-rescale keys. Both ratios floor to integer, and key collisions after
/// domain rescaling keep the highest original key's value.
pub fn scale_to_reference(candidate: &Histogram, reference: &Histogram) -> Result<Histogram> {
    let cand_max_value = candidate.max_value().unwrap_or(0);
    let ref_max_value = reference.max_value().unwrap_or(0);
    if cand_max_value == 0 {
        return Err(GestureMatchError::MalformedHistogram {
            context: "candidate histogram has zero amplitude".to_string(),
        });
    }

    let amplitude_scaled: Histogram = candidate
        .iter()
        .map(|(k, v)| {
            (
                k,
                (v as f64 / cand_max_value as f64 * ref_max_value as f64) as u32,
            )
        })
        .collect();

    let cand_last = candidate.max_key().unwrap_or(0);
    let ref_last = reference.max_key().unwrap_or(0);
    if cand_last == 0 {
        return Err(GestureMatchError::MalformedHistogram {
            context: "candidate histogram has zero domain".to_string(),
        });
    }

    Ok(amplitude_scaled
        .iter()
        .map(|(k, v)| ((k as f64 / cand_last as f64 * ref_last as f64) as u32, v))
        .collect())
}

/// Split a vertical histogram at its domain midpoint (`max_key / 2`,
/// fractional). Strictly greater keys go to the upper half, the rest to the
/// lower half.
pub fn split_at_midpoint(h: &Histogram) -> Result<(Histogram, Histogram)> {
    let sep = match h.max_key() {
        Some(max) => max as f64 / 2.0,
        None => {
            return Err(GestureMatchError::MalformedHistogram {
                context: "empty histogram in region split".to_string(),
            })
        }
    };

    let lower = h.iter().filter(|&(k, _)| k as f64 <= sep).collect();
    let upper = h.iter().filter(|&(k, _)| k as f64 > sep).collect();
    Ok((lower, upper))
}

/// Re-normalize the isolated finger sub-histogram for the fine pass: shift
/// keys so the minimum becomes 0, then rescale the domain (amplitude
/// untouched) onto the reference vertical histogram's maximum key.
pub fn renormalize_fingers(fingers: &Histogram, reference_y: &Histogram) -> Result<Histogram> {
    let first = fingers.min_key().ok_or_else(|| GestureMatchError::MalformedHistogram {
        context: "empty finger region".to_string(),
    })?;

    let shifted: Histogram = fingers.iter().map(|(k, v)| (k - first, v)).collect();

    let fingers_last = shifted.max_key().unwrap_or(0);
    if fingers_last == 0 {
        return Err(GestureMatchError::MalformedHistogram {
            context: "finger region has zero domain".to_string(),
        });
    }
    let ref_last = reference_y.max_key().unwrap_or(0);

    Ok(shifted
        .iter()
        .map(|(k, v)| {
            (
                (k as f64 / fingers_last as f64 * ref_last as f64) as u32,
                v,
            )
        })
        .collect())
}

/// Run the full coarse-pass geometric normalization for one bundle
pub fn prepare_bundle(bundle: &Bundle) -> Result<Prepared> {
    let (image_cropped, image_x_filtered, image_y_filtered, bounds) =
        crop_by_histogram(&bundle.image, &bundle.image_x, &bundle.image_y)?;

    let image_x_scaled = scale_to_reference(&image_x_filtered, &bundle.reference_x)?;
    let image_y_scaled = scale_to_reference(&image_y_filtered, &bundle.reference_y)?;

    Ok(Prepared {
        image_cropped,
        image_x_filtered,
        image_y_filtered,
        bounds,
        image_x_scaled,
        image_y_scaled,
    })
}
