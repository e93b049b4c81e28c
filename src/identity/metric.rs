//! Distances between feature vectors and the confidence curve derived from them.

use ndarray::{Array1, ArrayView1};

/// Euclidean distance between two feature vectors of equal length.
///
/// Returns `None` when the lengths differ.
pub fn euclidean(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(sum.sqrt())
}

/// Distances from `query` to each of `records`, in record order.
///
/// Records of a different length get `f32::INFINITY` so they never win an
/// argmin and never satisfy a threshold.
pub fn distance_batch<'a, I>(records: I, query: ArrayView1<'_, f32>) -> Array1<f32>
where
    I: IntoIterator<Item = ArrayView1<'a, f32>>,
{
    records
        .into_iter()
        .map(|r| euclidean(r, query).unwrap_or(f32::INFINITY))
        .collect()
}

/// Index of the smallest distance; the first index wins ties.
pub fn argmin(distances: &Array1<f32>) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &d) in distances.iter().enumerate() {
        match best {
            Some((_, bd)) if d >= bd => {}
            _ if d.is_nan() => {}
            _ => best = Some((i, d)),
        }
    }
    best
}

/// Confidence, in percent, that a match at `distance` is correct.
///
/// Beyond `match_threshold` this is the linear `(1 - d) * 100`. At or below
/// it the linear value is lifted by `d * ((1 - d) - 0.5)^2 * 0.2`, which
/// flattens the curve near the threshold and pins an exact match to 100.
pub fn face_confidence(distance: f32, match_threshold: f32) -> f32 {
    let linear = 1.0 - distance;
    if distance > match_threshold {
        linear * 100.0
    } else {
        let lift = (1.0 - linear) * (linear - 0.5).powi(2) * 0.2;
        (linear + lift) * 100.0
    }
}

/// Render a confidence as a percentage with two decimals, e.g. `"97.31%"`.
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.2}%", confidence)
}
