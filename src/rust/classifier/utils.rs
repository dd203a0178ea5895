use ndarray::{Array1, ArrayView1};

/// Numerically stable softmax; the result sums to 1.
///
/// `None` when the logits cannot be normalized (empty, NaN or infinite input).
pub(crate) fn softmax(logits: ArrayView1<f32>) -> Option<Array1<f32>> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return None;
    }
    let exps = logits.mapv(|x| (x - max).exp());
    let sum = exps.sum();
    if sum > 0.0 && sum.is_finite() {
        Some(exps / sum)
    } else {
        None
    }
}

pub(crate) fn sigmoid(logits: ArrayView1<f32>) -> Array1<f32> {
    logits.mapv(|x| 1.0 / (1.0 + (-x).exp()))
}

/// Index and value of the largest element, `None` for an empty or all-NaN vector.
/// The first of equal maxima wins.
pub(crate) fn argmax(values: &Array1<f32>) -> Option<(usize, f32)> {
    values
        .iter()
        .cloned()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}
