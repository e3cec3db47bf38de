//! Summary statistics shared by the fitters and reports.

use crate::error::FitError;

/// Arithmetic mean. Returns `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// `(min, max)` of the finite values, or `None` if there are none.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// `SS_tot` is taken around the mean of `observed`. Returns `None` when the
/// observations have no variance (R² is undefined) or the lengths differ.
pub fn coefficient_of_determination(observed: &[f64], predicted: &[f64]) -> Option<f64> {
    if observed.len() != predicted.len() || observed.is_empty() {
        return None;
    }
    let y_mean = mean(observed);
    let ss_res: f64 = observed
        .iter()
        .zip(predicted.iter())
        .map(|(y, y_hat)| (y - y_hat).powi(2))
        .sum();
    let ss_tot: f64 = observed.iter().map(|y| (y - y_mean).powi(2)).sum();
    if ss_tot > 0.0 {
        Some(1.0 - ss_res / ss_tot)
    } else {
        None
    }
}

/// Rescale values to `[0, 1]` via `(v - min) / (max - min)`.
pub fn min_max_normalize(values: &[f64]) -> Result<Vec<f64>, FitError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FitError::validation("cannot normalize non-finite values"));
    }
    let Some((lo, hi)) = min_max(values) else {
        return Err(FitError::validation("cannot normalize an empty series"));
    };
    let range = hi - lo;
    if range <= 0.0 {
        return Err(FitError::validation(format!(
            "cannot normalize a constant series (all values = {lo})"
        )));
    }
    Ok(values.iter().map(|v| (v - lo) / range).collect())
}
