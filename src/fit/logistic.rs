//! Psychometric (4-parameter logistic) fit.
//!
//! Steps:
//!
//! 1. validate and normalize: `x = I / max(I)`, `y = (R - R[0]) / max(R - R[0])`
//! 2. initial guess `[x0, k, L, b] = [(min x + max x) / 2, 1, 0.5, 0]`
//! 3. bounds from [`BoundsPolicy`]
//! 4. bounded Levenberg–Marquardt on the normalized data
//! 5. R² against the normalized responses
//! 6. threshold in raw units: `x0 * max(I)`

use crate::domain::{
    BoundsPolicy, LogisticFit, LogisticOptions, LogisticParams, Normalization, ParameterBounds,
};
use crate::error::FitError;
use crate::fit::lm::{LmProblem, LmSettings, minimize};
use crate::math::{coefficient_of_determination, min_max};
use crate::models::logistic::{self, PARAM_COUNT};

/// Fewest samples that meaningfully constrain four parameters.
pub const MIN_LOGISTIC_SAMPLES: usize = 4;

/// Default intensities of the demo dataset.
pub const DEFAULT_INTENSITIES: [f64; 5] = [0.0, 50.0, 150.0, 300.0, 500.0];
/// Default responses of the demo dataset.
pub const DEFAULT_RESPONSES: [f64; 5] = [0.6, 0.7, 5.2, 21.5, 41.4];

/// Normalized samples plus the scale factors that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub normalization: Normalization,
}

/// Validate raw samples and scale them into the unit range.
pub fn normalize_series(intensities: &[f64], responses: &[f64]) -> Result<NormalizedSeries, FitError> {
    if intensities.len() != responses.len() {
        return Err(FitError::validation(format!(
            "intensities and responses must have the same length ({} vs {})",
            intensities.len(),
            responses.len()
        )));
    }
    if intensities.len() < MIN_LOGISTIC_SAMPLES {
        return Err(FitError::validation(format!(
            "logistic fit needs at least {MIN_LOGISTIC_SAMPLES} samples, got {}",
            intensities.len()
        )));
    }
    if intensities.iter().chain(responses.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::validation("inputs must be finite numbers"));
    }

    let x_max = intensities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if x_max <= 0.0 {
        return Err(FitError::validation(format!(
            "maximum intensity must be positive to normalize, got {x_max}"
        )));
    }

    let y_base = responses[0];
    let y_max = responses
        .iter()
        .map(|r| r - y_base)
        .fold(f64::NEG_INFINITY, f64::max);
    if y_max <= 0.0 {
        return Err(FitError::validation(
            "responses never rise above the first sample; normalization range is zero",
        ));
    }

    let normalization = Normalization {
        x_max,
        y_base,
        y_max,
    };
    Ok(NormalizedSeries {
        x: intensities.iter().map(|&i| normalization.normalize_x(i)).collect(),
        y: responses.iter().map(|&r| normalization.normalize_y(r)).collect(),
        normalization,
    })
}

/// Starting point: midpoint of the x-range, unit steepness, half amplitude, zero baseline.
pub fn initial_guess(x_min: f64, x_max: f64) -> LogisticParams {
    LogisticParams {
        x0: (x_min + x_max) / 2.0,
        k: 1.0,
        amplitude: 0.5,
        baseline: 0.0,
    }
}

/// Fit `L / (1 + exp(-k (x - x0))) + b` to intensity/response samples.
///
/// Hitting the iteration cap is reported through [`LogisticFit::converged`],
/// never as an error.
pub fn fit_logistic(
    intensities: &[f64],
    responses: &[f64],
    options: &LogisticOptions,
) -> Result<LogisticFit, FitError> {
    options.validate()?;
    let series = normalize_series(intensities, responses)?;

    let (x_min, x_max) = min_max(&series.x)
        .ok_or_else(|| FitError::validation("no finite intensities to fit"))?;

    let bounds = match options.bounds {
        BoundsPolicy::InputRange => ParameterBounds::input_range(x_min, x_max),
        BoundsPolicy::Explicit(bounds) => bounds,
    };
    let lower = bounds.lower.to_array();
    let upper = bounds.upper.to_array();
    let initial = initial_guess(x_min, x_max).to_array();

    let problem = LmProblem {
        xs: &series.x,
        ys: &series.y,
        lower: &lower,
        upper: &upper,
    };
    let settings = LmSettings {
        damping: options.damping,
        max_iterations: options.max_iterations,
        gradient_difference: options.gradient_difference,
        central_difference: options.central_difference,
        error_tolerance: options.error_tolerance,
        step_tolerance: options.step_tolerance,
    };
    let outcome = minimize(&problem, logistic::evaluate, &initial, &settings);
    debug_assert_eq!(outcome.params.len(), PARAM_COUNT);

    let params = LogisticParams::from_slice(&outcome.params);
    let predicted = logistic::evaluate_all(&outcome.params, &series.x);
    // Normalized y always spans [0, 1], so SS_tot > 0 after validation.
    let r_squared = coefficient_of_determination(&series.y, &predicted)
        .ok_or_else(|| FitError::validation("responses have no variance"))?;

    if outcome.converged {
        log::debug!(
            "logistic fit converged in {} iterations: x0={:.4} k={:.4} L={:.4} b={:.4} R²={r_squared:.4}",
            outcome.iterations,
            params.x0,
            params.k,
            params.amplitude,
            params.baseline
        );
    } else {
        log::warn!(
            "logistic fit stopped at the iteration cap ({}) without converging; sse={:e}",
            outcome.iterations,
            outcome.sse
        );
    }

    Ok(LogisticFit {
        params,
        r_squared,
        converged: outcome.converged,
        iterations: outcome.iterations,
        sse: outcome.sse,
        normalization: series.normalization,
        threshold_raw: series.normalization.raw_x(params.x0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic() -> (Vec<f64>, Vec<f64>) {
        let xs: Vec<f64> = (0..20).map(|i| i as f64 / 19.0).collect();
        let ys = xs
            .iter()
            .map(|&x| 5.0 / (1.0 + (-2.0 * (x - 0.5)).exp()) + 1.0)
            .collect();
        (xs, ys)
    }

    fn wide_bounds() -> ParameterBounds {
        ParameterBounds {
            lower: LogisticParams {
                x0: 0.0,
                k: 0.0,
                amplitude: 0.0,
                baseline: -5.0,
            },
            upper: LogisticParams {
                x0: 1.0,
                k: 500.0,
                amplitude: 10.0,
                baseline: 5.0,
            },
        }
    }

    #[test]
    fn normalization_uses_first_response_as_base() {
        let s = normalize_series(&DEFAULT_INTENSITIES, &DEFAULT_RESPONSES).unwrap();
        assert_eq!(s.normalization.x_max, 500.0);
        assert_eq!(s.normalization.y_base, 0.6);
        assert!((s.normalization.y_max - 40.8).abs() < 1e-12);
        assert_eq!(s.x, vec![0.0, 0.1, 0.3, 0.6, 1.0]);
        assert_eq!(s.y[0], 0.0);
        assert!((s.y[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_dataset_converges_with_good_fit() {
        let fit = fit_logistic(&DEFAULT_INTENSITIES, &DEFAULT_RESPONSES, &LogisticOptions::default())
            .unwrap();
        assert!(fit.converged, "iterations={}", fit.iterations);
        assert!(fit.r_squared > 0.9, "r2={}", fit.r_squared);
        assert!(fit.params.x0 > 0.3 && fit.params.x0 < 0.9);
        assert!((fit.threshold_raw - fit.params.x0 * 500.0).abs() < 1e-9);
    }

    #[test]
    fn default_bounds_follow_input_range() {
        let fit = fit_logistic(&DEFAULT_INTENSITIES, &DEFAULT_RESPONSES, &LogisticOptions::default())
            .unwrap();
        let p = fit.params;
        assert!((0.0..=1.0).contains(&p.x0));
        assert!((0.0..=500.0).contains(&p.k));
        assert!((0.0..=1.0).contains(&p.amplitude));
        assert!((0.0..=1.0).contains(&p.baseline));
    }

    #[test]
    fn recovers_noiseless_logistic_with_wide_bounds() {
        let (xs, ys) = synthetic();
        let options = LogisticOptions {
            bounds: BoundsPolicy::Explicit(wide_bounds()),
            ..LogisticOptions::default()
        };
        let fit = fit_logistic(&xs, &ys, &options).unwrap();
        assert!(fit.converged);
        assert!(fit.r_squared > 0.999_999);

        let raw = fit.raw_params();
        assert!((raw.x0 - 0.5).abs() < 1e-3, "x0={}", raw.x0);
        assert!((raw.k - 2.0).abs() < 1e-2, "k={}", raw.k);
        assert!((raw.amplitude - 5.0).abs() < 1e-2, "L={}", raw.amplitude);
        assert!((raw.baseline - 1.0).abs() < 1e-2, "b={}", raw.baseline);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let (xs, ys) = synthetic();
        let options = LogisticOptions {
            max_iterations: 2,
            bounds: BoundsPolicy::Explicit(wide_bounds()),
            ..LogisticOptions::default()
        };
        let fit = fit_logistic(&xs, &ys, &options).unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.iterations, 2);
        assert!(fit.params.is_finite());
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let opts = LogisticOptions::default();
        let cases: [(&[f64], &[f64]); 5] = [
            (&[0.0, 0.0, 0.0, 0.0], &[1.0, 2.0, 3.0, 4.0]),
            (&[1.0, 2.0, 3.0, 4.0], &[2.0, 2.0, 2.0, 2.0]),
            (&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]),
            (&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0]),
            (&[1.0, 2.0, f64::NAN, 4.0], &[1.0, 2.0, 3.0, 4.0]),
        ];
        for (i, r) in cases {
            assert!(
                matches!(fit_logistic(i, r, &opts), Err(FitError::Validation(_))),
                "expected validation error for {i:?} / {r:?}"
            );
        }
    }

    #[test]
    fn invalid_options_are_rejected() {
        let opts = LogisticOptions {
            damping: 0.0,
            ..LogisticOptions::default()
        };
        assert!(fit_logistic(&DEFAULT_INTENSITIES, &DEFAULT_RESPONSES, &opts).is_err());
    }

    #[test]
    fn repeated_fits_are_identical() {
        let opts = LogisticOptions::default();
        let a = fit_logistic(&DEFAULT_INTENSITIES, &DEFAULT_RESPONSES, &opts).unwrap();
        let b = fit_logistic(&DEFAULT_INTENSITIES, &DEFAULT_RESPONSES, &opts).unwrap();
        assert_eq!(a, b);
    }
}
