//! Least squares: closed-form simple regression and a general SVD solver.
//!
//! `fit_linear` is the two-parameter OLS used for scatter trend lines:
//!
//! ```text
//! slope     = Σ (x - x̄)(y - ȳ) / Σ (x - x̄)²
//! intercept = ȳ - slope · x̄
//! ```
//!
//! The sums are taken over `x / max|x|` and `y / max|y|` and rescaled, so any
//! finite input with two distinct x values yields a line unless the line
//! itself does not fit in `f64`.
//!
//! `solve_least_squares` solves a general (possibly tall) design-matrix problem
//! via SVD. The Levenberg–Marquardt solver falls back to it when the damped
//! normal equations are not positive definite.

use nalgebra::{DMatrix, DVector};

use crate::domain::{LinearFit, PlotPoint};
use crate::error::FitError;
use crate::math::stats::{mean, min_max};

/// Fit `y = intercept + slope · x` by ordinary least squares.
///
/// Fails with [`FitError::Validation`] on mismatched lengths, fewer than two
/// samples or non-finite values, and with [`FitError::DivisionByZero`] when
/// every `x` is identical.
pub fn fit_linear(xs: &[f64], ys: &[f64]) -> Result<LinearFit, FitError> {
    if xs.len() != ys.len() {
        return Err(FitError::validation(format!(
            "x and y must have the same length ({} vs {})",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(FitError::validation(format!(
            "linear fit needs at least 2 samples, got {}",
            xs.len()
        )));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::validation("inputs must be finite numbers"));
    }
    // Compare values directly: a rounded mean can leave a tiny non-zero
    // variance for inputs that are all equal.
    if xs.iter().all(|&x| x == xs[0]) {
        return Err(FitError::division_by_zero(format!(
            "all x values are identical ({})",
            xs[0]
        )));
    }

    // Sums run on x / max|x| and y / max|y| so that squares and means stay
    // finite for any finite input. x_scale > 0 because the x values differ.
    let x_scale = max_abs(xs);
    let y_scale = match max_abs(ys) {
        s if s > 0.0 => s,
        _ => 1.0,
    };
    let us: Vec<f64> = xs.iter().map(|x| x / x_scale).collect();
    let vs: Vec<f64> = ys.iter().map(|y| y / y_scale).collect();
    let u_mean = mean(&us);
    let v_mean = mean(&vs);

    let mut suv = 0.0;
    let mut suu = 0.0;
    for (&u, &v) in us.iter().zip(vs.iter()) {
        let du = u - u_mean;
        suv += du * (v - v_mean);
        suu += du * du;
    }
    if !(suu > 0.0) {
        return Err(FitError::validation("x values differ by less than f64 can resolve"));
    }

    let scaled_slope = suv / suu;
    let slope = scaled_slope / x_scale * y_scale;
    let intercept = y_scale * (v_mean - scaled_slope * u_mean);

    let (x_min, x_max) = min_max(xs).unwrap_or((xs[0], xs[0]));
    let line = [
        PlotPoint {
            x: x_min,
            y: intercept + slope * x_min,
        },
        PlotPoint {
            x: x_max,
            y: intercept + slope * x_max,
        },
    ];
    if !(slope.is_finite() && intercept.is_finite() && line.iter().all(|p| p.y.is_finite())) {
        return Err(FitError::validation(format!(
            "fitted line is not representable in f64 (slope={slope}, intercept={intercept})"
        )));
    }

    log::debug!("OLS fit over {} samples: slope={slope:.6} intercept={intercept:.6}", xs.len());

    Ok(LinearFit {
        slope,
        intercept,
        line,
    })
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
