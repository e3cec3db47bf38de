//! Bounded Levenberg–Marquardt minimizer.
//!
//! Minimizes `Σ (y_i - f(x_i; p))²` for a model given as a closure over the
//! parameter slice. Each iteration:
//!
//! - builds `JᵀJ` and `Jᵀr` from a finite-difference Jacobian (only after the
//!   previous trial was accepted)
//! - holds fixed any parameter that sits on a bound and whose descent direction
//!   points outside the box
//! - solves `(JᵀJ + λI) δ = Jᵀr` and clamps `p + δ` into the bounds
//! - accepts the trial if the SSE decreased (λ shrinks), otherwise rejects it
//!   (λ grows)
//!
//! The solver is deterministic: the same input always takes the same path.

use nalgebra::{DMatrix, DVector};

use crate::math::solve_least_squares;

/// Damping divisor after an accepted step.
const DAMPING_STEP_DOWN: f64 = 9.0;
/// Damping multiplier after a rejected step.
const DAMPING_STEP_UP: f64 = 11.0;
const MIN_DAMPING: f64 = 1e-7;
const MAX_DAMPING: f64 = 1e7;

#[derive(Debug, Clone, Copy)]
pub struct LmSettings {
    pub damping: f64,
    pub max_iterations: usize,
    pub gradient_difference: f64,
    pub central_difference: bool,
    pub error_tolerance: f64,
    pub step_tolerance: f64,
}

/// Data and box constraints for one minimization.
#[derive(Debug, Clone, Copy)]
pub struct LmProblem<'a> {
    pub xs: &'a [f64],
    pub ys: &'a [f64],
    pub lower: &'a [f64],
    pub upper: &'a [f64],
}

#[derive(Debug, Clone, PartialEq)]
pub struct LmOutcome {
    /// Best parameters found (always inside the bounds).
    pub params: Vec<f64>,
    pub sse: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Damping factor at exit.
    pub damping: f64,
}

/// Minimize the sum of squared residuals of `model` starting from `initial`.
///
/// # Panics
/// Panics if `initial`, `lower` and `upper` differ in length, if `xs` and `ys`
/// differ in length, or if any `lower[j] > upper[j]`. Callers validate these.
pub fn minimize<F>(problem: &LmProblem<'_>, model: F, initial: &[f64], settings: &LmSettings) -> LmOutcome
where
    F: Fn(&[f64], f64) -> f64,
{
    assert_eq!(problem.xs.len(), problem.ys.len());
    assert_eq!(initial.len(), problem.lower.len());
    assert_eq!(initial.len(), problem.upper.len());

    let mut params = clamp_into(initial, problem.lower, problem.upper);
    let mut sse = sum_squared_residuals(problem, &model, &params);
    let mut damping = settings.damping;
    let mut iterations = 0usize;
    let mut converged = sse <= settings.error_tolerance;

    let mut system = None;

    while !converged && iterations < settings.max_iterations {
        iterations += 1;

        let (jtj, jtr) = system.get_or_insert_with(|| normal_equations(problem, &model, &params, settings));

        let active = active_bounds(&params, jtr, problem.lower, problem.upper);
        let Some(delta) = damped_step(jtj, jtr, damping, &active) else {
            log::trace!("iteration {iterations}: singular damped system at lambda={damping:e}");
            damping = (damping * DAMPING_STEP_UP).min(MAX_DAMPING);
            continue;
        };

        let trial: Vec<f64> = params
            .iter()
            .zip(delta.iter())
            .enumerate()
            .map(|(j, (p, d))| (p + d).clamp(problem.lower[j], problem.upper[j]))
            .collect();

        let step = params
            .iter()
            .zip(trial.iter())
            .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));
        let scale = params.iter().fold(0.0_f64, |acc, p| acc.max(p.abs()));
        let negligible_step = step <= settings.step_tolerance * (scale + settings.step_tolerance);

        let trial_sse = sum_squared_residuals(problem, &model, &trial);
        if trial_sse.is_finite() && trial_sse < sse {
            params = trial;
            sse = trial_sse;
            damping = (damping / DAMPING_STEP_DOWN).max(MIN_DAMPING);
            system = None;
            converged = sse <= settings.error_tolerance || negligible_step;
        } else {
            damping = (damping * DAMPING_STEP_UP).min(MAX_DAMPING);
            // No admissible movement left inside the box.
            converged = negligible_step;
        }

        log::trace!("iteration {iterations}: sse={sse:e} lambda={damping:e} step={step:e}");
    }

    LmOutcome {
        params,
        sse,
        iterations,
        converged,
        damping,
    }
}

fn clamp_into(values: &[f64], lower: &[f64], upper: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .map(|(v, (lo, hi))| v.clamp(*lo, *hi))
        .collect()
}

fn sum_squared_residuals<F>(problem: &LmProblem<'_>, model: &F, params: &[f64]) -> f64
where
    F: Fn(&[f64], f64) -> f64,
{
    problem
        .xs
        .iter()
        .zip(problem.ys.iter())
        .map(|(&x, &y)| (y - model(params, x)).powi(2))
        .sum()
}

/// `(JᵀJ, Jᵀr)` with `J = ∂f/∂p` by finite differences and `r = y - f`.
fn normal_equations<F>(
    problem: &LmProblem<'_>,
    model: &F,
    params: &[f64],
    settings: &LmSettings,
) -> (DMatrix<f64>, DVector<f64>)
where
    F: Fn(&[f64], f64) -> f64,
{
    let jacobian = finite_difference_jacobian(
        problem.xs,
        model,
        params,
        settings.gradient_difference,
        settings.central_difference,
    );
    let residuals = DVector::from_iterator(
        problem.xs.len(),
        problem
            .xs
            .iter()
            .zip(problem.ys.iter())
            .map(|(&x, &y)| y - model(params, x)),
    );
    let jt = jacobian.transpose();
    (&jt * &jacobian, &jt * residuals)
}

/// Jacobian `∂f(x_i; p)/∂p_j` (rows are samples, columns parameters).
pub fn finite_difference_jacobian<F>(
    xs: &[f64],
    model: &F,
    params: &[f64],
    h: f64,
    central: bool,
) -> DMatrix<f64>
where
    F: Fn(&[f64], f64) -> f64,
{
    let mut jacobian = DMatrix::<f64>::zeros(xs.len(), params.len());
    let mut shifted = params.to_vec();

    for (i, &x) in xs.iter().enumerate() {
        let f0 = model(params, x);
        for j in 0..params.len() {
            shifted[j] = params[j] + h;
            let forward = model(&shifted, x);
            jacobian[(i, j)] = if central {
                shifted[j] = params[j] - h;
                (forward - model(&shifted, x)) / (2.0 * h)
            } else {
                (forward - f0) / h
            };
            shifted[j] = params[j];
        }
    }

    jacobian
}

/// Parameters pinned to a bound with the descent direction pointing outward.
fn active_bounds(params: &[f64], jtr: &DVector<f64>, lower: &[f64], upper: &[f64]) -> Vec<bool> {
    params
        .iter()
        .enumerate()
        .map(|(j, &p)| (p <= lower[j] && jtr[j] < 0.0) || (p >= upper[j] && jtr[j] > 0.0))
        .collect()
}

fn damped_step(
    jtj: &DMatrix<f64>,
    jtr: &DVector<f64>,
    damping: f64,
    active: &[bool],
) -> Option<DVector<f64>> {
    let mut a = jtj.clone();
    let mut g = jtr.clone();
    for j in 0..g.len() {
        a[(j, j)] += damping;
    }
    for (j, _) in active.iter().enumerate().filter(|(_, pinned)| **pinned) {
        a.row_mut(j).fill(0.0);
        a.column_mut(j).fill(0.0);
        a[(j, j)] = 1.0;
        g[j] = 0.0;
    }

    let delta = match a.clone().cholesky() {
        Some(chol) => chol.solve(&g),
        None => solve_least_squares(&a, &g)?,
    };
    delta.iter().all(|v| v.is_finite()).then_some(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LmSettings {
        LmSettings {
            damping: 1.5,
            max_iterations: 200,
            gradient_difference: 1e-4,
            central_difference: false,
            error_tolerance: 1e-14,
            step_tolerance: 1e-12,
        }
    }

    fn line(p: &[f64], x: f64) -> f64 {
        p[0] + p[1] * x
    }

    #[test]
    fn fits_linear_model() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let lower = [-10.0, -10.0];
        let upper = [10.0, 10.0];
        let problem = LmProblem {
            xs: &xs,
            ys: &ys,
            lower: &lower,
            upper: &upper,
        };
        let out = minimize(&problem, line, &[0.0, 0.0], &settings());
        assert!(out.converged);
        assert!((out.params[0] - 1.0).abs() < 1e-5);
        assert!((out.params[1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn respects_bounds() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let lower = [-10.0, -10.0];
        let upper = [10.0, 1.5];
        let problem = LmProblem {
            xs: &xs,
            ys: &ys,
            lower: &lower,
            upper: &upper,
        };
        let out = minimize(&problem, line, &[0.0, 0.0], &settings());
        assert!(out.converged);
        assert!((out.params[1] - 1.5).abs() < 1e-12);
        // Best intercept given slope 1.5: mean(y - 1.5 x) = 4 - 2.25.
        assert!((out.params[0] - 1.75).abs() < 1e-5);
    }

    #[test]
    fn initial_guess_is_clamped() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 0.0];
        let lower = [0.5, 0.0];
        let upper = [1.0, 1.0];
        let problem = LmProblem {
            xs: &xs,
            ys: &ys,
            lower: &lower,
            upper: &upper,
        };
        let out = minimize(&problem, line, &[-3.0, 4.0], &settings());
        assert!(out.params[0] >= 0.5 && out.params[1] <= 1.0);
    }

    #[test]
    fn iteration_cap_reports_not_converged() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.1];
        let lower = [-10.0, -10.0];
        let upper = [10.0, 10.0];
        let problem = LmProblem {
            xs: &xs,
            ys: &ys,
            lower: &lower,
            upper: &upper,
        };
        let capped = LmSettings {
            max_iterations: 1,
            ..settings()
        };
        let out = minimize(&problem, line, &[0.0, 0.0], &capped);
        assert_eq!(out.iterations, 1);
        assert!(!out.converged);
        assert!(out.params.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn forward_and_central_jacobians_agree_on_linear_model() {
        let xs = [0.0, 0.5, 2.0];
        let fwd = finite_difference_jacobian(&xs, &line, &[1.0, 2.0], 1e-3, false);
        let ctr = finite_difference_jacobian(&xs, &line, &[1.0, 2.0], 1e-3, true);
        for i in 0..xs.len() {
            assert!((fwd[(i, 0)] - 1.0).abs() < 1e-9);
            assert!((fwd[(i, 1)] - xs[i]).abs() < 1e-9);
            assert!((ctr[(i, 1)] - xs[i]).abs() < 1e-9);
        }
    }
}
