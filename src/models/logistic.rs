//! Four-parameter logistic (psychometric) curve.
//!
//! ```text
//! f(x) = L / (1 + exp(-k (x - x0))) + b
//! ```
//!
//! Parameter vectors are ordered `[x0, k, L, b]` everywhere in the crate.

pub const PARAM_COUNT: usize = 4;

pub const PARAM_NAMES: [&str; PARAM_COUNT] = ["x0", "k", "L", "b"];

/// Evaluate the logistic at `x` for parameters `[x0, k, L, b]`.
///
/// # Panics
/// Panics if `params` has fewer than four entries.
pub fn evaluate(params: &[f64], x: f64) -> f64 {
    let (x0, k, amplitude, baseline) = (params[0], params[1], params[2], params[3]);
    // For large positive exponents `exp` overflows to +inf and the fraction
    // correctly collapses to 0.
    amplitude / (1.0 + (-k * (x - x0)).exp()) + baseline
}

/// Evaluate the logistic over a slice of inputs.
pub fn evaluate_all(params: &[f64], xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| evaluate(params, x)).collect()
}
