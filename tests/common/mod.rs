#![allow(dead_code)]

use std::path::PathBuf;

/// Unique scratch path under the system temp dir.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("psyfit-it-{}-{name}", std::process::id()))
}

/// Noiseless `L / (1 + exp(-k (x - x0))) + b` sampled on `[0, 1]`.
pub fn logistic_samples(n: usize, x0: f64, k: f64, amplitude: f64, baseline: f64) -> (Vec<f64>, Vec<f64>) {
    let xs: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
    let ys = xs
        .iter()
        .map(|&x| amplitude / (1.0 + (-k * (x - x0)).exp()) + baseline)
        .collect();
    (xs, ys)
}
