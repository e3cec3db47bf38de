//! Curve fitting.
//!
//! Responsibilities:
//!
//! - bounded Levenberg–Marquardt minimizer (`lm`)
//! - psychometric logistic fit with normalization and R² (`logistic`)
//! - independent per-series fits in parallel (`batch`)

pub mod batch;
pub mod lm;
pub mod logistic;

pub use batch::*;
pub use logistic::*;
