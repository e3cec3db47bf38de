//! Shared domain types.
//!
//! These types are plain data: every fit is a pure function from input slices
//! to one of these results, so nothing here owns state beyond a single call.
//! Result types are serializable so they can be exported to JSON/CSV and
//! reloaded later for plotting or comparisons.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::models::logistic;

/// A single `(x, y)` point, used for plot-ready output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

/// Ordinary least squares line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Line endpoints at `min(x)` and `max(x)`. For plotting only.
    pub line: [PlotPoint; 2],
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Line endpoints over an arbitrary x-domain (e.g. a fixed `[0, 1]` axis).
    pub fn segment(&self, x_lo: f64, x_hi: f64) -> [PlotPoint; 2] {
        [
            PlotPoint {
                x: x_lo,
                y: self.predict(x_lo),
            },
            PlotPoint {
                x: x_hi,
                y: self.predict(x_hi),
            },
        ]
    }
}

/// Scale factors applied before a logistic fit.
///
/// `x = I / x_max`, `y = (R - y_base) / y_max`. The same record is needed to
/// report results back in raw units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub x_max: f64,
    pub y_base: f64,
    pub y_max: f64,
}

impl Normalization {
    pub fn normalize_x(&self, intensity: f64) -> f64 {
        intensity / self.x_max
    }

    pub fn normalize_y(&self, response: f64) -> f64 {
        (response - self.y_base) / self.y_max
    }

    pub fn raw_x(&self, x: f64) -> f64 {
        x * self.x_max
    }

    pub fn raw_y(&self, y: f64) -> f64 {
        y * self.y_max + self.y_base
    }
}

/// Parameters of `L / (1 + exp(-k (x - x0))) + b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inflection point (threshold).
    pub x0: f64,
    /// Steepness.
    pub k: f64,
    /// Response amplitude `L`.
    #[serde(rename = "L")]
    pub amplitude: f64,
    /// Baseline offset `b`.
    #[serde(rename = "b")]
    pub baseline: f64,
}

impl LogisticParams {
    pub fn to_array(self) -> [f64; logistic::PARAM_COUNT] {
        [self.x0, self.k, self.amplitude, self.baseline]
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            x0: values[0],
            k: values[1],
            amplitude: values[2],
            baseline: values[3],
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        logistic::evaluate(&self.to_array(), x)
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Box constraints for the four logistic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    pub lower: LogisticParams,
    pub upper: LogisticParams,
}

/// Upper bound on the steepness `k`.
pub const MAX_STEEPNESS: f64 = 500.0;

impl ParameterBounds {
    /// Bounds derived from the normalized input range.
    ///
    /// `x0`, `L` and `b` are all bounded by `[x_min, x_max]`; `k` by
    /// `[0, MAX_STEEPNESS]`. The amplitude and baseline bounds mirror the
    /// x-range rather than the y-range.
    pub fn input_range(x_min: f64, x_max: f64) -> Self {
        Self {
            lower: LogisticParams {
                x0: x_min,
                k: 0.0,
                amplitude: x_min,
                baseline: x_min,
            },
            upper: LogisticParams {
                x0: x_max,
                k: MAX_STEEPNESS,
                amplitude: x_max,
                baseline: x_max,
            },
        }
    }

    pub fn validate(&self) -> Result<(), FitError> {
        let lower = self.lower.to_array();
        let upper = self.upper.to_array();
        for (j, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(FitError::validation(format!(
                    "invalid bounds for parameter {}: [{lo}, {hi}]",
                    logistic::PARAM_NAMES[j]
                )));
            }
        }
        Ok(())
    }
}

/// How parameter bounds are chosen for a logistic fit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// [`ParameterBounds::input_range`] over the normalized intensities.
    #[default]
    InputRange,
    /// Caller-supplied bounds in normalized units.
    Explicit(ParameterBounds),
}

/// Solver configuration for [`crate::fit::fit_logistic`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticOptions {
    /// Initial Levenberg–Marquardt damping factor.
    pub damping: f64,
    pub max_iterations: usize,
    /// Step used for finite-difference derivatives.
    pub gradient_difference: f64,
    /// Use central instead of forward differences.
    pub central_difference: bool,
    /// Stop once the sum of squared residuals falls to this level.
    pub error_tolerance: f64,
    /// Stop once a step moves no parameter further than this (relative).
    pub step_tolerance: f64,
    pub bounds: BoundsPolicy,
}

impl Default for LogisticOptions {
    fn default() -> Self {
        Self {
            damping: 1.5,
            max_iterations: 1000,
            gradient_difference: 1e-2,
            central_difference: false,
            error_tolerance: 1e-10,
            step_tolerance: 1e-10,
            bounds: BoundsPolicy::InputRange,
        }
    }
}

impl LogisticOptions {
    pub fn validate(&self) -> Result<(), FitError> {
        if !(self.damping.is_finite() && self.damping > 0.0) {
            return Err(FitError::validation(format!(
                "damping must be a positive number, got {}",
                self.damping
            )));
        }
        if self.max_iterations == 0 {
            return Err(FitError::validation("max_iterations must be >= 1"));
        }
        if !(self.gradient_difference.is_finite() && self.gradient_difference > 0.0) {
            return Err(FitError::validation(format!(
                "gradient_difference must be a positive number, got {}",
                self.gradient_difference
            )));
        }
        if !(self.error_tolerance.is_finite() && self.error_tolerance >= 0.0) {
            return Err(FitError::validation("error_tolerance must be finite and >= 0"));
        }
        if !(self.step_tolerance.is_finite() && self.step_tolerance >= 0.0) {
            return Err(FitError::validation("step_tolerance must be finite and >= 0"));
        }
        if let BoundsPolicy::Explicit(bounds) = &self.bounds {
            bounds.validate()?;
        }
        Ok(())
    }
}

/// Outcome of a bounded logistic fit.
///
/// `params` are in normalized units; use [`LogisticFit::raw_params`] for the
/// original intensity/response scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticFit {
    pub params: LogisticParams,
    pub r_squared: f64,
    /// `false` when the iteration cap was reached before a stopping criterion.
    pub converged: bool,
    pub iterations: usize,
    /// Sum of squared residuals in normalized units.
    pub sse: f64,
    pub normalization: Normalization,
    /// `x0 * x_max`.
    pub threshold_raw: f64,
}

/// Number of points in the default prediction grid.
pub const PREDICTION_GRID_POINTS: usize = 200;

impl LogisticFit {
    pub fn predict_normalized(&self, x: f64) -> f64 {
        self.params.evaluate(x)
    }

    /// Threshold marker: `(x0, f(x0))` in normalized units.
    pub fn threshold_point(&self) -> PlotPoint {
        PlotPoint {
            x: self.params.x0,
            y: self.predict_normalized(self.params.x0),
        }
    }

    /// Parameters expressed against raw intensities and responses.
    pub fn raw_params(&self) -> LogisticParams {
        let norm = &self.normalization;
        LogisticParams {
            x0: norm.raw_x(self.params.x0),
            k: self.params.k / norm.x_max,
            amplitude: self.params.amplitude * norm.y_max,
            baseline: norm.raw_y(self.params.baseline),
        }
    }

    /// `n` evenly spaced points of the fitted curve on the normalized `[0, 1]` axis.
    pub fn prediction_grid(&self, n: usize) -> Vec<PlotPoint> {
        let n = n.max(2);
        (0..n)
            .map(|i| {
                let x = i as f64 / (n as f64 - 1.0);
                PlotPoint {
                    x,
                    y: self.predict_normalized(x),
                }
            })
            .collect()
    }
}

/// Identifies one response series: which subject, paradigm and measure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub subject: String,
    pub paradigm: String,
    pub measure: String,
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.subject, self.paradigm, self.measure)
    }
}

/// A paradigm/measure pair such as `der/pupil`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Condition {
    pub paradigm: String,
    pub measure: String,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.paradigm, self.measure)
    }
}

/// Raw intensity/response samples for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSeries {
    pub key: SeriesKey,
    pub intensities: Vec<f64>,
    pub responses: Vec<f64>,
}

/// Fit outcome for one series of a batch.
#[derive(Debug, Clone)]
pub struct SubjectFit {
    pub key: SeriesKey,
    pub result: Result<LogisticFit, FitError>,
}

/// One fitted series in a threshold summary file.
///
/// `x`/`y` are the normalized samples and `x_pred`/`y_pred` the normalized
/// prediction curve. Only `threshold` and `r_squared` are required when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSeries {
    pub threshold: f64,
    pub r_squared: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_raw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
    #[serde(default)]
    pub x: Vec<f64>,
    #[serde(default)]
    pub y: Vec<f64>,
    #[serde(default)]
    pub x_pred: Vec<f64>,
    #[serde(default)]
    pub y_pred: Vec<f64>,
}

/// `subject -> paradigm -> measure -> series`.
pub type ThresholdFile = BTreeMap<String, BTreeMap<String, BTreeMap<String, ThresholdSeries>>>;

/// A saved logistic fit (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub intensities: Vec<f64>,
    pub responses: Vec<f64>,
    pub fit: LogisticFit,
    pub raw_params: LogisticParams,
    pub grid: CurveGrid,
}

/// Normalized prediction grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}
