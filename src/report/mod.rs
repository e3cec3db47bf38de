//! Reporting utilities: threshold summaries and formatted terminal output.

pub mod format;

pub use format::*;

use std::collections::BTreeMap;

use crate::domain::{Condition, LinearFit, ThresholdFile};
use crate::error::FitError;
use crate::math::{fit_linear, mean};

/// Mean threshold of one condition across subjects.
#[derive(Debug, Clone)]
pub struct ConditionSummary {
    pub condition: Condition,
    pub n: usize,
    pub mean_threshold: f64,
    pub mean_r_squared: f64,
}

/// OLS of one condition's thresholds against another's, over shared subjects.
#[derive(Debug, Clone)]
pub struct ThresholdCorrelation {
    pub x: Condition,
    pub y: Condition,
    pub n: usize,
    pub fit: Result<LinearFit, FitError>,
}

#[derive(Debug, Clone)]
pub struct ThresholdReport {
    pub subjects: usize,
    pub conditions: Vec<ConditionSummary>,
    pub correlations: Vec<ThresholdCorrelation>,
}

/// Per-condition means and pairwise threshold regressions.
///
/// Conditions are ordered by `paradigm/measure`; every unordered pair is
/// regressed once, first condition on x.
pub fn summarize_thresholds(file: &ThresholdFile) -> ThresholdReport {
    // condition -> subject -> (threshold, r²)
    let mut by_condition: BTreeMap<Condition, BTreeMap<&str, (f64, f64)>> = BTreeMap::new();
    for (subject, paradigms) in file {
        for (paradigm, measures) in paradigms {
            for (measure, series) in measures {
                let condition = Condition {
                    paradigm: paradigm.clone(),
                    measure: measure.clone(),
                };
                by_condition
                    .entry(condition)
                    .or_default()
                    .insert(subject.as_str(), (series.threshold, series.r_squared));
            }
        }
    }

    let conditions = by_condition
        .iter()
        .map(|(condition, subjects)| {
            let thresholds: Vec<f64> = subjects.values().map(|v| v.0).collect();
            let r_squared: Vec<f64> = subjects.values().map(|v| v.1).collect();
            ConditionSummary {
                condition: condition.clone(),
                n: thresholds.len(),
                mean_threshold: mean(&thresholds),
                mean_r_squared: mean(&r_squared),
            }
        })
        .collect();

    let keys: Vec<&Condition> = by_condition.keys().collect();
    let mut correlations = Vec::new();
    for (i, x_cond) in keys.iter().enumerate() {
        for y_cond in &keys[i + 1..] {
            let x_map = &by_condition[*x_cond];
            let y_map = &by_condition[*y_cond];
            let (xs, ys): (Vec<f64>, Vec<f64>) = x_map
                .iter()
                .filter_map(|(subject, x)| y_map.get(subject).map(|y| (x.0, y.0)))
                .unzip();
            correlations.push(ThresholdCorrelation {
                x: (*x_cond).clone(),
                y: (*y_cond).clone(),
                n: xs.len(),
                fit: fit_linear(&xs, &ys),
            });
        }
    }

    ThresholdReport {
        subjects: file.len(),
        conditions,
        correlations,
    }
}
