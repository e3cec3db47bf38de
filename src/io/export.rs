//! Export batch fit results.
//!
//! - a flat CSV (one row per series, written with `csv::Writer`) for spreadsheets
//! - a threshold summary JSON in the same schema `thresholds` reads back
//! - a scatter regression JSON (`linear --export`)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{LinearFit, PREDICTION_GRID_POINTS, SubjectFit, SubjectSeries, ThresholdFile, ThresholdSeries};
use crate::error::AppError;

/// Write one CSV row per series. Failed fits keep their row with an `error`.
pub fn write_results_csv(path: &Path, fits: &[SubjectFit]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, fits)
}

pub fn write_results<W: Write>(out: W, fits: &[SubjectFit]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record([
            "subject",
            "paradigm",
            "measure",
            "x0",
            "k",
            "L",
            "b",
            "r_squared",
            "threshold_raw",
            "converged",
            "iterations",
            "error",
        ])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for fit in fits {
        let key = &fit.key;
        let mut row = vec![key.subject.clone(), key.paradigm.clone(), key.measure.clone()];
        match &fit.result {
            Ok(f) => {
                row.extend(
                    [
                        f.params.x0,
                        f.params.k,
                        f.params.amplitude,
                        f.params.baseline,
                        f.r_squared,
                        f.threshold_raw,
                    ]
                    .iter()
                    .map(|v| format!("{v:.10}")),
                );
                row.extend([f.converged.to_string(), f.iterations.to_string(), String::new()]);
            }
            Err(e) => {
                row.extend(std::iter::repeat_n(String::new(), 8));
                row.push(e.to_string());
            }
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))
}

/// Build a threshold summary from successful fits.
///
/// `series` supplies the raw samples; they are stored normalized next to the
/// normalized prediction curve.
pub fn threshold_summary(series: &[SubjectSeries], fits: &[SubjectFit]) -> ThresholdFile {
    let mut out = ThresholdFile::new();
    for (s, fit) in series.iter().zip(fits.iter()) {
        let Ok(f) = &fit.result else { continue };
        let norm = &f.normalization;
        let grid = f.prediction_grid(PREDICTION_GRID_POINTS);
        let entry = ThresholdSeries {
            threshold: f.params.x0,
            r_squared: f.r_squared,
            threshold_raw: Some(f.threshold_raw),
            converged: Some(f.converged),
            x: s.intensities.iter().map(|&i| norm.normalize_x(i)).collect(),
            y: s.responses.iter().map(|&r| norm.normalize_y(r)).collect(),
            x_pred: grid.iter().map(|p| p.x).collect(),
            y_pred: grid.iter().map(|p| p.y).collect(),
        };
        out.entry(fit.key.subject.clone())
            .or_default()
            .entry(fit.key.paradigm.clone())
            .or_default()
            .insert(fit.key.measure.clone(), entry);
    }
    out
}

pub fn write_threshold_json(path: &Path, summary: &ThresholdFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create threshold JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::new(2, format!("Failed to write threshold JSON: {e}")))
}

/// Write an OLS scatter fit together with the columns it was computed from.
pub fn write_linear_json(
    path: &Path,
    fit: &LinearFit,
    x_column: &str,
    y_column: &str,
    normalized: bool,
    n: usize,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create regression JSON '{}': {e}", path.display())))?;
    let doc = serde_json::json!({
        "tool": env!("CARGO_PKG_NAME"),
        "x_column": x_column,
        "y_column": y_column,
        "normalized": normalized,
        "n": n,
        "fit": fit,
    });
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write regression JSON: {e}")))
}
