//! Read/write curve JSON files.
//!
//! Curve JSON is the portable representation of one logistic fit:
//! - the raw input samples
//! - the fit (normalized parameters, R², convergence, normalization record)
//! - parameters converted back to raw units
//! - a precomputed normalized prediction grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, CurveGrid, LogisticFit, PREDICTION_GRID_POINTS};
use crate::error::AppError;

/// Assemble the curve file for a fit.
pub fn build_curve_file(intensities: &[f64], responses: &[f64], fit: &LogisticFit) -> CurveFile {
    let grid = fit.prediction_grid(PREDICTION_GRID_POINTS);
    CurveFile {
        tool: env!("CARGO_PKG_NAME").to_string(),
        intensities: intensities.to_vec(),
        responses: responses.to_vec(),
        fit: *fit,
        raw_params: fit.raw_params(),
        grid: CurveGrid {
            x: grid.iter().map(|p| p.x).collect(),
            y: grid.iter().map(|p| p.y).collect(),
        },
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}
