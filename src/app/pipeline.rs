//! Shared fit pipelines used by the CLI handlers and integration tests.
//!
//! Each pipeline goes input -> validation -> fit and returns every
//! intermediate the front-end may want to print, plot or export. Nothing here
//! prints.

use crate::data::{SynthSeries, generate_batch};
use crate::domain::{
    BatchRunConfig, LinearFit, LinearRunConfig, LogisticFit, LogisticInput, LogisticRunConfig, SimulateRunConfig,
    SubjectFit, ThresholdFile,
};
use crate::error::AppError;
use crate::fit::{NormalizedSeries, fit_logistic, fit_logistic_batch, normalize_series};
use crate::io::{BatchIngest, RowError, load_batch_csv, load_threshold_json, load_xy_csv, threshold_summary};
use crate::math::{fit_linear, min_max_normalize};
use crate::report::{ThresholdReport, summarize_thresholds};

/// Outputs of one `psyfit logistic` run.
#[derive(Debug, Clone)]
pub struct LogisticRun {
    pub intensities: Vec<f64>,
    pub responses: Vec<f64>,
    pub series: NormalizedSeries,
    pub fit: LogisticFit,
    pub row_errors: Vec<RowError>,
}

pub fn run_logistic(config: &LogisticRunConfig) -> Result<LogisticRun, AppError> {
    let (intensities, responses, row_errors) = match &config.input {
        LogisticInput::Inline {
            intensities,
            responses,
        } => (intensities.clone(), responses.clone(), Vec::new()),
        LogisticInput::Csv {
            path,
            intensity_column,
            response_column,
        } => {
            let data = load_xy_csv(path, intensity_column, response_column)?;
            (data.xs, data.ys, data.row_errors)
        }
    };

    let fit = fit_logistic(&intensities, &responses, &config.options)?;
    let series = normalize_series(&intensities, &responses)?;

    Ok(LogisticRun {
        intensities,
        responses,
        series,
        fit,
        row_errors,
    })
}

/// Outputs of one `psyfit linear` run.
#[derive(Debug, Clone)]
pub struct LinearRun {
    pub x_column: String,
    pub y_column: String,
    /// Samples as fitted (normalized when requested).
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub fit: LinearFit,
    pub row_errors: Vec<RowError>,
}

pub fn run_linear(config: &LinearRunConfig) -> Result<LinearRun, AppError> {
    let data = load_xy_csv(&config.csv, &config.x_column, &config.y_column)?;
    let (xs, ys) = if config.normalize {
        (min_max_normalize(&data.xs)?, min_max_normalize(&data.ys)?)
    } else {
        (data.xs, data.ys)
    };

    let fit = fit_linear(&xs, &ys)?;
    log::debug!(
        "{} ~ {}: slope={:.6} intercept={:.6} (n={})",
        data.y_column,
        data.x_column,
        fit.slope,
        fit.intercept,
        xs.len()
    );

    Ok(LinearRun {
        x_column: data.x_column,
        y_column: data.y_column,
        xs,
        ys,
        fit,
        row_errors: data.row_errors,
    })
}

/// Outputs of one `psyfit batch` run.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub ingest: BatchIngest,
    pub fits: Vec<SubjectFit>,
    pub summary: ThresholdFile,
}

pub fn run_batch(config: &BatchRunConfig) -> Result<BatchRun, AppError> {
    config.options.validate()?;
    let ingest = load_batch_csv(&config.csv, &config.columns)?;
    if ingest.series.is_empty() {
        return Err(AppError::new(
            2,
            format!("No usable rows in '{}'.", config.csv.display()),
        ));
    }

    let fits = fit_logistic_batch(&ingest.series, &config.options);
    let summary = threshold_summary(&ingest.series, &fits);

    Ok(BatchRun {
        ingest,
        fits,
        summary,
    })
}

/// Read a threshold summary file and compute its report.
pub fn run_thresholds(path: &std::path::Path) -> Result<(ThresholdFile, ThresholdReport), AppError> {
    let file = load_threshold_json(path)?;
    if file.is_empty() {
        return Err(AppError::new(
            2,
            format!("Threshold JSON '{}' has no subjects.", path.display()),
        ));
    }
    let report = summarize_thresholds(&file);
    Ok((file, report))
}

pub fn run_simulate(config: &SimulateRunConfig) -> Result<Vec<SynthSeries>, AppError> {
    generate_batch(&config.synth)
}
