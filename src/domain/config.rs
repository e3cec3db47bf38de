//! Per-command run configurations.
//!
//! These are built from CLI arguments by `app::*_from_args` and consumed by
//! `app::pipeline`. No config files, no global defaults beyond `Default` impls.

use std::path::PathBuf;

use crate::data::SynthConfig;
use crate::domain::LogisticOptions;
use crate::io::BatchColumns;

/// Where a single logistic fit reads its samples from.
#[derive(Debug, Clone, PartialEq)]
pub enum LogisticInput {
    /// Samples given directly (number lists or the built-in dataset).
    Inline {
        intensities: Vec<f64>,
        responses: Vec<f64>,
    },
    /// Two columns of a CSV, located by case-insensitive pattern.
    Csv {
        path: PathBuf,
        intensity_column: String,
        response_column: String,
    },
}

#[derive(Debug, Clone)]
pub struct LogisticRunConfig {
    pub input: LogisticInput,
    pub options: LogisticOptions,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LinearRunConfig {
    pub csv: PathBuf,
    pub x_column: String,
    pub y_column: String,
    /// Min-max normalize both columns before fitting.
    pub normalize: bool,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BatchRunConfig {
    pub csv: PathBuf,
    pub columns: BatchColumns,
    pub options: LogisticOptions,
    pub export: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SimulateRunConfig {
    pub synth: SynthConfig,
    /// Output CSV; stdout when absent.
    pub out: Option<PathBuf>,
}
