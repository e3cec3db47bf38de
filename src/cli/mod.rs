//! Command-line parsing for the psychometric curve fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code. Args are converted into run configs by `app::*_from_args`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "psyfit", version, about = "Psychometric threshold and dyad regression fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a 4-parameter logistic to one intensity/response series.
    ///
    /// Without input the built-in demo dataset is used.
    Logistic(LogisticArgs),
    /// Ordinary least squares over a demonstrator/observer scatter CSV.
    Linear(LinearArgs),
    /// Fit every (subject, paradigm, measure) series of a long-format CSV.
    Batch(BatchArgs),
    /// Summarize a threshold JSON: condition means and pairwise regressions.
    Thresholds(ThresholdsArgs),
    /// Generate a seeded synthetic batch CSV.
    Simulate(SimulateArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
}

/// Levenberg–Marquardt options shared by `logistic` and `batch`.
#[derive(Debug, Args, Clone)]
pub struct SolverArgs {
    /// Initial damping factor.
    #[arg(long, default_value_t = 1.5)]
    pub damping: f64,

    /// Iteration cap; hitting it is reported as "not converged".
    #[arg(long, default_value_t = 1000)]
    pub max_iterations: usize,

    /// Finite-difference step for the Jacobian.
    #[arg(long, default_value_t = 1e-2)]
    pub gradient_difference: f64,

    /// Use central instead of forward differences.
    #[arg(long)]
    pub central_difference: bool,

    /// Stop once the sum of squared residuals falls to this level.
    #[arg(long, default_value_t = 1e-10)]
    pub error_tolerance: f64,

    /// Stop once a step moves no parameter further than this (relative).
    #[arg(long, default_value_t = 1e-10)]
    pub step_tolerance: f64,

    /// Lower parameter bounds `x0,k,L,b` in normalized units (requires --upper).
    #[arg(long, value_name = "X0,K,L,B", requires = "upper", allow_hyphen_values = true)]
    pub lower: Option<String>,

    /// Upper parameter bounds `x0,k,L,b` in normalized units (requires --lower).
    #[arg(long, value_name = "X0,K,L,B", requires = "lower", allow_hyphen_values = true)]
    pub upper: Option<String>,
}

#[derive(Debug, Parser, Clone)]
pub struct LogisticArgs {
    /// Stimulus intensities, separated by spaces, commas or semicolons.
    #[arg(long, requires = "responses", conflicts_with = "csv", allow_hyphen_values = true)]
    pub intensities: Option<String>,

    /// Responses, one per intensity.
    #[arg(long, requires = "intensities", allow_hyphen_values = true)]
    pub responses: Option<String>,

    /// Read intensity/response columns from a CSV instead.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Intensity column pattern (case-insensitive regex).
    #[arg(long, default_value = "intensity")]
    pub intensity_column: String,

    /// Response column pattern (case-insensitive regex).
    #[arg(long, default_value = "response")]
    pub response_column: String,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the fit and its prediction grid to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct LinearArgs {
    /// Scatter CSV.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Column pattern for x (case-insensitive regex).
    #[arg(long, default_value = "demonstrator")]
    pub x_column: String,

    /// Column pattern for y (case-insensitive regex).
    #[arg(long, default_value = "observer")]
    pub y_column: String,

    /// Min-max normalize both columns before fitting.
    #[arg(long)]
    pub normalize: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the regression to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct BatchArgs {
    /// Long-format CSV: subject, paradigm, measure, intensity, response.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    #[arg(long, default_value = "subject")]
    pub subject_column: String,

    #[arg(long, default_value = "paradigm")]
    pub paradigm_column: String,

    #[arg(long, default_value = "measure")]
    pub measure_column: String,

    #[arg(long, default_value = "intensity")]
    pub intensity_column: String,

    #[arg(long, default_value = "response")]
    pub response_column: String,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Export per-series results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the threshold summary JSON (readable by `thresholds`).
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ThresholdsArgs {
    /// Threshold summary JSON (`subject -> paradigm -> measure -> series`).
    #[arg(long, value_name = "JSON")]
    pub json: PathBuf,
}

#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Number of subjects.
    #[arg(long, default_value_t = 8)]
    pub subjects: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Noise standard deviation as a fraction of each series' amplitude.
    #[arg(long, default_value_t = 0.03)]
    pub noise: f64,

    /// Output CSV (stdout when omitted).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `psyfit logistic --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_logistic_lists() {
        let cli = Cli::try_parse_from([
            "psyfit",
            "logistic",
            "--intensities",
            "0,50,150,300,500",
            "--responses",
            "0.6 0.7 5.2 21.5 41.4",
            "--no-plot",
        ])
        .unwrap();
        let Command::Logistic(args) = cli.command else {
            panic!("expected logistic");
        };
        assert_eq!(args.intensities.as_deref(), Some("0,50,150,300,500"));
        assert!(args.no_plot);
        assert_eq!(args.solver.max_iterations, 1000);
    }

    #[test]
    fn bounds_must_come_in_pairs() {
        let res = Cli::try_parse_from(["psyfit", "batch", "--csv", "x.csv", "--lower", "0,0,0,0"]);
        assert!(res.is_err());
    }
}
