//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds run configs
//! - runs the fit pipelines
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{BatchArgs, Command, LinearArgs, LogisticArgs, PlotArgs, SimulateArgs, SolverArgs, ThresholdsArgs};
use crate::data::SynthConfig;
use crate::domain::{
    BatchRunConfig, BoundsPolicy, LinearRunConfig, LogisticInput, LogisticOptions, LogisticParams,
    LogisticRunConfig, ParameterBounds, SimulateRunConfig,
};
use crate::error::AppError;
use crate::fit::{DEFAULT_INTENSITIES, DEFAULT_RESPONSES};
use crate::io::{BatchColumns, RowError, parse_number_list};
use crate::models::logistic::PARAM_COUNT;

pub mod pipeline;

/// Entry point for the `psyfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Logistic(args) => handle_logistic(args),
        Command::Linear(args) => handle_linear(args),
        Command::Batch(args) => handle_batch(args),
        Command::Thresholds(args) => handle_thresholds(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_logistic(args: LogisticArgs) -> Result<(), AppError> {
    let config = logistic_config_from_args(&args)?;
    let run = pipeline::run_logistic(&config)?;

    print_row_errors(&run.row_errors);
    println!("{}", crate::report::format_logistic_summary(&run.fit));

    if config.plot {
        let plot = crate::plot::render_logistic_plot(
            &run.series.x,
            &run.series.y,
            &run.fit,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_curve {
        let curve = crate::io::build_curve_file(&run.intensities, &run.responses, &run.fit);
        crate::io::write_curve_json(path, &curve)?;
        log::info!("wrote curve JSON to {}", path.display());
    }

    Ok(())
}

fn handle_linear(args: LinearArgs) -> Result<(), AppError> {
    let config = linear_config_from_args(&args);
    let run = pipeline::run_linear(&config)?;

    print_row_errors(&run.row_errors);
    println!(
        "{}",
        crate::report::format_linear_summary(&run.fit, &run.x_column, &run.y_column, run.xs.len())
    );

    if config.plot {
        let plot =
            crate::plot::render_scatter_plot(&run.xs, &run.ys, &run.fit, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    if let Some(path) = &config.export {
        crate::io::write_linear_json(
            path,
            &run.fit,
            &run.x_column,
            &run.y_column,
            config.normalize,
            run.xs.len(),
        )?;
        log::info!("wrote regression JSON to {}", path.display());
    }

    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = batch_config_from_args(&args)?;
    let run = pipeline::run_batch(&config)?;

    print_row_errors(&run.ingest.row_errors);
    println!(
        "Read {} rows into {} series from {}\n",
        run.ingest.rows_read,
        run.ingest.series.len(),
        config.csv.display()
    );
    println!("{}", crate::report::format_batch_table(&run.fits));

    if let Some(path) = &config.export {
        crate::io::write_results_csv(path, &run.fits)?;
        log::info!("wrote batch results to {}", path.display());
    }
    if let Some(path) = &config.export_json {
        crate::io::write_threshold_json(path, &run.summary)?;
        log::info!("wrote threshold summary to {}", path.display());
    }

    Ok(())
}

fn handle_thresholds(args: ThresholdsArgs) -> Result<(), AppError> {
    let (_, report) = pipeline::run_thresholds(&args.json)?;
    println!("{}", crate::report::format_threshold_report(&report));
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = simulate_config_from_args(&args);
    let series = pipeline::run_simulate(&config)?;

    match &config.out {
        Some(path) => {
            crate::data::write_batch_csv(path, &series)?;
            println!("Wrote {} series to {}", series.len(), path.display());
        }
        None => crate::data::write_batch(std::io::stdout().lock(), &series)?,
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_curve_file_plot(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn print_row_errors(errors: &[RowError]) {
    if errors.is_empty() {
        return;
    }
    eprintln!("Skipped {} row(s):", errors.len());
    for err in errors.iter().take(10) {
        eprintln!("  line {}: {}", err.line, err.message);
    }
    if errors.len() > 10 {
        eprintln!("  ... and {} more", errors.len() - 10);
    }
}

pub fn logistic_config_from_args(args: &LogisticArgs) -> Result<LogisticRunConfig, AppError> {
    let input = match (&args.csv, &args.intensities, &args.responses) {
        (Some(path), _, _) => LogisticInput::Csv {
            path: path.clone(),
            intensity_column: args.intensity_column.clone(),
            response_column: args.response_column.clone(),
        },
        (None, Some(intensities), Some(responses)) => LogisticInput::Inline {
            intensities: parse_number_list(intensities)?,
            responses: parse_number_list(responses)?,
        },
        _ => LogisticInput::Inline {
            intensities: DEFAULT_INTENSITIES.to_vec(),
            responses: DEFAULT_RESPONSES.to_vec(),
        },
    };

    Ok(LogisticRunConfig {
        input,
        options: options_from_args(&args.solver)?,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_curve: args.export_curve.clone(),
    })
}

pub fn linear_config_from_args(args: &LinearArgs) -> LinearRunConfig {
    LinearRunConfig {
        csv: args.csv.clone(),
        x_column: args.x_column.clone(),
        y_column: args.y_column.clone(),
        normalize: args.normalize,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export: args.export.clone(),
    }
}

pub fn batch_config_from_args(args: &BatchArgs) -> Result<BatchRunConfig, AppError> {
    Ok(BatchRunConfig {
        csv: args.csv.clone(),
        columns: BatchColumns {
            subject: args.subject_column.clone(),
            paradigm: args.paradigm_column.clone(),
            measure: args.measure_column.clone(),
            intensity: args.intensity_column.clone(),
            response: args.response_column.clone(),
        },
        options: options_from_args(&args.solver)?,
        export: args.export.clone(),
        export_json: args.export_json.clone(),
    })
}

pub fn simulate_config_from_args(args: &SimulateArgs) -> SimulateRunConfig {
    SimulateRunConfig {
        synth: SynthConfig {
            subjects: args.subjects,
            seed: args.seed,
            noise: args.noise,
            ..SynthConfig::default()
        },
        out: args.out.clone(),
    }
}

/// Solver flags -> validated [`LogisticOptions`].
pub fn options_from_args(args: &SolverArgs) -> Result<LogisticOptions, AppError> {
    let bounds = match (&args.lower, &args.upper) {
        (Some(lower), Some(upper)) => BoundsPolicy::Explicit(ParameterBounds {
            lower: parse_params(lower)?,
            upper: parse_params(upper)?,
        }),
        _ => BoundsPolicy::InputRange,
    };

    let options = LogisticOptions {
        damping: args.damping,
        max_iterations: args.max_iterations,
        gradient_difference: args.gradient_difference,
        central_difference: args.central_difference,
        error_tolerance: args.error_tolerance,
        step_tolerance: args.step_tolerance,
        bounds,
    };
    options.validate()?;
    Ok(options)
}

fn parse_params(text: &str) -> Result<LogisticParams, AppError> {
    let values = parse_number_list(text)?;
    if values.len() != PARAM_COUNT {
        return Err(AppError::new(
            3,
            format!("Expected {PARAM_COUNT} bound values (x0,k,L,b), got {}.", values.len()),
        ));
    }
    Ok(LogisticParams::from_slice(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn parse(argv: &[&str]) -> Command {
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn logistic_defaults_to_demo_dataset() {
        let Command::Logistic(args) = parse(&["psyfit", "logistic"]) else {
            panic!("expected logistic");
        };
        let config = logistic_config_from_args(&args).unwrap();
        assert_eq!(
            config.input,
            LogisticInput::Inline {
                intensities: DEFAULT_INTENSITIES.to_vec(),
                responses: DEFAULT_RESPONSES.to_vec(),
            }
        );
        assert!(config.plot);
        assert_eq!(config.options, LogisticOptions::default());
    }

    #[test]
    fn logistic_rejects_bad_number_list() {
        let Command::Logistic(args) = parse(&["psyfit", "logistic", "--intensities", "1 2 x", "--responses", "1 2 3"])
        else {
            panic!("expected logistic");
        };
        assert_eq!(logistic_config_from_args(&args).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn explicit_bounds_are_parsed() {
        let Command::Batch(args) = parse(&[
            "psyfit",
            "batch",
            "--csv",
            "in.csv",
            "--lower",
            "0,0,0,-5",
            "--upper",
            "1,500,10,5",
        ]) else {
            panic!("expected batch");
        };
        let config = batch_config_from_args(&args).unwrap();
        let BoundsPolicy::Explicit(bounds) = config.options.bounds else {
            panic!("expected explicit bounds");
        };
        assert_eq!(bounds.lower.baseline, -5.0);
        assert_eq!(bounds.upper.k, 500.0);
    }

    #[test]
    fn wrong_bound_arity_is_rejected() {
        let Command::Batch(args) = parse(&["psyfit", "batch", "--csv", "in.csv", "--lower", "0,0", "--upper", "1,1"])
        else {
            panic!("expected batch");
        };
        assert!(batch_config_from_args(&args).is_err());
    }

    #[test]
    fn every_solver_option_has_a_flag() {
        let Command::Logistic(args) = parse(&[
            "psyfit",
            "logistic",
            "--damping",
            "2.5",
            "--max-iterations",
            "50",
            "--gradient-difference",
            "1e-3",
            "--central-difference",
            "--error-tolerance",
            "1e-8",
            "--step-tolerance",
            "1e-6",
        ]) else {
            panic!("expected logistic");
        };
        let options = logistic_config_from_args(&args).unwrap().options;
        assert_eq!(
            options,
            LogisticOptions {
                damping: 2.5,
                max_iterations: 50,
                gradient_difference: 1e-3,
                central_difference: true,
                error_tolerance: 1e-8,
                step_tolerance: 1e-6,
                bounds: BoundsPolicy::InputRange,
            }
        );
    }

    #[test]
    fn negative_step_tolerance_is_rejected() {
        let Command::Logistic(args) = parse(&["psyfit", "logistic", "--step-tolerance=-1"]) else {
            panic!("expected logistic");
        };
        assert_eq!(logistic_config_from_args(&args).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn no_plot_wins() {
        let Command::Logistic(args) = parse(&["psyfit", "logistic", "--no-plot"]) else {
            panic!("expected logistic");
        };
        assert!(!logistic_config_from_args(&args).unwrap().plot);
    }
}
