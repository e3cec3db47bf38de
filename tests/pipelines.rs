mod common;

use std::fs;

use common::temp_path;
use psyfit::app::pipeline::{run_batch, run_linear, run_logistic, run_simulate, run_thresholds};
use psyfit::data::{SynthConfig, write_batch_csv};
use psyfit::domain::{
    BatchRunConfig, LinearRunConfig, LogisticInput, LogisticOptions, LogisticRunConfig, SimulateRunConfig,
};
use psyfit::io::{BatchColumns, build_curve_file, read_curve_json, write_curve_json, write_threshold_json};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn simulated_batch_fits_and_summarizes() {
    init_logging();
    let csv = temp_path("batch.csv");
    let json = temp_path("thresholds.json");

    let simulated = run_simulate(&SimulateRunConfig {
        synth: SynthConfig {
            subjects: 4,
            ..SynthConfig::default()
        },
        out: Some(csv.clone()),
    })
    .unwrap();
    write_batch_csv(&csv, &simulated).unwrap();

    let run = run_batch(&BatchRunConfig {
        csv: csv.clone(),
        columns: BatchColumns::default(),
        options: LogisticOptions::default(),
        export: None,
        export_json: None,
    })
    .unwrap();

    assert_eq!(run.ingest.series.len(), 4 * 3);
    assert!(run.ingest.row_errors.is_empty());
    for fit in &run.fits {
        let f = fit.result.as_ref().unwrap();
        assert!(f.r_squared > 0.9, "{}: r2={}", fit.key, f.r_squared);
    }
    assert_eq!(run.summary.len(), 4);

    write_threshold_json(&json, &run.summary).unwrap();
    let (file, report) = run_thresholds(&json).unwrap();
    let _ = fs::remove_file(&csv);
    let _ = fs::remove_file(&json);

    assert_eq!(file.keys().collect::<Vec<_>>(), run.summary.keys().collect::<Vec<_>>());
    let (a, b) = (&file["S01"]["der"]["pupil"], &run.summary["S01"]["der"]["pupil"]);
    assert!((a.threshold - b.threshold).abs() < 1e-12);
    assert_eq!(a.x_pred.len(), b.x_pred.len());
    assert_eq!(report.subjects, 4);
    assert_eq!(report.conditions.len(), 3);
    assert!(report.conditions.iter().all(|c| c.n == 4));
    assert_eq!(report.correlations.len(), 3);
}

#[test]
fn logistic_curve_export_round_trips() {
    init_logging();
    let path = temp_path("curve.json");
    let run = run_logistic(&LogisticRunConfig {
        input: LogisticInput::Inline {
            intensities: vec![0.0, 50.0, 150.0, 300.0, 500.0],
            responses: vec![0.6, 0.7, 5.2, 21.5, 41.4],
        },
        options: LogisticOptions::default(),
        plot: false,
        plot_width: 80,
        plot_height: 20,
        export_curve: Some(path.clone()),
    })
    .unwrap();

    let curve = build_curve_file(&run.intensities, &run.responses, &run.fit);
    write_curve_json(&path, &curve).unwrap();
    let back = read_curve_json(&path).unwrap();
    let _ = fs::remove_file(&path);

    assert!((back.fit.params.x0 - run.fit.params.x0).abs() < 1e-12);
    assert!((back.fit.threshold_raw - run.fit.params.x0 * 500.0).abs() < 1e-9);
    assert_eq!(back.grid.x.len(), 200);
}

#[test]
fn logistic_reads_csv_columns_by_pattern() {
    init_logging();
    let path = temp_path("logistic.csv");
    fs::write(
        &path,
        "Intensity_mA,Pupil Response\n0,0.6\n50,0.7\n150,5.2\n300,21.5\nbad,1\n500,41.4\n",
    )
    .unwrap();

    let run = run_logistic(&LogisticRunConfig {
        input: LogisticInput::Csv {
            path: path.clone(),
            intensity_column: "intensity".to_string(),
            response_column: "response".to_string(),
        },
        options: LogisticOptions::default(),
        plot: false,
        plot_width: 80,
        plot_height: 20,
        export_curve: None,
    })
    .unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(run.intensities, vec![0.0, 50.0, 150.0, 300.0, 500.0]);
    assert_eq!(run.row_errors.len(), 1);
    assert_eq!(run.row_errors[0].line, 6);
    assert!(run.fit.converged);
}

#[test]
fn dyad_scatter_with_and_without_normalization() {
    init_logging();
    let path = temp_path("dyads.csv");
    fs::write(&path, "pair,Demonstrator_Score,observer score\na,1,2\nb,2,4\nc,3,6\n").unwrap();

    let mut config = LinearRunConfig {
        csv: path.clone(),
        x_column: "demonstrator".to_string(),
        y_column: "observer".to_string(),
        normalize: false,
        plot: false,
        plot_width: 80,
        plot_height: 20,
        export: None,
    };
    let raw = run_linear(&config).unwrap();
    config.normalize = true;
    let normalized = run_linear(&config).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(raw.x_column, "Demonstrator_Score");
    assert!((raw.fit.slope - 2.0).abs() < 1e-12);
    assert_eq!(normalized.xs, vec![0.0, 0.5, 1.0]);
    assert!((normalized.fit.slope - 1.0).abs() < 1e-12);
    assert!(normalized.fit.intercept.abs() < 1e-12);
}
