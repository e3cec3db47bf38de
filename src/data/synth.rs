//! Seeded synthetic psychometric datasets.
//!
//! Each series draws its own logistic parameters (threshold and steepness in
//! normalized intensity units, amplitude and baseline in response units) and
//! adds Gaussian noise proportional to the amplitude. Output uses the same
//! long format as the batch CSV, so it can be fed straight back into `batch`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{LogisticParams, SeriesKey, SubjectSeries};
use crate::error::AppError;

/// Intensity levels used when none are given.
pub const DEFAULT_LEVELS: [f64; 8] = [0.0, 50.0, 100.0, 150.0, 200.0, 300.0, 400.0, 500.0];

/// Paradigm/measure pairs used when none are given.
pub const DEFAULT_CONDITIONS: [(&str, &str); 3] = [("der", "pupil"), ("der", "velocity"), ("ver", "pupil")];

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub subjects: usize,
    pub seed: u64,
    /// Noise standard deviation as a fraction of each series' amplitude.
    pub noise: f64,
    pub levels: Vec<f64>,
    pub conditions: Vec<(String, String)>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            subjects: 8,
            seed: 42,
            noise: 0.03,
            levels: DEFAULT_LEVELS.to_vec(),
            conditions: DEFAULT_CONDITIONS
                .iter()
                .map(|(p, m)| (p.to_string(), m.to_string()))
                .collect(),
        }
    }
}

/// A generated series together with the parameters that produced it.
///
/// `truth.x0` and `truth.k` are in normalized intensity units (`I / max(I)`);
/// `amplitude` and `baseline` are in raw response units.
#[derive(Debug, Clone)]
pub struct SynthSeries {
    pub series: SubjectSeries,
    pub truth: LogisticParams,
}

pub fn generate_batch(config: &SynthConfig) -> Result<Vec<SynthSeries>, AppError> {
    if config.subjects == 0 {
        return Err(AppError::new(2, "Subject count must be > 0."));
    }
    if config.levels.len() < 4 {
        return Err(AppError::new(2, "At least 4 intensity levels are required."));
    }
    let level_max = config.levels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(level_max.is_finite() && level_max > 0.0) || config.levels.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(2, "Intensity levels must be finite with a positive maximum."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Noise level must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut out = Vec::with_capacity(config.subjects * config.conditions.len());

    for s in 0..config.subjects {
        let subject = format!("S{:02}", s + 1);
        for (paradigm, measure) in &config.conditions {
            let truth = LogisticParams {
                x0: rng.gen_range(0.3..0.7),
                k: rng.gen_range(6.0..14.0),
                amplitude: rng.gen_range(10.0..50.0),
                baseline: rng.gen_range(0.0..2.0),
            };
            let normal = Normal::new(0.0, config.noise * truth.amplitude)
                .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

            let responses = config
                .levels
                .iter()
                .map(|&level| truth.evaluate(level / level_max) + normal.sample(&mut rng))
                .collect();

            out.push(SynthSeries {
                series: SubjectSeries {
                    key: SeriesKey {
                        subject: subject.clone(),
                        paradigm: paradigm.clone(),
                        measure: measure.clone(),
                    },
                    intensities: config.levels.clone(),
                    responses,
                },
                truth,
            });
        }
    }

    log::debug!("generated {} synthetic series (seed={})", out.len(), config.seed);
    Ok(out)
}

/// Write series in the long batch format.
pub fn write_batch_csv(path: &Path, series: &[SynthSeries]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
    write_batch(file, series)
}

pub fn write_batch<W: Write>(out: W, series: &[SynthSeries]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(["subject", "paradigm", "measure", "intensity", "response"])
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;
    for s in series {
        let key = &s.series.key;
        for (i, r) in s.series.intensities.iter().zip(s.series.responses.iter()) {
            writer
                .write_record([
                    key.subject.as_str(),
                    key.paradigm.as_str(),
                    key.measure.as_str(),
                    i.to_string().as_str(),
                    format!("{r:.6}").as_str(),
                ])
                .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
        }
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogisticOptions;
    use crate::fit::fit_logistic_batch;
    use crate::io::{BatchColumns, read_batch_csv};

    #[test]
    fn same_seed_same_data() {
        let config = SynthConfig::default();
        let a = generate_batch(&config).unwrap();
        let b = generate_batch(&config).unwrap();
        assert_eq!(a.len(), 8 * 3);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.series, y.series);
        }
    }

    #[test]
    fn noiseless_series_follow_truth() {
        let config = SynthConfig {
            noise: 0.0,
            subjects: 2,
            ..SynthConfig::default()
        };
        for s in generate_batch(&config).unwrap() {
            let last = *s.series.responses.last().unwrap();
            assert!((last - s.truth.evaluate(1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn generated_batch_round_trips_through_csv_and_fits() {
        let config = SynthConfig {
            subjects: 3,
            noise: 0.02,
            ..SynthConfig::default()
        };
        let generated = generate_batch(&config).unwrap();

        let mut buf = Vec::new();
        write_batch(&mut buf, &generated).unwrap();
        let batch = read_batch_csv(buf.as_slice(), &BatchColumns::default()).unwrap();
        assert!(batch.row_errors.is_empty());
        assert_eq!(batch.series.len(), generated.len());

        let fits = fit_logistic_batch(&batch.series, &LogisticOptions::default());
        for fit in &fits {
            let f = fit.result.as_ref().unwrap();
            assert!(f.r_squared > 0.9, "{}: r2={}", fit.key, f.r_squared);
        }
    }

    #[test]
    fn condition_names_with_commas_survive_csv() {
        let config = SynthConfig {
            subjects: 1,
            conditions: vec![("der, short".to_string(), "pupil \"raw\"".to_string())],
            ..SynthConfig::default()
        };
        let generated = generate_batch(&config).unwrap();

        let mut buf = Vec::new();
        write_batch(&mut buf, &generated).unwrap();
        let batch = read_batch_csv(buf.as_slice(), &BatchColumns::default()).unwrap();
        assert!(batch.row_errors.is_empty());
        assert_eq!(batch.series.len(), 1);
        assert_eq!(batch.series[0].key.paradigm, "der, short");
        assert_eq!(batch.series[0].key.measure, "pupil \"raw\"");
        assert_eq!(batch.series[0].intensities, DEFAULT_LEVELS.to_vec());
    }

    #[test]
    fn rejects_bad_config() {
        let config = SynthConfig {
            subjects: 0,
            ..SynthConfig::default()
        };
        assert!(generate_batch(&config).is_err());
    }
}
