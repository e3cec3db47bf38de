//! Input parsing and normalization.
//!
//! This module turns the various on-disk inputs into plain `f64` series that are
//! safe to hand to the fitters:
//!
//! - free-form number lists (`"0 50, 150; 300"`)
//! - two-column scatter CSVs whose columns are located by pattern
//! - long-format batch CSVs (`subject, paradigm, measure, intensity, response`)
//! - threshold summary JSON
//!
//! Row-level problems are collected (with CSV line numbers) and the row is
//! skipped; missing columns or unreadable files are hard errors (exit code 2).
//! No fitting logic lives here.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use regex::RegexBuilder;

use crate::domain::{SeriesKey, SubjectSeries, ThresholdFile};
use crate::error::{AppError, FitError};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Parse a whitespace/comma/semicolon separated list of numbers.
pub fn parse_number_list(text: &str) -> Result<Vec<f64>, FitError> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(FitError::validation(format!("'{token}' is not a valid number"))),
        })
        .collect()
}

/// Paired samples read from a scatter CSV.
#[derive(Debug, Clone)]
pub struct XyData {
    pub x_column: String,
    pub y_column: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub row_errors: Vec<RowError>,
}

/// Load a scatter CSV from disk. See [`read_xy_csv`].
pub fn load_xy_csv(path: &Path, x_pattern: &str, y_pattern: &str) -> Result<XyData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_xy_csv(file, x_pattern, y_pattern)
}

/// Read paired `(x, y)` samples from a CSV.
///
/// Columns are the first headers matching `x_pattern` / `y_pattern`
/// (case-insensitive regular expressions, e.g. `demonstrator` / `observer`).
pub fn read_xy_csv<R: Read>(reader: R, x_pattern: &str, y_pattern: &str) -> Result<XyData, AppError> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader)?;

    let (x_idx, x_column) = find_column(&headers, x_pattern)?
        .ok_or_else(|| AppError::new(2, format!("No CSV column matches /{x_pattern}/i.")))?;
    let (y_idx, y_column) = find_column(&headers, y_pattern)?
        .ok_or_else(|| AppError::new(2, format!("No CSV column matches /{y_pattern}/i.")))?;

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let x = parse_field(&record, x_idx, &x_column)?;
                let y = parse_field(&record, y_idx, &y_column)?;
                Ok((x, y))
            });
        match parsed {
            Ok((x, y)) => {
                xs.push(x);
                ys.push(y);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    report_row_errors(&row_errors);
    Ok(XyData {
        x_column,
        y_column,
        xs,
        ys,
        row_errors,
    })
}

/// Header names for the long-format batch CSV (matched case-insensitively).
#[derive(Debug, Clone)]
pub struct BatchColumns {
    pub subject: String,
    pub paradigm: String,
    pub measure: String,
    pub intensity: String,
    pub response: String,
}

impl Default for BatchColumns {
    fn default() -> Self {
        Self {
            subject: "subject".to_string(),
            paradigm: "paradigm".to_string(),
            measure: "measure".to_string(),
            intensity: "intensity".to_string(),
            response: "response".to_string(),
        }
    }
}

/// Paradigm used when the batch CSV has no paradigm column.
pub const DEFAULT_PARADIGM: &str = "all";
/// Measure used when the batch CSV has no measure column.
pub const DEFAULT_MEASURE: &str = "response";

/// Batch ingest output: grouped series plus row diagnostics.
#[derive(Debug, Clone)]
pub struct BatchIngest {
    /// One entry per (subject, paradigm, measure), sorted by key.
    pub series: Vec<SubjectSeries>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

pub fn load_batch_csv(path: &Path, columns: &BatchColumns) -> Result<BatchIngest, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_batch_csv(file, columns)
}

/// Read and group a long-format batch CSV.
///
/// `subject`, `intensity` and `response` columns are required; `paradigm` and
/// `measure` fall back to [`DEFAULT_PARADIGM`] / [`DEFAULT_MEASURE`]. Samples
/// keep their file order within each series.
pub fn read_batch_csv<R: Read>(reader: R, columns: &BatchColumns) -> Result<BatchIngest, AppError> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader)?;
    let header_map = build_header_map(&headers);

    let required = |name: &str| {
        header_map
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| AppError::new(2, format!("Missing required CSV column '{name}'.")))
    };
    let subject_idx = required(&columns.subject)?;
    let intensity_idx = required(&columns.intensity)?;
    let response_idx = required(&columns.response)?;
    let paradigm_idx = header_map.get(&columns.paradigm.to_lowercase()).copied();
    let measure_idx = header_map.get(&columns.measure.to_lowercase()).copied();

    let mut grouped: BTreeMap<SeriesKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let text = |i: Option<usize>, fallback: &str| {
            i.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        let subject = text(Some(subject_idx), "");
        if subject.is_empty() {
            row_errors.push(RowError {
                line,
                message: format!("empty '{}' value", columns.subject),
            });
            continue;
        }

        let values = parse_field(&record, intensity_idx, &columns.intensity).and_then(|i| {
            parse_field(&record, response_idx, &columns.response).map(|r| (i, r))
        });
        let (intensity, response) = match values {
            Ok(v) => v,
            Err(message) => {
                row_errors.push(RowError { line, message });
                continue;
            }
        };

        let key = SeriesKey {
            subject,
            paradigm: text(paradigm_idx, DEFAULT_PARADIGM),
            measure: text(measure_idx, DEFAULT_MEASURE),
        };
        let entry = grouped.entry(key).or_default();
        entry.0.push(intensity);
        entry.1.push(response);
    }

    report_row_errors(&row_errors);
    let series = grouped
        .into_iter()
        .map(|(key, (intensities, responses))| SubjectSeries {
            key,
            intensities,
            responses,
        })
        .collect();

    Ok(BatchIngest {
        series,
        row_errors,
        rows_read,
    })
}

/// Load a threshold summary JSON (`subject -> paradigm -> measure -> series`).
pub fn load_threshold_json(path: &Path) -> Result<ThresholdFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open JSON '{}': {e}", path.display())))?;
    read_threshold_json(file)
}

pub fn read_threshold_json<R: Read>(reader: R) -> Result<ThresholdFile, AppError> {
    serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid threshold JSON: {e}")))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<StringRecord, AppError> {
    reader
        .headers()
        .map(|h| h.clone())
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (i, h) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(h.trim().to_lowercase()).or_insert(i);
    }
    map
}

/// First header matching `pattern` (case-insensitive).
fn find_column(headers: &StringRecord, pattern: &str) -> Result<Option<(usize, String)>, AppError> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::new(2, format!("Invalid column pattern '{pattern}': {e}")))?;
    Ok(headers
        .iter()
        .enumerate()
        .find(|(_, h)| re.is_match(h))
        .map(|(i, h)| (i, h.to_string())))
}

fn parse_field(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("missing '{name}' value"))?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("'{name}' is not a finite number: '{raw}'")),
    }
}

fn report_row_errors(row_errors: &[RowError]) {
    for e in row_errors {
        log::warn!("skipping CSV line {}: {}", e.line, e.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_list_accepts_mixed_separators() {
        let v = parse_number_list(" 0 50,150;300\t500 ").unwrap();
        assert_eq!(v, vec![0.0, 50.0, 150.0, 300.0, 500.0]);
        assert!(parse_number_list("").unwrap().is_empty());
    }

    #[test]
    fn number_list_rejects_garbage() {
        assert!(matches!(parse_number_list("1 two 3"), Err(FitError::Validation(_))));
        assert!(parse_number_list("1 NaN").is_err());
    }

    #[test]
    fn xy_columns_are_found_by_pattern() {
        let csv = "pair,Demonstrator_pupil,Observer_pupil\n\
                   d1,0.1,0.2\n\
                   d2,0.4,\n\
                   d3,0.9,0.7\n";
        let data = read_xy_csv(csv.as_bytes(), "demonstrator", "observer").unwrap();
        assert_eq!(data.x_column, "Demonstrator_pupil");
        assert_eq!(data.y_column, "Observer_pupil");
        assert_eq!(data.xs, vec![0.1, 0.9]);
        assert_eq!(data.ys, vec![0.2, 0.7]);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 3);
    }

    #[test]
    fn xy_missing_column_is_an_error() {
        let csv = "a,b\n1,2\n";
        let err = read_xy_csv(csv.as_bytes(), "demonstrator", "observer").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn batch_rows_are_grouped_by_series() {
        let csv = "Subject,Paradigm,Measure,Intensity,Response\n\
                   m2,der,pupil,0,1\n\
                   m1,der,pupil,0,0.5\n\
                   m1,der,pupil,10,0.9\n\
                   m1,ver,pupil,0,0.1\n\
                   m1,der,pupil,oops,1\n\
                   m2,der,pupil,10,3\n";
        let batch = read_batch_csv(csv.as_bytes(), &BatchColumns::default()).unwrap();
        assert_eq!(batch.rows_read, 6);
        assert_eq!(batch.row_errors.len(), 1);
        assert_eq!(batch.row_errors[0].line, 6);

        let keys: Vec<String> = batch.series.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["m1 der/pupil", "m1 ver/pupil", "m2 der/pupil"]);
        assert_eq!(batch.series[0].intensities, vec![0.0, 10.0]);
        assert_eq!(batch.series[0].responses, vec![0.5, 0.9]);
        assert_eq!(batch.series[2].responses, vec![1.0, 3.0]);
    }

    #[test]
    fn batch_without_condition_columns_uses_defaults() {
        let csv = "subject,intensity,response\ns1,0,1\ns1,1,2\n";
        let batch = read_batch_csv(csv.as_bytes(), &BatchColumns::default()).unwrap();
        assert_eq!(batch.series.len(), 1);
        assert_eq!(batch.series[0].key.paradigm, DEFAULT_PARADIGM);
        assert_eq!(batch.series[0].key.measure, DEFAULT_MEASURE);
    }

    #[test]
    fn batch_requires_core_columns() {
        let csv = "subject,intensity\ns1,0\n";
        assert!(read_batch_csv(csv.as_bytes(), &BatchColumns::default()).is_err());
    }

    #[test]
    fn threshold_json_parses_minimal_series() {
        let json = r#"{"7": {"der": {"pupil": {"threshold": 0.4, "r_squared": 0.95}}}}"#;
        let file = read_threshold_json(json.as_bytes()).unwrap();
        let series = &file["7"]["der"]["pupil"];
        assert_eq!(series.threshold, 0.4);
        assert!(series.x.is_empty());
    }
}
