//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{LinearFit, LogisticFit, SubjectFit};
use crate::report::ThresholdReport;

/// Summary of a single psychometric fit.
pub fn format_logistic_summary(fit: &LogisticFit) -> String {
    let mut out = String::new();
    let raw = fit.raw_params();
    let norm = &fit.normalization;

    out.push_str("=== psyfit - psychometric logistic fit ===\n");
    out.push_str(&format!(
        "Normalization: x = I / {:.4} | y = (R - {:.4}) / {:.4}\n",
        norm.x_max, norm.y_base, norm.y_max
    ));
    let status = if fit.converged { "converged" } else { "NOT converged (iteration cap)" };
    out.push_str(&format!(
        "Solver: {status} after {} iterations, SSE={:.6e}\n",
        fit.iterations, fit.sse
    ));

    out.push('\n');
    out.push_str(&format!("{:<22} {:>14} {:>14}\n", "parameter", "normalized", "raw units"));
    out.push_str(&format!("{:-<22} {:-<14} {:-<14}\n", "", "", ""));
    let rows = [
        ("threshold (x0)", fit.params.x0, raw.x0),
        ("slope (k)", fit.params.k, raw.k),
        ("amplitude (L)", fit.params.amplitude, raw.amplitude),
        ("baseline (b)", fit.params.baseline, raw.baseline),
    ];
    for (name, n, r) in rows {
        out.push_str(&format!("{name:<22} {n:>14.4} {r:>14.4}\n"));
    }
    out.push_str(&format!("{:<22} {:>14.4}\n", "R²", fit.r_squared));
    out.push_str(&format!("{:<22} {:>14} {:>14.4}\n", "threshold intensity", "", fit.threshold_raw));

    out
}

/// One-line description of an OLS trend line.
pub fn format_linear_summary(fit: &LinearFit, x_label: &str, y_label: &str, n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== psyfit - linear regression ({y_label} ~ {x_label}) ===\n"));
    out.push_str(&format!("Samples: n={n}\n"));
    out.push_str(&format!("Fit: y = {:.2}x + {:.2}\n", fit.slope, fit.intercept));
    out.push_str(&format!("slope={:.6} intercept={:.6}\n", fit.slope, fit.intercept));
    out.push_str(&format!(
        "line: ({:.4}, {:.4}) -> ({:.4}, {:.4})\n",
        fit.line[0].x, fit.line[0].y, fit.line[1].x, fit.line[1].y
    ));
    out
}

/// Table of batch fits, one row per series.
pub fn format_batch_table(fits: &[SubjectFit]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:<10} {:<10} {:>8} {:>8} {:>8} {:>12} {:<5}\n",
            "subject", "paradigm", "measure", "x0", "k", "R²", "threshold", "conv"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<10} {:-<10} {:-<8} {:-<8} {:-<8} {:-<12} {:-<5}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for fit in fits {
        let key = &fit.key;
        let line = match &fit.result {
            Ok(f) => format!(
                "{:<12} {:<10} {:<10} {:>8.4} {:>8.3} {:>8.4} {:>12.4} {:<5}",
                truncate(&key.subject, 12),
                truncate(&key.paradigm, 10),
                truncate(&key.measure, 10),
                f.params.x0,
                f.params.k,
                f.r_squared,
                f.threshold_raw,
                if f.converged { "yes" } else { "no" },
            ),
            Err(e) => format!(
                "{:<12} {:<10} {:<10} error: {e}",
                truncate(&key.subject, 12),
                truncate(&key.paradigm, 10),
                truncate(&key.measure, 10),
            ),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }

    let failed = fits.iter().filter(|f| f.result.is_err()).count();
    let stalled = fits
        .iter()
        .filter(|f| matches!(&f.result, Ok(fit) if !fit.converged))
        .count();
    out.push_str(&format!(
        "\n{} series | {} failed | {} not converged\n",
        fits.len(),
        failed,
        stalled
    ));

    out
}

/// Condition means and pairwise regressions.
pub fn format_threshold_report(report: &ThresholdReport) -> String {
    let mut out = String::new();

    out.push_str("=== psyfit - threshold summary ===\n");
    out.push_str(&format!("Subjects: {}\n\n", report.subjects));

    out.push_str(&format!("{:<24} {:>4} {:>14} {:>10}\n", "condition", "n", "mean threshold", "mean R²"));
    out.push_str(&format!("{:-<24} {:-<4} {:-<14} {:-<10}\n", "", "", "", ""));
    for c in &report.conditions {
        out.push_str(&format!(
            "{:<24} {:>4} {:>14.4} {:>10.4}\n",
            truncate(&c.condition.to_string(), 24),
            c.n,
            c.mean_threshold,
            c.mean_r_squared
        ));
    }

    if !report.correlations.is_empty() {
        out.push_str("\nThreshold correlations:\n");
    }
    for c in &report.correlations {
        match &c.fit {
            Ok(fit) => {
                let seg = fit.segment(0.0, 1.0);
                out.push_str(&format!(
                    "- {} vs {} (n={}): y = {:.2}x + {:.2} | [0,1]: {:.3} -> {:.3}\n",
                    c.x, c.y, c.n, fit.slope, fit.intercept, seg[0].y, seg[1].y
                ));
            }
            Err(e) => {
                out.push_str(&format!("- {} vs {} (n={}): {e}\n", c.x, c.y, c.n));
            }
        }
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
