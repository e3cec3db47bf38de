//! Batch logistic fits, one per subject/condition series.
//!
//! Each series is fitted independently on the rayon pool. Fits share no state,
//! so a degenerate series only produces an error entry for itself.

use rayon::prelude::*;

use crate::domain::{LogisticOptions, SubjectFit, SubjectSeries};
use crate::fit::logistic::fit_logistic;

/// Fit every series. Output order matches input order.
pub fn fit_logistic_batch(series: &[SubjectSeries], options: &LogisticOptions) -> Vec<SubjectFit> {
    let fits: Vec<SubjectFit> = series
        .par_iter()
        .map(|s| SubjectFit {
            key: s.key.clone(),
            result: fit_logistic(&s.intensities, &s.responses, options),
        })
        .collect();

    for fit in &fits {
        if let Err(e) = &fit.result {
            log::warn!("{}: {e}", fit.key);
        }
    }
    log::debug!(
        "batch: {} series, {} fitted",
        fits.len(),
        fits.iter().filter(|f| f.result.is_ok()).count()
    );

    fits
}
