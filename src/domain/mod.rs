//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - fit inputs and options (`LogisticOptions`, `ParameterBounds`, `SubjectSeries`)
//! - fit outputs (`LinearFit`, `LogisticFit`, `Normalization`)
//! - file schemas (`ThresholdFile`, `CurveFile`)
//! - per-command run configurations (`config`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
