//! `psyfit` library crate.
//!
//! The binary (`psyfit`) is a thin wrapper around this library so that:
//!
//! - the fitters are testable without spawning processes
//! - the core (`math`, `fit`) stays free of I/O and printing
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
