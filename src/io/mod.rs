//! Input/output helpers.
//!
//! - number lists, scatter/batch CSV and threshold JSON ingest (`ingest`)
//! - batch result exports (CSV / threshold JSON) (`export`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use export::*;
pub use ingest::*;
