//! Response models.
//!
//! Models are implemented as small, pure functions so that the solver code can
//! stay generic over the parameter vector.

pub mod logistic;

pub use logistic::*;
