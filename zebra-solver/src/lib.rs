#![forbid(unsafe_code)]
//! Deterministic propagation and scoring over a [`zebra_core::Grid`]. This
//! crate never samples a solution or generates clues -- see `zebra-gen`.

pub mod error;
pub mod propagator;
pub mod scorer;

pub use crate::error::SolveError;
pub use crate::propagator::apply_clue;
pub use crate::scorer::{ScoredClue, TargetFact, score_clue};
