#![forbid(unsafe_code)]
//! Shared data model for logic-grid puzzles: categories, the possibility
//! grid, solutions, and the closed clue registry. No solving or generation
//! logic lives here -- see `zebra-solver` and `zebra-gen`.

pub mod category;
pub mod clue;
pub mod error;
pub mod grid;
pub mod proof;
pub mod solution;

pub use crate::category::{Category, CategoryId, CategoryKind, CategorySet, CategoryValue};
pub use crate::clue::{
    AllowedClueTypes, BinaryOperator, Clue, ClueFamily, CrossOrdinalOperator, ItemRef,
    OrdinalOperator, SuperlativeOperator, UnaryFilter, family_allowed,
};
pub use crate::error::CoreError;
pub use crate::grid::Grid;
pub use crate::proof::{ProofStep, Reason, ReasonKind};
pub use crate::solution::Solution;
