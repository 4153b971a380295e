#![forbid(unsafe_code)]
//! Puzzle generation: a deterministic RNG, a per-family true-clue enumerator,
//! the stateful `GenerativeSession`, and a one-shot `generate_puzzle` wrapper
//! around it. Solving and scoring live in `zebra-solver`; this crate only
//! samples solutions and picks which clues to reveal.

pub mod clue_generator;
pub mod error;
pub mod generator;
pub mod rng;
pub mod session;

pub use crate::error::SessionError;
pub use crate::generator::{GenerateOptions, Puzzle, generate_puzzle};
pub use crate::rng::Rng;
pub use crate::session::{ClueConstraints, GenerativeSession, NextClue};
