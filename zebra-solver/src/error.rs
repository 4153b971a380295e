use thiserror::Error;
use zebra_core::CoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("applying this clue would drive some row to zero possibilities")]
    Inconsistent,
}
