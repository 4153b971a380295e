use thiserror::Error;
use zebra_core::CoreError;
use zebra_solver::SolveError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("clue is not true under this session's solution")]
    ClueNotTrue,

    #[error("clue would not eliminate any remaining possibility")]
    ClueRedundant,

    #[error("no candidate clue satisfies the given constraints")]
    NoMatchingClue,

    #[error("generation ran out of its time budget")]
    Timeout,

    #[error("{0}")]
    ConfigurationError(String),
}
