use thiserror::Error;

use crate::category::CategoryId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("fewer than two categories supplied ({0})")]
    TooFewCategories(usize),

    #[error("category {first:?} has {first_arity} values but {second:?} has {second_arity}")]
    ArityMismatch {
        first: CategoryId,
        first_arity: usize,
        second: CategoryId,
        second_arity: usize,
    },

    #[error("category id {0:?} is duplicated")]
    DuplicateCategoryId(CategoryId),

    #[error("category {category:?} has a duplicate value {value:?}")]
    DuplicateValue { category: CategoryId, value: String },

    #[error("ordinal category {0:?} has non-numeric or non-distinct ranks")]
    InvalidOrdinalRanks(CategoryId),

    #[error("category {0:?} is not known to this puzzle")]
    UnknownCategory(CategoryId),

    #[error("category {category:?} has no value {value:?}")]
    UnknownValue { category: CategoryId, value: String },

    #[error("disjunction children must not themselves be disjunctions")]
    NestedDisjunction,
}
