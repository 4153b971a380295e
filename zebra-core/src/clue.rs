//! The closed clue registry (spec.md §3/§4.4): one variant per family, each
//! carrying its operand shape and a ground-truth predicate. Every other
//! component (solver, scorer, generator) dispatches on this enum; it is the
//! single source of truth for what a clue family *means*.

use std::collections::HashSet;

use crate::category::{Category, CategorySet};
use crate::error::CoreError;
use crate::solution::Solution;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalOperator {
    Lt,
    Gt,
    NotLt,
    NotGt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperlativeOperator {
    Min,
    Max,
    NotMin,
    NotMax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryFilter {
    IsOdd,
    IsEven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossOrdinalOperator {
    Match,
    NotMatch,
}

/// A `(category, value)` pair identifying one item. Plain data: clues never
/// hold object references, only ids and labels (spec.md §9: "no cyclic
/// references").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub category: String,
    pub value: String,
}

impl ItemRef {
    pub fn new(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            value: value.into(),
        }
    }

    fn resolve(&self, categories: &CategorySet) -> Result<(usize, usize), CoreError> {
        let cat_idx = categories.index_of(&self.category.as_str().into())?;
        let val_idx = categories.value_index(&self.category.as_str().into(), &self.value)?;
        Ok((cat_idx, val_idx))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clue {
    Binary {
        cat1: String,
        val1: String,
        cat2: String,
        val2: String,
        op: BinaryOperator,
    },
    Ordinal {
        item1: ItemRef,
        item2: ItemRef,
        ordinal_cat: String,
        op: OrdinalOperator,
    },
    Superlative {
        target: ItemRef,
        ordinal_cat: String,
        op: SuperlativeOperator,
    },
    Unary {
        target: ItemRef,
        ordinal_cat: String,
        filter: UnaryFilter,
    },
    CrossOrdinal {
        item1: ItemRef,
        ordinal1: String,
        offset1: i64,
        item2: ItemRef,
        ordinal2: String,
        offset2: i64,
        op: CrossOrdinalOperator,
    },
    Adjacency {
        item1: ItemRef,
        item2: ItemRef,
        ordinal_cat: String,
    },
    Between {
        target: ItemRef,
        lower: ItemRef,
        upper: ItemRef,
        ordinal_cat: String,
    },
    /// Neither child may itself be `Or` -- enforced by `Clue::disjunction`,
    /// the only constructor for this variant.
    Or {
        clue_a: Box<Clue>,
        clue_b: Box<Clue>,
    },
    Arithmetic {
        item1: ItemRef,
        item2: ItemRef,
        item3: ItemRef,
        item4: ItemRef,
        ordinal_cat: String,
    },
}

/// The family tag of a [`Clue`], used by `AllowedClueTypes` filtering and by
/// the generator's per-family enumerators (spec.md §4.5, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClueFamily {
    Binary,
    Ordinal,
    Superlative,
    Unary,
    CrossOrdinal,
    Adjacency,
    Between,
    Or,
    Arithmetic,
}

/// A set of allowed clue families; the empty set means "all" (spec.md §6).
pub type AllowedClueTypes = HashSet<ClueFamily>;

pub fn family_allowed(allowed: &AllowedClueTypes, family: ClueFamily) -> bool {
    allowed.is_empty() || allowed.contains(&family)
}

impl Clue {
    pub fn disjunction(clue_a: Clue, clue_b: Clue) -> Result<Clue, CoreError> {
        if matches!(clue_a, Clue::Or { .. }) || matches!(clue_b, Clue::Or { .. }) {
            return Err(CoreError::NestedDisjunction);
        }
        Ok(Clue::Or {
            clue_a: Box::new(clue_a),
            clue_b: Box::new(clue_b),
        })
    }

    pub fn family(&self) -> ClueFamily {
        match self {
            Clue::Binary { .. } => ClueFamily::Binary,
            Clue::Ordinal { .. } => ClueFamily::Ordinal,
            Clue::Superlative { .. } => ClueFamily::Superlative,
            Clue::Unary { .. } => ClueFamily::Unary,
            Clue::CrossOrdinal { .. } => ClueFamily::CrossOrdinal,
            Clue::Adjacency { .. } => ClueFamily::Adjacency,
            Clue::Between { .. } => ClueFamily::Between,
            Clue::Or { .. } => ClueFamily::Or,
            Clue::Arithmetic { .. } => ClueFamily::Arithmetic,
        }
    }

    /// All category ids this clue mentions, used for `includeSubjects`/
    /// `excludeSubjects` search constraints.
    pub fn subject_categories(&self) -> Vec<&str> {
        match self {
            Clue::Binary { cat1, cat2, .. } => vec![cat1.as_str(), cat2.as_str()],
            Clue::Ordinal {
                item1,
                item2,
                ordinal_cat,
                ..
            } => vec![&item1.category, &item2.category, ordinal_cat],
            Clue::Superlative {
                target, ordinal_cat, ..
            } => vec![&target.category, ordinal_cat],
            Clue::Unary {
                target, ordinal_cat, ..
            } => vec![&target.category, ordinal_cat],
            Clue::CrossOrdinal {
                item1,
                ordinal1,
                item2,
                ordinal2,
                ..
            } => vec![&item1.category, ordinal1, &item2.category, ordinal2],
            Clue::Adjacency {
                item1,
                item2,
                ordinal_cat,
            } => vec![&item1.category, &item2.category, ordinal_cat],
            Clue::Between {
                target,
                lower,
                upper,
                ordinal_cat,
            } => vec![
                &target.category,
                &lower.category,
                &upper.category,
                ordinal_cat,
            ],
            Clue::Or { clue_a, clue_b } => {
                let mut v = clue_a.subject_categories();
                v.extend(clue_b.subject_categories());
                v
            }
            Clue::Arithmetic {
                item1,
                item2,
                item3,
                item4,
                ordinal_cat,
            } => vec![
                &item1.category,
                &item2.category,
                &item3.category,
                &item4.category,
                ordinal_cat,
            ],
        }
    }

    /// Ground-truth predicate (spec.md §4.4(b)): is this clue true under
    /// `solution`?
    pub fn is_true_under(
        &self,
        categories: &CategorySet,
        solution: &Solution,
    ) -> Result<bool, CoreError> {
        match self {
            Clue::Binary {
                cat1,
                val1,
                cat2,
                val2,
                op,
            } => {
                let a = categories.index_of(&cat1.as_str().into())?;
                let va = categories.value_index(&cat1.as_str().into(), val1)?;
                let b = categories.index_of(&cat2.as_str().into())?;
                let vb = categories.value_index(&cat2.as_str().into(), val2)?;
                let is = solution.is_true(a, va, b, vb);
                Ok(match op {
                    BinaryOperator::Is => is,
                    BinaryOperator::IsNot => !is,
                })
            }
            Clue::Ordinal {
                item1,
                item2,
                ordinal_cat,
                op,
            } => {
                let p1 = item_ordinal_position(categories, solution, item1, ordinal_cat)?;
                let p2 = item_ordinal_position(categories, solution, item2, ordinal_cat)?;
                Ok(match op {
                    OrdinalOperator::Lt => p1 < p2,
                    OrdinalOperator::Gt => p1 > p2,
                    OrdinalOperator::NotLt => p1 >= p2,
                    OrdinalOperator::NotGt => p1 <= p2,
                })
            }
            Clue::Superlative {
                target,
                ordinal_cat,
                op,
            } => {
                let p = item_ordinal_position(categories, solution, target, ordinal_cat)?;
                let last = categories.arity() - 1;
                Ok(match op {
                    SuperlativeOperator::Min => p == 0,
                    SuperlativeOperator::Max => p == last,
                    SuperlativeOperator::NotMin => p != 0,
                    SuperlativeOperator::NotMax => p != last,
                })
            }
            Clue::Unary {
                target,
                ordinal_cat,
                filter,
            } => {
                let ord = categories.get(&ordinal_cat.as_str().into())?;
                let (cat_idx, val_idx) = target.resolve(categories)?;
                let ord_idx = categories.index_of(&ordinal_cat.as_str().into())?;
                let linked = solution.link(cat_idx, val_idx, ord_idx);
                let rank = ord
                    .rank_of(linked)
                    .ok_or_else(|| CoreError::InvalidOrdinalRanks(ordinal_cat.as_str().into()))?;
                let is_even = rank.rem_euclid(2) == 0;
                Ok(match filter {
                    UnaryFilter::IsEven => is_even,
                    UnaryFilter::IsOdd => !is_even,
                })
            }
            Clue::CrossOrdinal {
                item1,
                ordinal1,
                offset1,
                item2,
                ordinal2,
                offset2,
                op,
            } => {
                let v1 = virtual_item(categories, solution, item1, ordinal1, *offset1)?;
                let v2 = virtual_item(categories, solution, item2, ordinal2, *offset2)?;
                let (v1, v2) = match (v1, v2) {
                    (Some(v1), Some(v2)) => (v1, v2),
                    _ => return Ok(matches!(op, CrossOrdinalOperator::NotMatch)),
                };
                let (ord1_idx, virtual1) = v1;
                let (ord2_idx, virtual2) = v2;
                let matches = solution.link(ord1_idx, virtual1, ord2_idx) == virtual2;
                Ok(match op {
                    CrossOrdinalOperator::Match => matches,
                    CrossOrdinalOperator::NotMatch => !matches,
                })
            }
            Clue::Adjacency {
                item1,
                item2,
                ordinal_cat,
            } => {
                let p1 = item_ordinal_position(categories, solution, item1, ordinal_cat)?;
                let p2 = item_ordinal_position(categories, solution, item2, ordinal_cat)?;
                Ok((p1 as i64 - p2 as i64).abs() == 1)
            }
            Clue::Between {
                target,
                lower,
                upper,
                ordinal_cat,
            } => {
                let pt = item_ordinal_position(categories, solution, target, ordinal_cat)? as i64;
                let pl = item_ordinal_position(categories, solution, lower, ordinal_cat)? as i64;
                let pu = item_ordinal_position(categories, solution, upper, ordinal_cat)? as i64;
                Ok((pl < pt && pt < pu) || (pu < pt && pt < pl))
            }
            Clue::Or { clue_a, clue_b } => {
                Ok(clue_a.is_true_under(categories, solution)?
                    || clue_b.is_true_under(categories, solution)?)
            }
            Clue::Arithmetic {
                item1,
                item2,
                item3,
                item4,
                ordinal_cat,
            } => {
                let p1 = item_ordinal_position(categories, solution, item1, ordinal_cat)? as i64;
                let p2 = item_ordinal_position(categories, solution, item2, ordinal_cat)? as i64;
                let p3 = item_ordinal_position(categories, solution, item3, ordinal_cat)? as i64;
                let p4 = item_ordinal_position(categories, solution, item4, ordinal_cat)? as i64;
                Ok(p1 - p2 == p3 - p4)
            }
        }
    }
}

/// Zero-based position of `value_index` within `category`'s ordinal order.
pub fn rank_position(category: &Category, value_index: usize) -> Option<usize> {
    category
        .ordinal_order()
        .iter()
        .position(|&v| v == value_index)
}

fn item_ordinal_position(
    categories: &CategorySet,
    solution: &Solution,
    item: &ItemRef,
    ordinal_cat: &str,
) -> Result<usize, CoreError> {
    let (cat_idx, val_idx) = item.resolve(categories)?;
    let ord_idx = categories.index_of(&ordinal_cat.into())?;
    let ord = categories.get(&ordinal_cat.into())?;
    let linked = solution.link(cat_idx, val_idx, ord_idx);
    rank_position(ord, linked).ok_or_else(|| CoreError::InvalidOrdinalRanks(ordinal_cat.into()))
}

/// The "virtual item" a `CrossOrdinal` clue compares: the value occupying
/// `rank(item) + offset` in `ordinal_cat`'s order, or `None` if out of range.
/// Returns the ordinal category's index alongside the virtual value index.
fn virtual_item(
    categories: &CategorySet,
    solution: &Solution,
    item: &ItemRef,
    ordinal_cat: &str,
    offset: i64,
) -> Result<Option<(usize, usize)>, CoreError> {
    let ord_idx = categories.index_of(&ordinal_cat.into())?;
    let ord = categories.get(&ordinal_cat.into())?;
    let pos = item_ordinal_position(categories, solution, item, ordinal_cat)? as i64 + offset;
    if pos < 0 || pos as usize >= categories.arity() {
        return Ok(None);
    }
    let order = ord.ordinal_order();
    Ok(Some((ord_idx, order[pos as usize])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryKind, CategoryValue};

    fn sample_categories() -> CategorySet {
        let person = Category {
            id: "Person".into(),
            kind: CategoryKind::Nominal,
            values: vec![
                CategoryValue::nominal("A"),
                CategoryValue::nominal("B"),
                CategoryValue::nominal("C"),
            ],
        };
        let gold = Category {
            id: "Gold".into(),
            kind: CategoryKind::Ordinal,
            values: vec![
                CategoryValue::ordinal("10", 10),
                CategoryValue::ordinal("20", 20),
                CategoryValue::ordinal("30", 30),
            ],
        };
        CategorySet::validate(vec![person, gold]).unwrap()
    }

    fn sample_solution(categories: &CategorySet) -> Solution {
        // A:10, B:20, C:30
        Solution::from_rows(categories, vec![vec![0, 0], vec![1, 1], vec![2, 2]]).unwrap()
    }

    #[test]
    fn binary_is_and_is_not() {
        let cats = sample_categories();
        let sol = sample_solution(&cats);
        let is = Clue::Binary {
            cat1: "Person".into(),
            val1: "B".into(),
            cat2: "Gold".into(),
            val2: "20".into(),
            op: BinaryOperator::Is,
        };
        assert!(is.is_true_under(&cats, &sol).unwrap());

        let is_not = Clue::Binary {
            cat1: "Person".into(),
            val1: "B".into(),
            cat2: "Gold".into(),
            val2: "30".into(),
            op: BinaryOperator::IsNot,
        };
        assert!(is_not.is_true_under(&cats, &sol).unwrap());
    }

    #[test]
    fn superlative_min_max() {
        let cats = sample_categories();
        let sol = sample_solution(&cats);
        let min = Clue::Superlative {
            target: ItemRef::new("Person", "A"),
            ordinal_cat: "Gold".into(),
            op: SuperlativeOperator::Min,
        };
        assert!(min.is_true_under(&cats, &sol).unwrap());
        let max = Clue::Superlative {
            target: ItemRef::new("Person", "A"),
            ordinal_cat: "Gold".into(),
            op: SuperlativeOperator::Max,
        };
        assert!(!max.is_true_under(&cats, &sol).unwrap());
    }

    #[test]
    fn unary_parity_uses_raw_rank_value() {
        let cats = sample_categories();
        let sol = sample_solution(&cats);
        let even = Clue::Unary {
            target: ItemRef::new("Person", "A"),
            ordinal_cat: "Gold".into(),
            filter: UnaryFilter::IsEven,
        };
        assert!(even.is_true_under(&cats, &sol).unwrap()); // 10 is even
    }

    #[test]
    fn adjacency_and_between() {
        let cats = sample_categories();
        let sol = sample_solution(&cats);
        let adj = Clue::Adjacency {
            item1: ItemRef::new("Person", "A"),
            item2: ItemRef::new("Person", "B"),
            ordinal_cat: "Gold".into(),
        };
        assert!(adj.is_true_under(&cats, &sol).unwrap());

        let between = Clue::Between {
            target: ItemRef::new("Person", "B"),
            lower: ItemRef::new("Person", "A"),
            upper: ItemRef::new("Person", "C"),
            ordinal_cat: "Gold".into(),
        };
        assert!(between.is_true_under(&cats, &sol).unwrap());
    }

    #[test]
    fn empty_allowed_set_permits_everything() {
        let allowed: AllowedClueTypes = HashSet::new();
        assert!(family_allowed(&allowed, ClueFamily::Adjacency));
    }

    #[test]
    fn nonempty_allowed_set_restricts() {
        let mut allowed: AllowedClueTypes = HashSet::new();
        allowed.insert(ClueFamily::Binary);
        assert!(family_allowed(&allowed, ClueFamily::Binary));
        assert!(!family_allowed(&allowed, ClueFamily::Ordinal));
    }

    #[test]
    fn disjunction_rejects_nested_or() {
        let a = Clue::Binary {
            cat1: "Person".into(),
            val1: "A".into(),
            cat2: "Gold".into(),
            val2: "10".into(),
            op: BinaryOperator::Is,
        };
        let b = a.clone();
        let or1 = Clue::disjunction(a, b).unwrap();
        let c = Clue::Binary {
            cat1: "Person".into(),
            val1: "B".into(),
            cat2: "Gold".into(),
            val2: "20".into(),
            op: BinaryOperator::Is,
        };
        assert!(Clue::disjunction(or1, c).is_err());
    }
}
