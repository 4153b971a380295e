//! The sampled ground truth a puzzle is generated against.
//!
//! A `Solution` is represented as `N` "identity rows": for each of the `N`
//! underlying identities, one value index per category. This is the
//! representation spec.md §3 describes as "the N identities partition the
//! product space into N disjoint complete rows" and makes the bijection and
//! transitivity invariants structural rather than something to re-check.

use crate::category::CategorySet;
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    num_categories: usize,
    arity: usize,
    /// `rows[identity][category_index] = value_index`
    rows: Vec<Vec<usize>>,
}

impl Solution {
    /// Builds a solution from `N` fully populated rows, validating that each
    /// category column is itself a bijection (every value index 0..arity
    /// appears exactly once across the rows).
    pub fn from_rows(categories: &CategorySet, rows: Vec<Vec<usize>>) -> Result<Self, CoreError> {
        let arity = categories.arity();
        let num_categories = categories.categories().len();
        debug_assert_eq!(rows.len(), arity);
        for row in &rows {
            debug_assert_eq!(row.len(), num_categories);
        }

        for cat_idx in 0..num_categories {
            let mut seen = vec![false; arity];
            for row in &rows {
                seen[row[cat_idx]] = true;
            }
            debug_assert!(seen.into_iter().all(|b| b));
        }

        Ok(Self {
            num_categories,
            arity,
            rows,
        })
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn num_categories(&self) -> usize {
        self.num_categories
    }

    fn identity_of(&self, category: usize, value: usize) -> usize {
        self.rows
            .iter()
            .position(|row| row[category] == value)
            .expect("value index out of range for this solution's arity")
    }

    /// `Solution[a][b][value_a]` -- the linked value of category `b` for
    /// `value_a` in category `a`. Transitively consistent by construction.
    pub fn link(&self, a: usize, value_a: usize, b: usize) -> usize {
        if a == b {
            return value_a;
        }
        let identity = self.identity_of(a, value_a);
        self.rows[identity][b]
    }

    pub fn is_true(&self, a: usize, va: usize, b: usize, vb: usize) -> bool {
        self.link(a, va, b) == vb
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{Category, CategoryId, CategoryKind, CategoryValue};

    fn two_cat_set() -> CategorySet {
        let a = Category {
            id: CategoryId::from("A"),
            kind: CategoryKind::Nominal,
            values: vec![CategoryValue::nominal("a1"), CategoryValue::nominal("a2")],
        };
        let b = Category {
            id: CategoryId::from("B"),
            kind: CategoryKind::Nominal,
            values: vec![CategoryValue::nominal("b1"), CategoryValue::nominal("b2")],
        };
        CategorySet::validate(vec![a, b]).unwrap()
    }

    #[test]
    fn link_round_trips() {
        let cats = two_cat_set();
        let sol = Solution::from_rows(&cats, vec![vec![0, 1], vec![1, 0]]).unwrap();
        assert_eq!(sol.link(0, 0, 1), 1);
        assert_eq!(sol.link(0, 1, 1), 0);
        assert!(sol.is_true(0, 0, 1, 1));
        assert!(!sol.is_true(0, 0, 1, 0));
    }

    #[test]
    fn link_is_transitively_consistent_across_three_categories() {
        let a = Category {
            id: CategoryId::from("A"),
            kind: CategoryKind::Nominal,
            values: vec![CategoryValue::nominal("a1"), CategoryValue::nominal("a2")],
        };
        let b = Category {
            id: CategoryId::from("B"),
            kind: CategoryKind::Nominal,
            values: vec![CategoryValue::nominal("b1"), CategoryValue::nominal("b2")],
        };
        let c = Category {
            id: CategoryId::from("C"),
            kind: CategoryKind::Nominal,
            values: vec![CategoryValue::nominal("c1"), CategoryValue::nominal("c2")],
        };
        let cats = CategorySet::validate(vec![a, b, c]).unwrap();
        let sol = Solution::from_rows(&cats, vec![vec![0, 1, 1], vec![1, 0, 0]]).unwrap();
        let v_b = sol.link(0, 0, 1);
        let v_c_via_b = sol.link(1, v_b, 2);
        let v_c_direct = sol.link(0, 0, 2);
        assert_eq!(v_c_via_b, v_c_direct);
    }
}
