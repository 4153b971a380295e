//! Ranks a candidate clue against the current grid without mutating it
//! (spec.md §4.6): how much it would deduce, whether it's a "direct answer"
//! to a configured target fact, and an overall heuristic score.

use zebra_core::{CategoryId, CategorySet, Clue, Grid, Reason};

use crate::error::SolveError;
use crate::propagator::apply_clue;

/// A `(category, value, category)` triple the session additionally tracks as
/// solved once its third leg is determined (spec.md §3, §4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFact {
    pub cat1: String,
    pub val1: String,
    pub cat2: String,
}

impl TargetFact {
    pub fn new(cat1: impl Into<String>, val1: impl Into<String>, cat2: impl Into<String>) -> Self {
        Self {
            cat1: cat1.into(),
            val1: val1.into(),
            cat2: cat2.into(),
        }
    }

    pub fn is_solved(&self, grid: &Grid, categories: &CategorySet) -> Result<bool, SolveError> {
        let a = categories.index_of(&CategoryId::from(self.cat1.as_str()))?;
        let va = categories.value_index(&CategoryId::from(self.cat1.as_str()), &self.val1)?;
        let b = categories.index_of(&CategoryId::from(self.cat2.as_str()))?;
        Ok(grid.determined(a, va, b).is_some())
    }
}

/// Value-type scored record (spec.md §9's first Open Question resolved in
/// favor of value types over clue objects carrying cached metadata).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredClue {
    pub clue: Clue,
    pub updates: usize,
    pub reasons: Vec<Reason>,
    pub percent_complete: f64,
    pub heuristic_score: i64,
    pub is_direct_answer: bool,
}

/// Scores `clue` against `grid` by cloning and applying it; `grid` itself is
/// never mutated.
pub fn score_clue(
    clue: &Clue,
    grid: &Grid,
    categories: &CategorySet,
    target: Option<&TargetFact>,
) -> Result<ScoredClue, SolveError> {
    let target_already_solved = match target {
        Some(t) => t.is_solved(grid, categories)?,
        None => false,
    };

    let mut scratch = grid.clone();
    let step = apply_clue(&mut scratch, categories, clue)?;

    let is_direct_answer = match target {
        Some(t) if !target_already_solved => {
            t.is_solved(&scratch, categories)? && !scratch.is_fully_solved()
        }
        _ => false,
    };

    let heuristic_score = heuristic_score(step.updates, is_direct_answer, clue);

    Ok(ScoredClue {
        clue: clue.clone(),
        updates: step.updates,
        reasons: step.reasons,
        percent_complete: step.percent_complete,
        heuristic_score,
        is_direct_answer,
    })
}

/// `updates * 10 - redundancy_penalty - tautology_penalty + ordinal_bonus`
/// (spec.md §4.6's recommended formula). A zero-update clue is a tautology
/// and scores at the floor regardless of anything else; a direct answer is
/// pushed toward the bottom of the ranking but stays above the floor so it
/// can still be picked when nothing else applies.
fn heuristic_score(updates: usize, is_direct_answer: bool, clue: &Clue) -> i64 {
    const TAUTOLOGY_FLOOR: i64 = i64::MIN / 2;
    const DIRECT_ANSWER_PENALTY: i64 = 1_000;
    const ORDINAL_BONUS: i64 = 2;

    if updates == 0 {
        return TAUTOLOGY_FLOOR;
    }

    let mut score = updates as i64 * 10;
    if is_direct_answer {
        score -= DIRECT_ANSWER_PENALTY;
    }
    if is_ordinal_family(clue) {
        score += ORDINAL_BONUS;
    }
    score
}

fn is_ordinal_family(clue: &Clue) -> bool {
    matches!(
        clue,
        Clue::Ordinal { .. }
            | Clue::Superlative { .. }
            | Clue::Unary { .. }
            | Clue::CrossOrdinal { .. }
            | Clue::Adjacency { .. }
            | Clue::Between { .. }
            | Clue::Arithmetic { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use zebra_core::{BinaryOperator, Category, CategoryKind, CategoryValue};

    fn binary_categories() -> CategorySet {
        let a = Category {
            id: "A".into(),
            kind: CategoryKind::Nominal,
            values: vec![CategoryValue::nominal("a1"), CategoryValue::nominal("a2")],
        };
        let b = Category {
            id: "B".into(),
            kind: CategoryKind::Nominal,
            values: vec![CategoryValue::nominal("b1"), CategoryValue::nominal("b2")],
        };
        CategorySet::validate(vec![a, b]).unwrap()
    }

    #[test]
    fn tautology_scores_at_the_floor() {
        let categories = binary_categories();
        let mut grid = Grid::blank(2, 2);
        let force = Clue::Binary {
            cat1: "A".into(),
            val1: "a1".into(),
            cat2: "B".into(),
            val2: "b1".into(),
            op: BinaryOperator::Is,
        };
        // Apply once for real so the same clue becomes a no-op the second time.
        apply_clue(&mut grid, &categories, &force).unwrap();
        let scored = score_clue(&force, &grid, &categories, None).unwrap();
        assert_eq!(scored.updates, 0);
        assert_eq!(scored.heuristic_score, i64::MIN / 2);
    }

    fn three_way_categories() -> CategorySet {
        let a = Category {
            id: "A".into(),
            kind: CategoryKind::Nominal,
            values: vec![
                CategoryValue::nominal("a1"),
                CategoryValue::nominal("a2"),
                CategoryValue::nominal("a3"),
            ],
        };
        let b = Category {
            id: "B".into(),
            kind: CategoryKind::Nominal,
            values: vec![
                CategoryValue::nominal("b1"),
                CategoryValue::nominal("b2"),
                CategoryValue::nominal("b3"),
            ],
        };
        let c = Category {
            id: "C".into(),
            kind: CategoryKind::Nominal,
            values: vec![
                CategoryValue::nominal("c1"),
                CategoryValue::nominal("c2"),
                CategoryValue::nominal("c3"),
            ],
        };
        CategorySet::validate(vec![a, b, c]).unwrap()
    }

    #[test]
    fn direct_answer_is_detected_and_penalised() {
        let categories = three_way_categories();
        let grid = Grid::blank(3, 3);
        let clue = Clue::Binary {
            cat1: "A".into(),
            val1: "a1".into(),
            cat2: "B".into(),
            val2: "b1".into(),
            op: BinaryOperator::Is,
        };
        let target = TargetFact::new("A", "a1", "B");
        let scored = score_clue(&clue, &grid, &categories, Some(&target)).unwrap();
        assert!(scored.is_direct_answer);
        assert!(scored.heuristic_score < scored.updates as i64 * 10);
    }

    #[test]
    fn non_target_clue_is_not_a_direct_answer() {
        let categories = three_way_categories();
        let grid = Grid::blank(3, 3);
        let clue = Clue::Binary {
            cat1: "A".into(),
            val1: "a1".into(),
            cat2: "B".into(),
            val2: "b1".into(),
            op: BinaryOperator::IsNot,
        };
        let target = TargetFact::new("A", "a2", "B");
        let scored = score_clue(&clue, &grid, &categories, Some(&target)).unwrap();
        assert!(!scored.is_direct_answer);
    }
}
