//! The stateful orchestrator over a proof chain (spec.md §4.7). A session
//! owns its categories, sampled solution, candidate pool, and RNG for its
//! entire lifetime; every mutating method re-derives `cached_grids` from a
//! blank grid rather than patching it in place (spec.md §9: "no in-place
//! patching").

use zebra_core::{
    AllowedClueTypes, Category, CategorySet, Clue, ClueFamily, Grid, ProofStep, Solution,
    family_allowed,
};
use zebra_solver::{ScoredClue, TargetFact, apply_clue, score_clue};

use crate::clue_generator;
use crate::error::SessionError;
use crate::rng::Rng;

#[cfg(feature = "tracing")]
use tracing::{instrument, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

/// Optional search constraints for `get_next_clue`/`get_scored_matching_clues`
/// (spec.md §4.7).
#[derive(Debug, Clone, Default)]
pub struct ClueConstraints {
    pub allowed_types: Option<AllowedClueTypes>,
    pub include_subjects: Option<Vec<String>>,
    pub exclude_subjects: Option<Vec<String>>,
    pub min_deductions: Option<usize>,
    pub max_deductions: Option<usize>,
}

/// Result of `get_next_clue`: the applied clue, or `None` if already solved.
#[derive(Debug, Clone, PartialEq)]
pub struct NextClue {
    pub clue: Option<Clue>,
    pub solved: bool,
}

#[derive(Debug, Clone)]
pub struct GenerativeSession {
    categories: CategorySet,
    solution: Solution,
    allowed: AllowedClueTypes,
    target: Option<TargetFact>,
    chain: Vec<ProofStep>,
    cached_grids: Vec<Grid>,
    candidate_pool: Vec<Clue>,
    rng: Rng,
}

impl GenerativeSession {
    #[cfg_attr(feature = "tracing", instrument(skip(categories, rng)))]
    pub fn start(
        categories: Vec<Category>,
        allowed: AllowedClueTypes,
        target: Option<TargetFact>,
        mut rng: Rng,
    ) -> Result<Self, SessionError> {
        let categories = CategorySet::validate(categories)?;
        clue_generator::validate_allowed(&categories, &allowed)?;

        let solution = sample_solution(&categories, &mut rng);
        let candidate_pool = clue_generator::generate_pool(&categories, &solution, &allowed);
        let blank = Grid::blank(categories.categories().len(), categories.arity());
        trace!(pool_size = candidate_pool.len(), "session.start");

        Ok(Self {
            categories,
            solution,
            allowed,
            target,
            chain: Vec::new(),
            cached_grids: vec![blank],
            candidate_pool,
            rng,
        })
    }

    fn current_grid(&self) -> &Grid {
        self.cached_grids.last().expect("cached_grids is never empty")
    }

    fn is_solved(&self) -> bool {
        match &self.target {
            Some(t) => t.is_solved(self.current_grid(), &self.categories).unwrap_or(false),
            None => self.current_grid().is_fully_solved(),
        }
    }

    fn already_used(&self, clue: &Clue) -> bool {
        self.chain.iter().any(|s| &s.clue == clue)
    }

    /// The eager pool plus a handful of lazily sampled Arithmetic/Or
    /// candidates (spec.md §4.7's "minus disjunction/arithmetic" pool,
    /// topped up here since this is already a mutating call).
    fn candidate_superset(&mut self) -> Vec<Clue> {
        let mut set = self.candidate_pool.clone();
        const LAZY_SAMPLES: usize = 5;

        if family_allowed(&self.allowed, ClueFamily::Arithmetic) {
            for _ in 0..LAZY_SAMPLES {
                if let Some(c) =
                    clue_generator::sample_arithmetic(&mut self.rng, &self.categories, &self.solution)
                {
                    set.push(c);
                }
            }
        }
        if family_allowed(&self.allowed, ClueFamily::Or) {
            for _ in 0..LAZY_SAMPLES {
                if let Some(c) = clue_generator::sample_disjunction(
                    &mut self.rng,
                    &self.categories,
                    &self.solution,
                    &self.candidate_pool,
                ) {
                    set.push(c);
                }
            }
        }
        set
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, constraints)))]
    pub fn get_next_clue(
        &mut self,
        constraints: Option<&ClueConstraints>,
    ) -> Result<NextClue, SessionError> {
        if self.is_solved() {
            return Ok(NextClue { clue: None, solved: true });
        }

        let default_constraints = ClueConstraints::default();
        let constraints = constraints.unwrap_or(&default_constraints);
        let candidates = self.candidate_superset();
        let grid = self.current_grid().clone();
        let target = self.target.clone();

        let mut scored: Vec<ScoredClue> = Vec::new();
        for clue in &candidates {
            if self.already_used(clue) || !passes_constraints(clue, constraints) {
                continue;
            }
            let sc = score_clue(clue, &grid, &self.categories, target.as_ref())?;
            if sc.updates == 0 || !passes_deduction_bounds(sc.updates, constraints) {
                continue;
            }
            scored.push(sc);
        }

        if scored.is_empty() {
            return Err(SessionError::NoMatchingClue);
        }

        let non_direct: Vec<&ScoredClue> = scored.iter().filter(|s| !s.is_direct_answer).collect();
        let chosen = if !non_direct.is_empty() {
            *non_direct.iter().max_by_key(|s| s.heuristic_score).unwrap()
        } else {
            scored.iter().max_by_key(|s| s.heuristic_score).unwrap()
        };
        let clue = chosen.clue.clone();

        let mut next_grid = grid;
        let step = apply_clue(&mut next_grid, &self.categories, &clue)?;
        self.cached_grids.push(next_grid);
        self.chain.push(step);
        trace!(chain_len = self.chain.len(), "session.get_next_clue");

        let solved = self.is_solved();
        Ok(NextClue { clue: Some(clue), solved })
    }

    /// Non-mutating enumeration over the eager pool only (spec.md §4.7) --
    /// unlike `get_next_clue` this never perturbs the RNG.
    pub fn get_scored_matching_clues(
        &self,
        constraints: Option<&ClueConstraints>,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredClue>, SessionError> {
        let default_constraints = ClueConstraints::default();
        let constraints = constraints.unwrap_or(&default_constraints);
        let grid = self.current_grid();

        let mut scored = Vec::new();
        for clue in &self.candidate_pool {
            if self.already_used(clue) || !passes_constraints(clue, constraints) {
                continue;
            }
            let sc = score_clue(clue, grid, &self.categories, self.target.as_ref())?;
            scored.push(sc);
        }
        scored.sort_by(|a, b| b.heuristic_score.cmp(&a.heuristic_score));
        if let Some(limit) = limit {
            scored.truncate(limit);
        }
        Ok(scored)
    }

    pub fn get_matching_clue_count(
        &self,
        constraints: Option<&ClueConstraints>,
    ) -> Result<usize, SessionError> {
        Ok(self.get_scored_matching_clues(constraints, None)?.len())
    }

    pub fn use_clue(&mut self, clue: Clue) -> Result<NextClue, SessionError> {
        if !clue.is_true_under(&self.categories, &self.solution)? {
            return Err(SessionError::ClueNotTrue);
        }
        if self.already_used(&clue) {
            return Err(SessionError::ClueRedundant);
        }

        let mut grid = self.current_grid().clone();
        let step = apply_clue(&mut grid, &self.categories, &clue)?;
        if step.updates == 0 {
            return Err(SessionError::ClueRedundant);
        }

        self.cached_grids.push(grid);
        self.chain.push(step);
        let solved = self.is_solved();
        Ok(NextClue { clue: Some(clue), solved })
    }

    pub fn rollback_last_clue(&mut self) -> bool {
        if self.chain.is_empty() {
            return false;
        }
        self.chain.pop();
        self.cached_grids.pop();
        true
    }

    pub fn move_clue(&mut self, from: usize, to: usize) -> Result<bool, SessionError> {
        if from >= self.chain.len() || to >= self.chain.len() {
            return Err(SessionError::ConfigurationError(
                "move_clue index out of range".into(),
            ));
        }
        if from == to {
            return Ok(false);
        }

        let mut clues: Vec<Clue> = self.chain.iter().map(|s| s.clue.clone()).collect();
        let moved = clues.remove(from);
        clues.insert(to, moved);

        let old_grids = self.cached_grids.clone();
        let (grids, steps) = replay(&self.categories, &clues)?;
        let changed = grids != old_grids;
        self.cached_grids = grids;
        self.chain = steps;
        Ok(changed)
    }

    pub fn remove_clue_at(&mut self, index: usize) -> Result<bool, SessionError> {
        if index >= self.chain.len() {
            return Err(SessionError::ConfigurationError(
                "remove_clue_at index out of range".into(),
            ));
        }

        let mut clues: Vec<Clue> = self.chain.iter().map(|s| s.clue.clone()).collect();
        clues.remove(index);

        let (grids, steps) = replay(&self.categories, &clues)?;
        self.cached_grids = grids;
        self.chain = steps;
        Ok(true)
    }

    pub fn get_solution(&self) -> &Solution {
        &self.solution
    }

    pub fn get_categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn get_proof_chain(&self) -> &[ProofStep] {
        &self.chain
    }

    pub fn get_cached_grids(&self) -> &[Grid] {
        &self.cached_grids
    }

    pub fn get_target_solved_step_index(&self) -> Option<usize> {
        let target = self.target.as_ref()?;
        self.cached_grids
            .iter()
            .position(|g| target.is_solved(g, &self.categories).unwrap_or(false))
    }
}

fn passes_constraints(clue: &Clue, constraints: &ClueConstraints) -> bool {
    if let Some(allowed) = &constraints.allowed_types {
        if !family_allowed(allowed, clue.family()) {
            return false;
        }
    }
    let subjects = clue.subject_categories();
    if let Some(include) = &constraints.include_subjects {
        if !subjects.iter().any(|s| include.iter().any(|i| i.as_str() == *s)) {
            return false;
        }
    }
    if let Some(exclude) = &constraints.exclude_subjects {
        if subjects.iter().any(|s| exclude.iter().any(|e| e.as_str() == *s)) {
            return false;
        }
    }
    true
}

fn passes_deduction_bounds(updates: usize, constraints: &ClueConstraints) -> bool {
    if let Some(min) = constraints.min_deductions {
        if updates < min {
            return false;
        }
    }
    if let Some(max) = constraints.max_deductions {
        if updates > max {
            return false;
        }
    }
    true
}

/// Replays `clues` on a blank grid, returning the cached grid after each
/// prefix alongside the freshly computed proof step for each clue.
fn replay(categories: &CategorySet, clues: &[Clue]) -> Result<(Vec<Grid>, Vec<ProofStep>), SessionError> {
    let blank = Grid::blank(categories.categories().len(), categories.arity());
    let mut grids = vec![blank];
    let mut steps = Vec::with_capacity(clues.len());
    for clue in clues {
        let mut grid = grids.last().unwrap().clone();
        let step = apply_clue(&mut grid, categories, clue)?;
        grids.push(grid);
        steps.push(step);
    }
    Ok((grids, steps))
}

/// Samples a uniformly random solution: an independent random permutation
/// per category column, each trivially a bijection by construction.
fn sample_solution(categories: &CategorySet, rng: &mut Rng) -> Solution {
    let arity = categories.arity();
    let num_categories = categories.categories().len();
    let mut rows: Vec<Vec<usize>> = vec![vec![0usize; num_categories]; arity];

    for cat_idx in 0..num_categories {
        let mut perm: Vec<usize> = (0..arity).collect();
        rng.shuffle_in_place(&mut perm);
        for (identity, &value) in perm.iter().enumerate() {
            rows[identity][cat_idx] = value;
        }
    }

    Solution::from_rows(categories, rows).expect("each column is a permutation by construction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use zebra_core::{CategoryId, CategoryKind, CategoryValue};

    fn cluedo() -> Vec<Category> {
        vec![
            Category {
                id: CategoryId::from("Suspect"),
                kind: CategoryKind::Nominal,
                values: vec![
                    CategoryValue::nominal("Mustard"),
                    CategoryValue::nominal("Plum"),
                    CategoryValue::nominal("Scarlet"),
                ],
            },
            Category {
                id: CategoryId::from("Weapon"),
                kind: CategoryKind::Nominal,
                values: vec![
                    CategoryValue::nominal("Candlestick"),
                    CategoryValue::nominal("Rope"),
                    CategoryValue::nominal("Wrench"),
                ],
            },
            Category {
                id: CategoryId::from("Room"),
                kind: CategoryKind::Nominal,
                values: vec![
                    CategoryValue::nominal("Kitchen"),
                    CategoryValue::nominal("Library"),
                    CategoryValue::nominal("Study"),
                ],
            },
        ]
    }

    fn binary_only() -> AllowedClueTypes {
        let mut allowed = AllowedClueTypes::new();
        allowed.insert(ClueFamily::Binary);
        allowed
    }

    #[test]
    fn tiny_binary_puzzle_reaches_full_solve() {
        let categories = vec![
            Category {
                id: CategoryId::from("A"),
                kind: CategoryKind::Nominal,
                values: vec![CategoryValue::nominal("a1"), CategoryValue::nominal("a2")],
            },
            Category {
                id: CategoryId::from("B"),
                kind: CategoryKind::Nominal,
                values: vec![CategoryValue::nominal("b1"), CategoryValue::nominal("b2")],
            },
        ];
        let mut session =
            GenerativeSession::start(categories, binary_only(), None, Rng::from_seed(1)).unwrap();

        let mut guard = 0;
        loop {
            let next = session.get_next_clue(None).unwrap();
            if next.solved {
                break;
            }
            guard += 1;
            assert!(guard < 100, "puzzle failed to converge");
        }
        assert!(!session.get_proof_chain().is_empty());
        assert!(session.get_cached_grids().last().unwrap().is_fully_solved());
    }

    #[test]
    fn cluedo_target_fact_gets_solved() {
        let mut session = GenerativeSession::start(
            cluedo(),
            binary_only(),
            Some(TargetFact::new("Suspect", "Mustard", "Weapon")),
            Rng::from_seed(42),
        )
        .unwrap();

        let mut guard = 0;
        loop {
            let next = session.get_next_clue(None).unwrap();
            if next.solved {
                break;
            }
            guard += 1;
            assert!(guard < 200, "target never solved");
        }
        assert!(session.get_target_solved_step_index().is_some());
    }

    #[test]
    fn remove_clue_at_replays_remainder_and_recomputes_cache() {
        let mut session = GenerativeSession::start(
            cluedo(),
            binary_only(),
            Some(TargetFact::new("Suspect", "Mustard", "Weapon")),
            Rng::from_seed(42),
        )
        .unwrap();

        for _ in 0..5 {
            session.get_next_clue(None).unwrap();
        }
        assert_eq!(session.get_proof_chain().len(), 5);

        session.remove_clue_at(2).unwrap();
        assert_eq!(session.get_proof_chain().len(), 4);
        assert_eq!(session.get_cached_grids().len(), 5);

        let remaining: Vec<Clue> = session.get_proof_chain().iter().map(|s| s.clue.clone()).collect();
        let (replayed, _) = replay(session.get_categories(), &remaining).unwrap();
        assert_eq!(replayed, session.get_cached_grids());
    }

    #[test]
    fn deterministic_reproducibility_same_seed_same_chain() {
        let allowed = binary_only();
        let mut session_a =
            GenerativeSession::start(cluedo(), allowed.clone(), None, Rng::from_seed(7)).unwrap();
        let mut session_b = GenerativeSession::start(cluedo(), allowed, None, Rng::from_seed(7)).unwrap();

        for _ in 0..3 {
            let a = session_a.get_next_clue(None).unwrap();
            let b = session_b.get_next_clue(None).unwrap();
            assert_eq!(a, b);
        }
    }
}
