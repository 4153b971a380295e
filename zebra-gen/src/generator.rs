//! One-shot wrapper around a [`GenerativeSession`] with a wall-clock budget
//! (spec.md §4.8), in the shape of `kenken_gen::generator::generate`'s
//! attempt-loop: fixed budget, deterministic perturbation on restart, check
//! elapsed time once per outer loop iteration.

use std::time::{Duration, Instant};

use zebra_core::{AllowedClueTypes, Category, CategorySet, Clue, ProofStep, Solution};
use zebra_solver::TargetFact;

use crate::error::SessionError;
use crate::rng::Rng;
use crate::session::GenerativeSession;

#[cfg(feature = "tracing")]
use tracing::{instrument, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

pub const DEFAULT_TIMEOUT_MS: u64 = 180_000;
const MAX_RESTARTS: u32 = 8;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub target_clue_count: Option<usize>,
    pub timeout_ms: u64,
    pub allowed_clue_types: AllowedClueTypes,
    pub seed: Option<u32>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            target_clue_count: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            allowed_clue_types: AllowedClueTypes::new(),
            seed: None,
        }
    }
}

/// The generated artifact (spec.md §4.8's `{solution, clues, proofChain,
/// targetFact?}`). `incomplete` is set when the timeout was hit before the
/// target (solved state or clue count) was reached; the caller decides
/// whether a partial chain is still useful.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub categories: CategorySet,
    pub solution: Solution,
    pub clues: Vec<Clue>,
    pub proof_chain: Vec<ProofStep>,
    pub target: Option<TargetFact>,
    pub incomplete: bool,
}

#[cfg_attr(feature = "tracing", instrument(skip(categories, target, options)))]
pub fn generate_puzzle(
    categories: Vec<Category>,
    target: Option<TargetFact>,
    options: GenerateOptions,
) -> Result<Puzzle, SessionError> {
    let deadline = Instant::now() + Duration::from_millis(options.timeout_ms);
    let base_seed = options.seed.unwrap_or_else(fallback_seed);

    let mut best: Option<Puzzle> = None;

    for attempt in 0..=MAX_RESTARTS {
        if attempt > 0 && Instant::now() >= deadline {
            break;
        }

        let attempt_seed = base_seed ^ (attempt.wrapping_mul(0x9E37_79B9));
        let rng = Rng::from_seed(attempt_seed);
        let mut session = GenerativeSession::start(
            categories.clone(),
            options.allowed_clue_types.clone(),
            target.clone(),
            rng,
        )?;

        let incomplete = loop {
            if Instant::now() >= deadline {
                break true;
            }
            match session.get_next_clue(None) {
                Ok(next) if next.solved => break false,
                Ok(_) => continue,
                Err(SessionError::NoMatchingClue) => break false,
                Err(e) => return Err(e),
            }
        };

        let clues: Vec<Clue> = session.get_proof_chain().iter().map(|s| s.clue.clone()).collect();
        trace!(attempt, chain_len = clues.len(), incomplete, "generate_puzzle attempt");

        let matches_target_count = match options.target_clue_count {
            Some(n) => clues.len() == n,
            None => true,
        };

        let candidate = Puzzle {
            categories: session.get_categories().clone(),
            solution: session.get_solution().clone(),
            clues,
            proof_chain: session.get_proof_chain().to_vec(),
            target: target.clone(),
            incomplete,
        };

        let is_better = best
            .as_ref()
            .map(|b| candidate.proof_chain.len() > b.proof_chain.len())
            .unwrap_or(true);
        if is_better {
            best = Some(candidate);
        }

        if matches_target_count && !incomplete {
            break;
        }
    }

    best.ok_or(SessionError::Timeout)
}

/// A generator never gets to this path under a caller-supplied seed; it only
/// covers the "no seed given" convenience case, where exact reproducibility
/// across runs is not claimed.
fn fallback_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0x2545_F491)
}
