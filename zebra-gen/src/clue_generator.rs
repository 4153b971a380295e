//! From a solution and an `AllowedClueTypes` set, produces the pool of
//! candidate true clues a session draws from (spec.md §4.5). Every family's
//! enumerator leans on `Clue::is_true_under` -- the registry's own predicate
//! -- rather than re-deriving position arithmetic here, so the pool can
//! never disagree with the solver about what's true.
//!
//! Arithmetic and disjunction are deliberately absent from the eager pool
//! (spec.md §4.7's "minus disjunction/arithmetic"); they're sampled lazily
//! on demand since their true instances are comparatively rare and
//! expensive to enumerate exhaustively.

use zebra_core::{
    AllowedClueTypes, BinaryOperator, CategoryKind, CategorySet, Clue, ClueFamily,
    CrossOrdinalOperator, ItemRef, OrdinalOperator, Solution, SuperlativeOperator, UnaryFilter,
    family_allowed,
};

use crate::error::SessionError;
use crate::rng::Rng;

const CROSS_ORDINAL_OFFSETS: [i64; 3] = [-1, 0, 1];
const ARITHMETIC_ATTEMPTS: usize = 200;
const DISJUNCTION_ATTEMPTS: usize = 50;

/// Rejects an `allowed` set that can never be satisfied by `categories`
/// (spec.md §4.5's feasibility guards, surfaced as spec.md §7's
/// `ConfigurationError`).
pub fn validate_allowed(
    categories: &CategorySet,
    allowed: &AllowedClueTypes,
) -> Result<(), SessionError> {
    let ordinal_count = categories.ordinal_categories().count();

    if family_allowed(allowed, ClueFamily::CrossOrdinal) && ordinal_count < 2 {
        return Err(SessionError::ConfigurationError(
            "CrossOrdinal requires at least two ordinal categories".into(),
        ));
    }

    let needs_one_ordinal = [
        ClueFamily::Ordinal,
        ClueFamily::Superlative,
        ClueFamily::Adjacency,
        ClueFamily::Between,
        ClueFamily::Arithmetic,
        ClueFamily::Unary,
    ];
    if needs_one_ordinal
        .iter()
        .any(|&f| family_allowed(allowed, f))
        && ordinal_count < 1
    {
        return Err(SessionError::ConfigurationError(
            "this clue family requires at least one ordinal category".into(),
        ));
    }

    if family_allowed(allowed, ClueFamily::Unary) && !categories.has_mixed_parity_ordinal() {
        return Err(SessionError::ConfigurationError(
            "Unary requires an ordinal category with both odd- and even-ranked values".into(),
        ));
    }

    Ok(())
}

/// All `(category_index, value_index)` items outside `exclude`.
fn items_excluding(categories: &CategorySet, exclude: usize) -> Vec<(usize, usize)> {
    let arity = categories.arity();
    (0..categories.categories().len())
        .filter(|&c| c != exclude)
        .flat_map(|c| (0..arity).map(move |v| (c, v)))
        .collect()
}

fn item_ref(categories: &CategorySet, cat: usize, val: usize) -> ItemRef {
    let category = &categories.categories()[cat];
    ItemRef::new(category.id.0.clone(), category.values[val].label.clone())
}

fn enumerate_binary(categories: &CategorySet, solution: &Solution) -> Vec<Clue> {
    let mut out = Vec::new();
    let cats = categories.categories();
    for a in 0..cats.len() {
        for b in (a + 1)..cats.len() {
            for va in 0..categories.arity() {
                for vb in 0..categories.arity() {
                    for op in [BinaryOperator::Is, BinaryOperator::IsNot] {
                        let clue = Clue::Binary {
                            cat1: cats[a].id.0.clone(),
                            val1: cats[a].values[va].label.clone(),
                            cat2: cats[b].id.0.clone(),
                            val2: cats[b].values[vb].label.clone(),
                            op,
                        };
                        if clue.is_true_under(categories, solution).unwrap_or(false) {
                            out.push(clue);
                        }
                    }
                }
            }
        }
    }
    out
}

fn enumerate_ordinal(categories: &CategorySet, solution: &Solution) -> Vec<Clue> {
    let mut out = Vec::new();
    for (ord_idx, ord) in categories.categories().iter().enumerate() {
        if ord.kind != CategoryKind::Ordinal {
            continue;
        }
        let items = items_excluding(categories, ord_idx);
        for &(ca, va) in &items {
            for &(cb, vb) in &items {
                if (ca, va) == (cb, vb) {
                    continue;
                }
                let item1 = item_ref(categories, ca, va);
                let item2 = item_ref(categories, cb, vb);
                for op in [
                    OrdinalOperator::Lt,
                    OrdinalOperator::Gt,
                    OrdinalOperator::NotLt,
                    OrdinalOperator::NotGt,
                ] {
                    let clue = Clue::Ordinal {
                        item1: item1.clone(),
                        item2: item2.clone(),
                        ordinal_cat: ord.id.0.clone(),
                        op,
                    };
                    if clue.is_true_under(categories, solution).unwrap_or(false) {
                        out.push(clue);
                    }
                }
            }
        }
    }
    out
}

fn enumerate_superlative(categories: &CategorySet, solution: &Solution) -> Vec<Clue> {
    let mut out = Vec::new();
    for (ord_idx, ord) in categories.categories().iter().enumerate() {
        if ord.kind != CategoryKind::Ordinal {
            continue;
        }
        for &(c, v) in &items_excluding(categories, ord_idx) {
            let target = item_ref(categories, c, v);
            for op in [
                SuperlativeOperator::Min,
                SuperlativeOperator::Max,
                SuperlativeOperator::NotMin,
                SuperlativeOperator::NotMax,
            ] {
                let clue = Clue::Superlative {
                    target: target.clone(),
                    ordinal_cat: ord.id.0.clone(),
                    op,
                };
                if clue.is_true_under(categories, solution).unwrap_or(false) {
                    out.push(clue);
                }
            }
        }
    }
    out
}

fn enumerate_unary(categories: &CategorySet, solution: &Solution) -> Vec<Clue> {
    let mut out = Vec::new();
    for (ord_idx, ord) in categories.categories().iter().enumerate() {
        if ord.kind != CategoryKind::Ordinal {
            continue;
        }
        let seen_even = ord.values.iter().any(|v| matches!(v.rank, Some(r) if r.rem_euclid(2) == 0));
        let seen_odd = ord.values.iter().any(|v| matches!(v.rank, Some(r) if r.rem_euclid(2) != 0));
        if !(seen_even && seen_odd) {
            continue;
        }
        for &(c, v) in &items_excluding(categories, ord_idx) {
            let target = item_ref(categories, c, v);
            for filter in [UnaryFilter::IsOdd, UnaryFilter::IsEven] {
                let clue = Clue::Unary {
                    target: target.clone(),
                    ordinal_cat: ord.id.0.clone(),
                    filter,
                };
                if clue.is_true_under(categories, solution).unwrap_or(false) {
                    out.push(clue);
                }
            }
        }
    }
    out
}

fn enumerate_adjacency(categories: &CategorySet, solution: &Solution) -> Vec<Clue> {
    let mut out = Vec::new();
    for (ord_idx, ord) in categories.categories().iter().enumerate() {
        if ord.kind != CategoryKind::Ordinal {
            continue;
        }
        let items = items_excluding(categories, ord_idx);
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let clue = Clue::Adjacency {
                    item1: item_ref(categories, items[i].0, items[i].1),
                    item2: item_ref(categories, items[j].0, items[j].1),
                    ordinal_cat: ord.id.0.clone(),
                };
                if clue.is_true_under(categories, solution).unwrap_or(false) {
                    out.push(clue);
                }
            }
        }
    }
    out
}

fn enumerate_between(categories: &CategorySet, solution: &Solution) -> Vec<Clue> {
    let mut out = Vec::new();
    for (ord_idx, ord) in categories.categories().iter().enumerate() {
        if ord.kind != CategoryKind::Ordinal {
            continue;
        }
        let items = items_excluding(categories, ord_idx);
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                for k in 0..items.len() {
                    if k == i || k == j {
                        continue;
                    }
                    let clue = Clue::Between {
                        target: item_ref(categories, items[k].0, items[k].1),
                        lower: item_ref(categories, items[i].0, items[i].1),
                        upper: item_ref(categories, items[j].0, items[j].1),
                        ordinal_cat: ord.id.0.clone(),
                    };
                    if clue.is_true_under(categories, solution).unwrap_or(false) {
                        out.push(clue);
                    }
                }
            }
        }
    }
    out
}

fn enumerate_cross_ordinal(categories: &CategorySet, solution: &Solution) -> Vec<Clue> {
    let mut out = Vec::new();
    let ordinals: Vec<usize> = categories
        .categories()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == CategoryKind::Ordinal)
        .map(|(i, _)| i)
        .collect();

    for i in 0..ordinals.len() {
        for j in (i + 1)..ordinals.len() {
            let ord1_idx = ordinals[i];
            let ord2_idx = ordinals[j];
            let ord1 = &categories.categories()[ord1_idx];
            let ord2 = &categories.categories()[ord2_idx];
            let items1 = items_excluding(categories, ord1_idx);
            let items2 = items_excluding(categories, ord2_idx);
            for &(c1, v1) in &items1 {
                for &(c2, v2) in &items2 {
                    for &offset1 in &CROSS_ORDINAL_OFFSETS {
                        for &offset2 in &CROSS_ORDINAL_OFFSETS {
                            for op in [CrossOrdinalOperator::Match, CrossOrdinalOperator::NotMatch]
                            {
                                let clue = Clue::CrossOrdinal {
                                    item1: item_ref(categories, c1, v1),
                                    ordinal1: ord1.id.0.clone(),
                                    offset1,
                                    item2: item_ref(categories, c2, v2),
                                    ordinal2: ord2.id.0.clone(),
                                    offset2,
                                    op,
                                };
                                if clue.is_true_under(categories, solution).unwrap_or(false) {
                                    out.push(clue);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    out
}

/// The eager candidate pool (spec.md §4.5/§4.7), excluding `Arithmetic` and
/// `Or` which are sampled lazily.
pub fn generate_pool(categories: &CategorySet, solution: &Solution, allowed: &AllowedClueTypes) -> Vec<Clue> {
    let mut pool = Vec::new();
    if family_allowed(allowed, ClueFamily::Binary) {
        pool.extend(enumerate_binary(categories, solution));
    }
    if family_allowed(allowed, ClueFamily::Ordinal) {
        pool.extend(enumerate_ordinal(categories, solution));
    }
    if family_allowed(allowed, ClueFamily::Superlative) {
        pool.extend(enumerate_superlative(categories, solution));
    }
    if family_allowed(allowed, ClueFamily::Unary) {
        pool.extend(enumerate_unary(categories, solution));
    }
    if family_allowed(allowed, ClueFamily::Adjacency) {
        pool.extend(enumerate_adjacency(categories, solution));
    }
    if family_allowed(allowed, ClueFamily::Between) {
        pool.extend(enumerate_between(categories, solution));
    }
    if family_allowed(allowed, ClueFamily::CrossOrdinal) {
        pool.extend(enumerate_cross_ordinal(categories, solution));
    }
    pool
}

/// Random true Arithmetic clue, sampled rather than enumerated (spec.md
/// §4.7). Returns `None` if no true instance turns up within the attempt
/// budget.
pub fn sample_arithmetic(rng: &mut Rng, categories: &CategorySet, solution: &Solution) -> Option<Clue> {
    let ordinals: Vec<usize> = categories
        .categories()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == CategoryKind::Ordinal)
        .map(|(i, _)| i)
        .collect();
    if ordinals.is_empty() {
        return None;
    }

    for _ in 0..ARITHMETIC_ATTEMPTS {
        let &ord_idx = rng.pick(&ordinals)?;
        let ord = &categories.categories()[ord_idx];
        let items = items_excluding(categories, ord_idx);
        if items.len() < 4 {
            return None;
        }
        let picks: Vec<(usize, usize)> = (0..4)
            .map(|_| *rng.pick(&items).unwrap())
            .collect();
        let clue = Clue::Arithmetic {
            item1: item_ref(categories, picks[0].0, picks[0].1),
            item2: item_ref(categories, picks[1].0, picks[1].1),
            item3: item_ref(categories, picks[2].0, picks[2].1),
            item4: item_ref(categories, picks[3].0, picks[3].1),
            ordinal_cat: ord.id.0.clone(),
        };
        if clue.is_true_under(categories, solution).unwrap_or(false) {
            return Some(clue);
        }
    }
    None
}

/// Pairs a true clue from the pool with a random false sibling (spec.md
/// §4.5's lazy disjunction generation).
pub fn sample_disjunction(
    rng: &mut Rng,
    categories: &CategorySet,
    solution: &Solution,
    pool: &[Clue],
) -> Option<Clue> {
    let candidates: Vec<&Clue> = pool.iter().filter(|c| c.family() != ClueFamily::Or).collect();
    let clue_a = (*rng.pick(&candidates)?).clone();

    for _ in 0..DISJUNCTION_ATTEMPTS {
        let sibling_source = *rng.pick(&candidates)?;
        let Some(clue_b) = perturb_to_false(rng, categories, solution, sibling_source) else {
            continue;
        };
        if let Ok(disjunction) = Clue::disjunction(clue_a.clone(), clue_b) {
            return Some(disjunction);
        }
    }
    None
}

/// Mutates one operand of `template` until the result is false under
/// `solution`, keeping the same family and shape.
fn perturb_to_false(
    rng: &mut Rng,
    categories: &CategorySet,
    solution: &Solution,
    template: &Clue,
) -> Option<Clue> {
    let arity = categories.arity();
    let mut candidate = template.clone();
    for _ in 0..20 {
        match &mut candidate {
            Clue::Binary { val2, cat2, .. } => {
                let cat = categories.get(&cat2.as_str().into()).ok()?;
                *val2 = cat.values[rng.next_below(arity)?].label.clone();
            }
            Clue::Ordinal { op, .. } => {
                *op = *rng.pick(&[
                    OrdinalOperator::Lt,
                    OrdinalOperator::Gt,
                    OrdinalOperator::NotLt,
                    OrdinalOperator::NotGt,
                ])?;
            }
            Clue::Superlative { op, .. } => {
                *op = *rng.pick(&[
                    SuperlativeOperator::Min,
                    SuperlativeOperator::Max,
                    SuperlativeOperator::NotMin,
                    SuperlativeOperator::NotMax,
                ])?;
            }
            Clue::Unary { filter, .. } => {
                *filter = *rng.pick(&[UnaryFilter::IsOdd, UnaryFilter::IsEven])?;
            }
            Clue::CrossOrdinal { op, offset2, .. } => {
                *op = *rng.pick(&[CrossOrdinalOperator::Match, CrossOrdinalOperator::NotMatch])?;
                *offset2 = *rng.pick(&CROSS_ORDINAL_OFFSETS)?;
            }
            Clue::Adjacency { item2, .. } => {
                let idx = rng.next_below(arity)?;
                let cat = categories.get(&item2.category.as_str().into()).ok()?;
                item2.value = cat.values[idx].label.clone();
            }
            Clue::Between { target, .. } => {
                let idx = rng.next_below(arity)?;
                let cat = categories.get(&target.category.as_str().into()).ok()?;
                target.value = cat.values[idx].label.clone();
            }
            Clue::Arithmetic { item4, .. } => {
                let idx = rng.next_below(arity)?;
                let cat = categories.get(&item4.category.as_str().into()).ok()?;
                item4.value = cat.values[idx].label.clone();
            }
            Clue::Or { .. } => return None,
        }
        if !candidate.is_true_under(categories, solution).unwrap_or(true) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use zebra_core::{Category, CategoryId, CategoryKind, CategoryValue};

    fn cluedo_categories() -> CategorySet {
        let suspect = Category {
            id: CategoryId::from("Suspect"),
            kind: CategoryKind::Nominal,
            values: vec![
                CategoryValue::nominal("Mustard"),
                CategoryValue::nominal("Plum"),
                CategoryValue::nominal("Scarlet"),
            ],
        };
        let weapon = Category {
            id: CategoryId::from("Weapon"),
            kind: CategoryKind::Nominal,
            values: vec![
                CategoryValue::nominal("Candlestick"),
                CategoryValue::nominal("Rope"),
                CategoryValue::nominal("Wrench"),
            ],
        };
        let room = Category {
            id: CategoryId::from("Room"),
            kind: CategoryKind::Nominal,
            values: vec![
                CategoryValue::nominal("Kitchen"),
                CategoryValue::nominal("Library"),
                CategoryValue::nominal("Study"),
            ],
        };
        CategorySet::validate(vec![suspect, weapon, room]).unwrap()
    }

    #[test]
    fn validate_allowed_rejects_unary_without_mixed_parity() {
        let categories = cluedo_categories();
        let mut allowed = AllowedClueTypes::new();
        allowed.insert(ClueFamily::Unary);
        assert!(validate_allowed(&categories, &allowed).is_err());
    }

    #[test]
    fn generated_binary_pool_is_all_true() {
        let categories = cluedo_categories();
        let solution =
            Solution::from_rows(&categories, vec![vec![0, 0, 0], vec![1, 1, 1], vec![2, 2, 2]])
                .unwrap();
        let mut allowed = AllowedClueTypes::new();
        allowed.insert(ClueFamily::Binary);
        let pool = generate_pool(&categories, &solution, &allowed);
        assert!(!pool.is_empty());
        for clue in &pool {
            assert!(clue.is_true_under(&categories, &solution).unwrap());
        }
    }

    #[test]
    fn disjunction_sample_pairs_a_true_clue_with_a_false_one() {
        let categories = cluedo_categories();
        let solution =
            Solution::from_rows(&categories, vec![vec![0, 0, 0], vec![1, 1, 1], vec![2, 2, 2]])
                .unwrap();
        let mut allowed = AllowedClueTypes::new();
        allowed.insert(ClueFamily::Binary);
        let pool = generate_pool(&categories, &solution, &allowed);
        let mut rng = Rng::from_seed(5);
        let disjunction = sample_disjunction(&mut rng, &categories, &solution, &pool).unwrap();
        assert!(disjunction.is_true_under(&categories, &solution).unwrap());
        if let Clue::Or { clue_a, clue_b } = &disjunction {
            let a_true = clue_a.is_true_under(&categories, &solution).unwrap();
            let b_true = clue_b.is_true_under(&categories, &solution).unwrap();
            assert!(a_true != b_true || (a_true && b_true));
            assert!(a_true || b_true);
        } else {
            panic!("expected an Or clue");
        }
    }
}
