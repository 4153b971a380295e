//! The deterministic fixed-point constraint propagator: `apply_clue` mutates
//! a grid and runs the four deduction rules (clue-direct elimination,
//! row-of-one uniqueness, column-of-one uniqueness, transitivity) until
//! nothing more fires.

#[cfg(feature = "tracing")]
use tracing::{instrument, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

use zebra_core::clue::rank_position;
use zebra_core::{
    BinaryOperator, Category, CategoryId, CategorySet, Clue, CrossOrdinalOperator, Grid, ItemRef,
    OrdinalOperator, ProofStep, Reason, ReasonKind, SuperlativeOperator, UnaryFilter,
};

use crate::error::SolveError;

struct Tracker<'g> {
    grid: &'g mut Grid,
    updates: usize,
    reasons: Vec<Reason>,
}

impl<'g> Tracker<'g> {
    fn grid(&self) -> &Grid {
        self.grid
    }

    fn eliminate(
        &mut self,
        a: usize,
        va: usize,
        b: usize,
        vb: usize,
        kind: ReasonKind,
        description: impl Into<String>,
    ) -> bool {
        if self.grid.eliminate(a, va, b, vb) {
            self.updates += 1;
            self.reasons.push(Reason::new(kind, description));
            true
        } else {
            false
        }
    }
}

fn cat_idx(categories: &CategorySet, id: &str) -> Result<usize, SolveError> {
    Ok(categories.index_of(&CategoryId::from(id))?)
}

fn val_idx(categories: &CategorySet, id: &str, value: &str) -> Result<usize, SolveError> {
    Ok(categories.value_index(&CategoryId::from(id), value)?)
}

fn cat_obj<'a>(categories: &'a CategorySet, id: &str) -> Result<&'a Category, SolveError> {
    Ok(categories.get(&CategoryId::from(id))?)
}

fn resolve(categories: &CategorySet, item: &ItemRef) -> Result<(usize, usize), SolveError> {
    let c = cat_idx(categories, &item.category)?;
    let v = val_idx(categories, &item.category, &item.value)?;
    Ok((c, v))
}

/// `cargo doc`-visible alias kept short: positions possible for `(cat,val)`
/// through `ordinal_cat`, as i64 so offset arithmetic never needs casts.
fn possible_positions(
    grid: &Grid,
    ordinal: &Category,
    ordinal_idx: usize,
    cat: usize,
    val: usize,
    arity: usize,
) -> Vec<i64> {
    (0..arity)
        .filter(|&ov| grid.is_possible(cat, val, ordinal_idx, ov))
        .filter_map(|ov| rank_position(ordinal, ov).map(|p| p as i64))
        .collect()
}

/// Forward-checks a binary positional relation between two items, each
/// linked into its own (possibly distinct) ordinal category. Covers
/// Ordinal, Adjacency, and (pairwise, via `virtual_value`) CrossOrdinal.
#[allow(clippy::too_many_arguments)]
fn revise_positional_pair(
    t: &mut Tracker,
    arity: usize,
    cat_a: usize,
    val_a: usize,
    ord_a_idx: usize,
    ord_a: &Category,
    cat_b: usize,
    val_b: usize,
    ord_b_idx: usize,
    ord_b: &Category,
    compatible: impl Fn(i64, i64) -> bool,
) -> bool {
    let mut changed = false;
    for ov_a in 0..arity {
        if t.grid().is_possible(cat_a, val_a, ord_a_idx, ov_a) {
            let Some(pa) = rank_position(ord_a, ov_a) else {
                continue;
            };
            let supported = (0..arity).any(|ov_b| {
                t.grid().is_possible(cat_b, val_b, ord_b_idx, ov_b)
                    && rank_position(ord_b, ov_b)
                        .map(|pb| compatible(pa as i64, pb as i64))
                        .unwrap_or(false)
            });
            if !supported {
                changed |= t.eliminate(
                    cat_a,
                    val_a,
                    ord_a_idx,
                    ov_a,
                    ReasonKind::Elimination,
                    "no supporting position remains for the related item",
                );
            }
        }
    }
    for ov_b in 0..arity {
        if t.grid().is_possible(cat_b, val_b, ord_b_idx, ov_b) {
            let Some(pb) = rank_position(ord_b, ov_b) else {
                continue;
            };
            let supported = (0..arity).any(|ov_a| {
                t.grid().is_possible(cat_a, val_a, ord_a_idx, ov_a)
                    && rank_position(ord_a, ov_a)
                        .map(|pa| compatible(pa as i64, pb as i64))
                        .unwrap_or(false)
            });
            if !supported {
                changed |= t.eliminate(
                    cat_b,
                    val_b,
                    ord_b_idx,
                    ov_b,
                    ReasonKind::Elimination,
                    "no supporting position remains for the related item",
                );
            }
        }
    }
    changed
}

fn direct_binary(
    t: &mut Tracker,
    categories: &CategorySet,
    cat1: &str,
    val1: &str,
    cat2: &str,
    val2: &str,
    op: BinaryOperator,
) -> Result<bool, SolveError> {
    let a = cat_idx(categories, cat1)?;
    let va = val_idx(categories, cat1, val1)?;
    let b = cat_idx(categories, cat2)?;
    let vb = val_idx(categories, cat2, val2)?;
    let arity = categories.arity();
    let mut changed = false;
    match op {
        BinaryOperator::Is => {
            for other in 0..arity {
                if other != vb {
                    changed |= t.eliminate(
                        a,
                        va,
                        b,
                        other,
                        ReasonKind::Confirmation,
                        format!("{cat1}:{val1} is {cat2}:{val2}, eliminating the rest"),
                    );
                }
            }
            for other in 0..arity {
                if other != va {
                    changed |= t.eliminate(
                        a,
                        other,
                        b,
                        vb,
                        ReasonKind::Confirmation,
                        format!("{cat2}:{val2} is {cat1}:{val1}, eliminating the rest"),
                    );
                }
            }
        }
        BinaryOperator::IsNot => {
            changed |= t.eliminate(
                a,
                va,
                b,
                vb,
                ReasonKind::Elimination,
                format!("{cat1}:{val1} is not {cat2}:{val2}"),
            );
        }
    }
    Ok(changed)
}

fn direct_ordinal(
    t: &mut Tracker,
    categories: &CategorySet,
    item1: &ItemRef,
    item2: &ItemRef,
    ordinal_cat: &str,
    op: OrdinalOperator,
) -> Result<bool, SolveError> {
    let (c1, v1) = resolve(categories, item1)?;
    let (c2, v2) = resolve(categories, item2)?;
    let oc = cat_idx(categories, ordinal_cat)?;
    let ord = cat_obj(categories, ordinal_cat)?;
    let compatible = move |p1: i64, p2: i64| match op {
        OrdinalOperator::Lt => p1 < p2,
        OrdinalOperator::Gt => p1 > p2,
        OrdinalOperator::NotLt => p1 >= p2,
        OrdinalOperator::NotGt => p1 <= p2,
    };
    Ok(revise_positional_pair(
        t,
        categories.arity(),
        c1,
        v1,
        oc,
        ord,
        c2,
        v2,
        oc,
        ord,
        compatible,
    ))
}

fn direct_superlative(
    t: &mut Tracker,
    categories: &CategorySet,
    target: &ItemRef,
    ordinal_cat: &str,
    op: SuperlativeOperator,
) -> Result<bool, SolveError> {
    let (tc, tv) = resolve(categories, target)?;
    let oc = cat_idx(categories, ordinal_cat)?;
    let ord = cat_obj(categories, ordinal_cat)?;
    let arity = categories.arity();
    let last = arity - 1;
    let mut changed = false;
    for ov in 0..arity {
        if t.grid().is_possible(tc, tv, oc, ov) {
            let Some(p) = rank_position(ord, ov) else {
                continue;
            };
            let keep = match op {
                SuperlativeOperator::Min => p == 0,
                SuperlativeOperator::Max => p == last,
                SuperlativeOperator::NotMin => p != 0,
                SuperlativeOperator::NotMax => p != last,
            };
            if !keep {
                changed |= t.eliminate(
                    tc,
                    tv,
                    oc,
                    ov,
                    ReasonKind::Elimination,
                    format!("superlative rules out rank {p}"),
                );
            }
        }
    }
    Ok(changed)
}

fn direct_unary(
    t: &mut Tracker,
    categories: &CategorySet,
    target: &ItemRef,
    ordinal_cat: &str,
    filter: UnaryFilter,
) -> Result<bool, SolveError> {
    let (tc, tv) = resolve(categories, target)?;
    let oc = cat_idx(categories, ordinal_cat)?;
    let ord = cat_obj(categories, ordinal_cat)?;
    let arity = categories.arity();
    let mut changed = false;
    for ov in 0..arity {
        if t.grid().is_possible(tc, tv, oc, ov) {
            let Some(rank) = ord.rank_of(ov) else {
                continue;
            };
            let is_even = rank.rem_euclid(2) == 0;
            let keep = match filter {
                UnaryFilter::IsEven => is_even,
                UnaryFilter::IsOdd => !is_even,
            };
            if !keep {
                changed |= t.eliminate(
                    tc,
                    tv,
                    oc,
                    ov,
                    ReasonKind::Elimination,
                    "parity filter excludes this value",
                );
            }
        }
    }
    Ok(changed)
}

fn direct_adjacency(
    t: &mut Tracker,
    categories: &CategorySet,
    item1: &ItemRef,
    item2: &ItemRef,
    ordinal_cat: &str,
) -> Result<bool, SolveError> {
    let (c1, v1) = resolve(categories, item1)?;
    let (c2, v2) = resolve(categories, item2)?;
    let oc = cat_idx(categories, ordinal_cat)?;
    let ord = cat_obj(categories, ordinal_cat)?;
    Ok(revise_positional_pair(
        t,
        categories.arity(),
        c1,
        v1,
        oc,
        ord,
        c2,
        v2,
        oc,
        ord,
        |p1, p2| (p1 - p2).abs() == 1,
    ))
}

fn direct_between(
    t: &mut Tracker,
    categories: &CategorySet,
    target: &ItemRef,
    lower: &ItemRef,
    upper: &ItemRef,
    ordinal_cat: &str,
) -> Result<bool, SolveError> {
    let (tc, tv) = resolve(categories, target)?;
    let (lc, lv) = resolve(categories, lower)?;
    let (uc, uv) = resolve(categories, upper)?;
    let oc = cat_idx(categories, ordinal_cat)?;
    let ord = cat_obj(categories, ordinal_cat)?;
    let arity = categories.arity();
    let mut changed = false;

    for ov in 0..arity {
        if t.grid().is_possible(tc, tv, oc, ov) {
            let Some(pt) = rank_position(ord, ov).map(|p| p as i64) else {
                continue;
            };
            let ls = possible_positions(t.grid(), ord, oc, lc, lv, arity);
            let us = possible_positions(t.grid(), ord, oc, uc, uv, arity);
            let supported = ls
                .iter()
                .any(|&pl| us.iter().any(|&pu| (pl < pt && pt < pu) || (pu < pt && pt < pl)));
            if !supported {
                changed |= t.eliminate(
                    tc,
                    tv,
                    oc,
                    ov,
                    ReasonKind::Elimination,
                    "no bracketing pair remains for the target",
                );
            }
        }
    }
    for ov in 0..arity {
        if t.grid().is_possible(lc, lv, oc, ov) {
            let Some(pl) = rank_position(ord, ov).map(|p| p as i64) else {
                continue;
            };
            let ts = possible_positions(t.grid(), ord, oc, tc, tv, arity);
            let us = possible_positions(t.grid(), ord, oc, uc, uv, arity);
            let supported = ts
                .iter()
                .any(|&pt| us.iter().any(|&pu| (pl < pt && pt < pu) || (pu < pt && pt < pl)));
            if !supported {
                changed |= t.eliminate(
                    lc,
                    lv,
                    oc,
                    ov,
                    ReasonKind::Elimination,
                    "cannot bracket the target from below",
                );
            }
        }
    }
    for ov in 0..arity {
        if t.grid().is_possible(uc, uv, oc, ov) {
            let Some(pu) = rank_position(ord, ov).map(|p| p as i64) else {
                continue;
            };
            let ts = possible_positions(t.grid(), ord, oc, tc, tv, arity);
            let ls = possible_positions(t.grid(), ord, oc, lc, lv, arity);
            let supported = ts
                .iter()
                .any(|&pt| ls.iter().any(|&pl| (pl < pt && pt < pu) || (pu < pt && pt < pl)));
            if !supported {
                changed |= t.eliminate(
                    uc,
                    uv,
                    oc,
                    ov,
                    ReasonKind::Elimination,
                    "cannot bracket the target from above",
                );
            }
        }
    }
    Ok(changed)
}

fn direct_arithmetic(
    t: &mut Tracker,
    categories: &CategorySet,
    item1: &ItemRef,
    item2: &ItemRef,
    item3: &ItemRef,
    item4: &ItemRef,
    ordinal_cat: &str,
) -> Result<bool, SolveError> {
    let items = [
        resolve(categories, item1)?,
        resolve(categories, item2)?,
        resolve(categories, item3)?,
        resolve(categories, item4)?,
    ];
    let oc = cat_idx(categories, ordinal_cat)?;
    let ord = cat_obj(categories, ordinal_cat)?;
    let arity = categories.arity();
    let domains: Vec<Vec<i64>> = items
        .iter()
        .map(|&(c, v)| possible_positions(t.grid(), ord, oc, c, v, arity))
        .collect();

    let mut changed = false;
    for slot in 0..4 {
        let (cat, val) = items[slot];
        for ov in 0..arity {
            if !t.grid().is_possible(cat, val, oc, ov) {
                continue;
            }
            let Some(p) = rank_position(ord, ov).map(|p| p as i64) else {
                continue;
            };
            let supported = arithmetic_supported(slot, p, &domains);
            if !supported {
                changed |= t.eliminate(
                    cat,
                    val,
                    oc,
                    ov,
                    ReasonKind::Elimination,
                    "no assignment of the other items satisfies the difference equation",
                );
            }
        }
    }
    Ok(changed)
}

/// `p1 - p2 == p3 - p4`. `slot` identifies which item's rank is fixed to
/// `value`; the other three ranges are searched for a satisfying triple.
fn arithmetic_supported(slot: usize, value: i64, domains: &[Vec<i64>]) -> bool {
    let mut p = [0i64; 4];
    let others: Vec<usize> = (0..4).filter(|&i| i != slot).collect();
    p[slot] = value;
    for &a in &domains[others[0]] {
        p[others[0]] = a;
        for &b in &domains[others[1]] {
            p[others[1]] = b;
            for &c in &domains[others[2]] {
                p[others[2]] = c;
                if p[0] - p[1] == p[2] - p[3] {
                    return true;
                }
            }
        }
    }
    false
}

fn virtual_value(ordinal: &Category, value_index: usize, offset: i64, arity: usize) -> Option<usize> {
    let pos = rank_position(ordinal, value_index)? as i64 + offset;
    if pos < 0 || pos as usize >= arity {
        return None;
    }
    Some(ordinal.ordinal_order()[pos as usize])
}

#[allow(clippy::too_many_arguments)]
fn cross_ordinal_compatible(
    grid: &Grid,
    ord1: &Category,
    o1: usize,
    offset1: i64,
    ord2: &Category,
    o2: usize,
    offset2: i64,
    op: CrossOrdinalOperator,
    arity: usize,
    ov1: usize,
    ov2: usize,
) -> bool {
    let v1 = virtual_value(ord1, ov1, offset1, arity);
    let v2 = virtual_value(ord2, ov2, offset2, arity);
    match (v1, v2) {
        (Some(a), Some(b)) => match op {
            CrossOrdinalOperator::Match => grid.is_possible(o1, a, o2, b),
            CrossOrdinalOperator::NotMatch => grid.determined(o1, a, o2) != Some(b),
        },
        _ => matches!(op, CrossOrdinalOperator::NotMatch),
    }
}

#[allow(clippy::too_many_arguments)]
fn direct_cross_ordinal(
    t: &mut Tracker,
    categories: &CategorySet,
    item1: &ItemRef,
    ordinal1: &str,
    offset1: i64,
    item2: &ItemRef,
    ordinal2: &str,
    offset2: i64,
    op: CrossOrdinalOperator,
) -> Result<bool, SolveError> {
    let (c1, v1) = resolve(categories, item1)?;
    let (c2, v2) = resolve(categories, item2)?;
    let o1 = cat_idx(categories, ordinal1)?;
    let o2 = cat_idx(categories, ordinal2)?;
    let ord1 = cat_obj(categories, ordinal1)?;
    let ord2 = cat_obj(categories, ordinal2)?;
    let arity = categories.arity();

    let mut changed = false;
    for ov1 in 0..arity {
        if t.grid().is_possible(c1, v1, o1, ov1) {
            let supported = (0..arity).any(|ov2| {
                t.grid().is_possible(c2, v2, o2, ov2)
                    && cross_ordinal_compatible(
                        t.grid(),
                        ord1,
                        o1,
                        offset1,
                        ord2,
                        o2,
                        offset2,
                        op,
                        arity,
                        ov1,
                        ov2,
                    )
            });
            if !supported {
                changed |= t.eliminate(
                    c1,
                    v1,
                    o1,
                    ov1,
                    ReasonKind::Elimination,
                    "no cross-ordinal partner remains",
                );
            }
        }
    }
    for ov2 in 0..arity {
        if t.grid().is_possible(c2, v2, o2, ov2) {
            let supported = (0..arity).any(|ov1| {
                t.grid().is_possible(c1, v1, o1, ov1)
                    && cross_ordinal_compatible(
                        t.grid(),
                        ord1,
                        o1,
                        offset1,
                        ord2,
                        o2,
                        offset2,
                        op,
                        arity,
                        ov1,
                        ov2,
                    )
            });
            if !supported {
                changed |= t.eliminate(
                    c2,
                    v2,
                    o2,
                    ov2,
                    ReasonKind::Elimination,
                    "no cross-ordinal partner remains",
                );
            }
        }
    }
    Ok(changed)
}

fn direct_elimination(t: &mut Tracker, categories: &CategorySet, clue: &Clue) -> Result<bool, SolveError> {
    match clue {
        Clue::Binary {
            cat1,
            val1,
            cat2,
            val2,
            op,
        } => direct_binary(t, categories, cat1, val1, cat2, val2, *op),
        Clue::Ordinal {
            item1,
            item2,
            ordinal_cat,
            op,
        } => direct_ordinal(t, categories, item1, item2, ordinal_cat, *op),
        Clue::Superlative {
            target,
            ordinal_cat,
            op,
        } => direct_superlative(t, categories, target, ordinal_cat, *op),
        Clue::Unary {
            target,
            ordinal_cat,
            filter,
        } => direct_unary(t, categories, target, ordinal_cat, *filter),
        Clue::CrossOrdinal {
            item1,
            ordinal1,
            offset1,
            item2,
            ordinal2,
            offset2,
            op,
        } => direct_cross_ordinal(
            t, categories, item1, ordinal1, *offset1, item2, ordinal2, *offset2, *op,
        ),
        Clue::Adjacency {
            item1,
            item2,
            ordinal_cat,
        } => direct_adjacency(t, categories, item1, item2, ordinal_cat),
        Clue::Between {
            target,
            lower,
            upper,
            ordinal_cat,
        } => direct_between(t, categories, target, lower, upper, ordinal_cat),
        Clue::Arithmetic {
            item1,
            item2,
            item3,
            item4,
            ordinal_cat,
        } => direct_arithmetic(t, categories, item1, item2, item3, item4, ordinal_cat),
        Clue::Or { .. } => unreachable!("disjunctions are handled by apply_disjunction"),
    }
}

/// Rule 2 + rule 3: whenever a row (or, by symmetry, a column) settles on a
/// single survivor, that confirmation propagates into every other category.
fn apply_uniqueness(t: &mut Tracker, categories: &CategorySet) -> bool {
    let arity = categories.arity();
    let num_categories = categories.categories().len();
    let mut changed = false;
    for a in 0..num_categories {
        for va in 0..arity {
            for b in 0..num_categories {
                if a == b {
                    continue;
                }
                if let Some(vb) = t.grid().determined(a, va, b) {
                    for c in 0..num_categories {
                        if c == a || c == b {
                            continue;
                        }
                        for vc in 0..arity {
                            let keep_via_a = t.grid().is_possible(a, va, c, vc);
                            let keep_via_b = t.grid().is_possible(b, vb, c, vc);
                            if keep_via_a && !keep_via_b {
                                changed |= t.eliminate(
                                    a,
                                    va,
                                    c,
                                    vc,
                                    ReasonKind::Uniqueness,
                                    "row confirmation rules out an incompatible third category value",
                                );
                            } else if keep_via_b && !keep_via_a {
                                changed |= t.eliminate(
                                    b,
                                    vb,
                                    c,
                                    vc,
                                    ReasonKind::Uniqueness,
                                    "row confirmation rules out an incompatible third category value",
                                );
                            }
                        }
                    }
                }
            }
        }
    }
    changed
}

/// Rule 4: if `(a,va)` and `(b,vb)` are both determined against a shared
/// anchor, the link between them must itself be determined.
fn apply_transitivity(t: &mut Tracker, categories: &CategorySet) -> bool {
    let arity = categories.arity();
    let num_categories = categories.categories().len();
    let mut changed = false;
    for a in 0..num_categories {
        for b in (a + 1)..num_categories {
            for va in 0..arity {
                for vb in 0..arity {
                    if !t.grid().is_possible(a, va, b, vb) {
                        continue;
                    }
                    for c in 0..num_categories {
                        if c == a || c == b {
                            continue;
                        }
                        let da = t.grid().determined(a, va, c);
                        let db = t.grid().determined(b, vb, c);
                        if let (Some(dac), Some(dbc)) = (da, db) {
                            if dac != dbc {
                                changed |= t.eliminate(
                                    a,
                                    va,
                                    b,
                                    vb,
                                    ReasonKind::Transitivity,
                                    "endpoints disagree on a shared third category",
                                );
                            }
                        }
                    }
                }
            }
        }
    }
    changed
}

fn apply_elementary(grid: &mut Grid, categories: &CategorySet, clue: &Clue) -> Result<ProofStep, SolveError> {
    let mut t = Tracker {
        grid,
        updates: 0,
        reasons: Vec::new(),
    };
    loop {
        let mut changed = direct_elimination(&mut t, categories, clue)?;
        changed |= apply_uniqueness(&mut t, categories);
        changed |= apply_transitivity(&mut t, categories);
        if !changed {
            break;
        }
    }
    if t.grid().is_inconsistent() {
        return Err(SolveError::Inconsistent);
    }
    let percent_complete = t.grid().percent_complete();
    Ok(ProofStep {
        clue: clue.clone(),
        updates: t.updates,
        reasons: t.reasons,
        percent_complete,
    })
}

fn apply_disjunction(
    grid: &mut Grid,
    categories: &CategorySet,
    clue_a: &Clue,
    clue_b: &Clue,
) -> Result<ProofStep, SolveError> {
    let mut scratch_a = grid.clone();
    let mut scratch_b = grid.clone();
    match apply_clue(&mut scratch_a, categories, clue_a) {
        Ok(_) | Err(SolveError::Inconsistent) => {}
        Err(e) => return Err(e),
    }
    match apply_clue(&mut scratch_b, categories, clue_b) {
        Ok(_) | Err(SolveError::Inconsistent) => {}
        Err(e) => return Err(e),
    }

    let arity = categories.arity();
    let num_categories = categories.categories().len();
    let mut t = Tracker {
        grid,
        updates: 0,
        reasons: Vec::new(),
    };
    for a in 0..num_categories {
        for b in (a + 1)..num_categories {
            for va in 0..arity {
                for vb in 0..arity {
                    if t.grid().is_possible(a, va, b, vb)
                        && !scratch_a.is_possible(a, va, b, vb)
                        && !scratch_b.is_possible(a, va, b, vb)
                    {
                        t.eliminate(
                            a,
                            va,
                            b,
                            vb,
                            ReasonKind::Disjunction,
                            "impossible under both disjunction branches",
                        );
                    }
                }
            }
        }
    }
    if t.grid().is_inconsistent() {
        return Err(SolveError::Inconsistent);
    }
    let percent_complete = t.grid().percent_complete();
    Ok(ProofStep {
        clue: Clue::Or {
            clue_a: Box::new(clue_a.clone()),
            clue_b: Box::new(clue_b.clone()),
        },
        updates: t.updates,
        reasons: t.reasons,
        percent_complete,
    })
}

/// Mutates `grid` by running the clue's deduction rules to a fixed point.
/// Returns the decorated [`ProofStep`], or `SolveError::Inconsistent` if the
/// clue drives some row to zero remaining possibilities -- the grid is left
/// in its (unusable) post-elimination state; callers that need transactional
/// semantics must apply to a clone and discard it on error.
#[cfg_attr(feature = "tracing", instrument(skip(grid, categories)))]
pub fn apply_clue(grid: &mut Grid, categories: &CategorySet, clue: &Clue) -> Result<ProofStep, SolveError> {
    let step = match clue {
        Clue::Or { clue_a, clue_b } => apply_disjunction(grid, categories, clue_a, clue_b),
        _ => apply_elementary(grid, categories, clue),
    };
    if let Ok(ref step) = step {
        trace!(updates = step.updates, percent_complete = step.percent_complete, "applied clue");
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use zebra_core::{Category, CategoryKind, CategoryValue};

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
    fn binary_is_determines_the_pair() {
        let categories = binary_categories();
        let mut grid = Grid::blank(2, 2);
        let clue = Clue::Binary {
            cat1: "A".into(),
            val1: "a1".into(),
            cat2: "B".into(),
            val2: "b1".into(),
            op: BinaryOperator::Is,
        };
        let step = apply_clue(&mut grid, &categories, &clue).unwrap();
        assert!(step.updates > 0);
        assert_eq!(grid.determined(0, 0, 1), Some(0));
        assert_eq!(grid.determined(0, 1, 1), Some(1));
    }

    #[test]
    fn binary_is_not_eliminates_one_pair_only() {
        let categories = binary_categories();
        let mut grid = Grid::blank(2, 2);
        let clue = Clue::Binary {
            cat1: "A".into(),
            val1: "a1".into(),
            cat2: "B".into(),
            val2: "b1".into(),
            op: BinaryOperator::IsNot,
        };
        let step = apply_clue(&mut grid, &categories, &clue).unwrap();
        assert_eq!(step.updates, 1);
        assert!(!grid.is_possible(0, 0, 1, 0));
        assert!(grid.is_possible(0, 0, 1, 1));
    }

    #[test]
    fn inconsistent_binary_pair_is_rejected() {
        let categories = binary_categories();
        let mut grid = Grid::blank(2, 2);
        let force_a1_b1 = Clue::Binary {
            cat1: "A".into(),
            val1: "a1".into(),
            cat2: "B".into(),
            val2: "b1".into(),
            op: BinaryOperator::Is,
        };
        apply_clue(&mut grid, &categories, &force_a1_b1).unwrap();
        let contradiction = Clue::Binary {
            cat1: "A".into(),
            val1: "a1".into(),
            cat2: "B".into(),
            val2: "b2".into(),
            op: BinaryOperator::Is,
        };
        assert!(matches!(
            apply_clue(&mut grid, &categories, &contradiction),
            Err(SolveError::Inconsistent)
        ));
    }

    fn ordinal_categories() -> CategorySet {
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

    #[test]
    fn superlative_min_determines_position_zero() {
        let categories = ordinal_categories();
        let mut grid = Grid::blank(2, 3);
        let clue = Clue::Superlative {
            target: ItemRef::new("Person", "A"),
            ordinal_cat: "Gold".into(),
            op: SuperlativeOperator::Min,
        };
        let step = apply_clue(&mut grid, &categories, &clue).unwrap();
        assert!(step.updates > 0);
        assert_eq!(grid.determined(0, 0, 1), Some(0));
    }

    #[test]
    fn disjunction_only_eliminates_what_both_branches_rule_out() {
        let categories = ordinal_categories();
        let mut grid = Grid::blank(2, 3);
        let a_is_10 = Clue::Binary {
            cat1: "Person".into(),
            val1: "A".into(),
            cat2: "Gold".into(),
            val2: "10".into(),
            op: BinaryOperator::Is,
        };
        let b_is_10 = Clue::Binary {
            cat1: "Person".into(),
            val1: "B".into(),
            cat2: "Gold".into(),
            val2: "10".into(),
            op: BinaryOperator::Is,
        };
        let or_clue = Clue::disjunction(a_is_10, b_is_10).unwrap();
        let step = apply_clue(&mut grid, &categories, &or_clue).unwrap();
        // Both branches agree that C cannot be 10 -- that much should propagate.
        assert!(!grid.is_possible(0, 2, 1, 0));
        // Neither branch alone rules out A being 20, since only one of A/B is pinned to 10.
        assert!(grid.is_possible(0, 0, 1, 1));
        assert!(step.updates > 0);
    }
}
