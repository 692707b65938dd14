//! Boolean 1-UIP conflict analysis: walk the trail backward from the
//! point of contradiction, resolving away every variable assigned at
//! the conflict's own decision level until exactly one remains (the
//! first unique implication point), producing a resolvent clause and
//! the level to backjump to.
//!
//! Grounded directly on the teacher's `solver::conflict::handle_conflict`/
//! `conflict_analyze`: the `seen` set and `path_cnt` (`counter` here)
//! countdown, the backward walk over the trail skipping unflagged or
//! level-0 elements, and the final `learnt[0] = !p` convention are kept
//! almost verbatim. Two things are new, both absent from plain CDCL:
//! a conflict can originate from a theory plugin (`AssignReason::Semantic`)
//! rather than only a falsified clause, and the backward walk can run
//! into a decision (or an unresolvable theory explanation) before the
//! path count empties out — the "semantic blockade" case spec'd
//! alongside 1-UIP, handled by keeping the blocking literal in the
//! learnt clause instead of resolving through it and backing off to a
//! conservative `conflict_level - 1` backjump.

use crate::cdb::ClauseId;
use crate::plugins::bcp::BoolPlugin;
use crate::plugins::Plugin;
use crate::trail::{AssignReason, Trail};
use crate::types::{Lit, VarId, NULL_LIT};
use crate::var::VarDb;
use std::collections::HashSet;

/// The plugin id reserved for the Boolean engine. Theory plugins are
/// numbered from 1 in registration order, so an `AssignReason::Semantic(pid)`
/// with `pid >= 1` indexes `theory_plugins[pid - 1]`.
pub const BOOL_PLUGIN_ID: usize = 0;

pub struct ConflictOutcome {
    /// The learnt clause, first-UIP literal at index 0.
    pub resolvent: Vec<Lit>,
    pub backtrack_level: usize,
    /// `true` if the walk had to stop on a decision or an unresolvable
    /// semantic explanation before the path count reached zero through
    /// ordinary resolution.
    pub semantic_blockade: bool,
}

/// The literals explaining the trail element at `vi`, already in
/// "clause form" (each literal in the list is false on the trail,
/// exactly as stored in the original falsified/propagating clause).
/// `lit` is the trail's own (true) literal for `vi`.
fn reason_literals(trail: &Trail, bool_plugin: &BoolPlugin, theory_plugins: &[Box<dyn Plugin>], vi: VarId, lit: Lit) -> Vec<Lit> {
    match trail.reason_of(vi) {
        Some(AssignReason::Implication(cid)) => bool_plugin
            .clauses
            .get(*cid)
            .lits
            .iter()
            .copied()
            .filter(|&l| l != lit)
            .collect(),
        Some(AssignReason::Semantic(pid)) => theory_plugins[pid - 1].explain(lit),
        Some(AssignReason::Decision) | None => Vec::new(),
    }
}

/// The literals of the clause (or theory explanation) that is
/// violated right now, per [`Trail::inconsistent_propagations`]'s
/// first entry — the seed the backward walk starts folding from.
fn conflict_seed(trail: &Trail, bool_plugin: &BoolPlugin, theory_plugins: &[Box<dyn Plugin>]) -> Vec<Lit> {
    let (trigger, reason) = trail
        .inconsistent_propagations()
        .first()
        .cloned()
        .expect("analyze_conflict called on a consistent trail");
    match reason {
        AssignReason::Implication(cid) => bool_plugin.clauses.get(cid).lits.clone(),
        AssignReason::Semantic(pid) => {
            let mut seed = vec![trigger.negate()];
            seed.extend(theory_plugins[pid - 1].explain(trigger));
            seed
        }
        AssignReason::Decision => {
            debug_assert!(false, "a decision can never be filed as a conflicting reason");
            vec![trigger.negate()]
        }
    }
}

/// Folds `lits` into the resolving clause the same way the teacher's
/// `conflict_analyze` does: anything already seen or stuck at level 0
/// is skipped, anything at the conflict's own level joins the
/// countdown, everything else joins the learnt clause outright. Kept
/// as a plain function (not a closure) so it borrows only `trail`,
/// not `var_db`/`bool_plugin` — those need a separate, *shared*
/// reborrow from `conflict_seed`/`reason_literals` later in the same
/// walk, which a long-lived mutable closure capture would rule out.
/// Variables it newly marks `seen` are appended to `bumped` so the
/// caller can apply the activity bump afterwards, once the walk (and
/// its shared borrows of `bool_plugin`) is done.
fn fold_in(trail: &Trail, conflict_level: usize, lits: &[Lit], seen: &mut HashSet<VarId>, counter: &mut usize, learnt: &mut Vec<Lit>, bumped: &mut Vec<VarId>) {
    for &q in lits {
        let vi = q.vi();
        if seen.contains(&vi) {
            continue;
        }
        let level = match trail.level_of(vi) {
            Some(l) => l,
            None => continue,
        };
        if level == 0 {
            continue;
        }
        seen.insert(vi);
        bumped.push(vi);
        if level == conflict_level {
            *counter += 1;
        } else {
            learnt.push(q);
        }
    }
}

pub fn analyze_conflict(
    trail: &Trail,
    var_db: &mut VarDb,
    bool_plugin: &mut BoolPlugin,
    theory_plugins: &mut [Box<dyn Plugin>],
    rescale_threshold: f64,
) -> ConflictOutcome {
    let conflict_level = trail.decision_level();
    let mut seen: HashSet<VarId> = HashSet::new();
    let mut counter = 0usize;
    let mut learnt: Vec<Lit> = vec![NULL_LIT];
    let mut semantic_blockade = false;
    let mut bumped: Vec<VarId> = Vec::new();

    let seed = conflict_seed(trail, bool_plugin, &*theory_plugins);
    fold_in(trail, conflict_level, &seed, &mut seen, &mut counter, &mut learnt, &mut bumped);

    let mut trail_idx = trail.size();
    let uip_lit = loop {
        let elem = loop {
            debug_assert!(trail_idx > 0, "ran off the trail without resolving the conflict");
            trail_idx -= 1;
            let e = &trail.stack()[trail_idx];
            if seen.contains(&e.lit.vi()) {
                break e;
            }
        };
        let p = elem.lit;
        seen.remove(&p.vi());
        counter -= 1;
        if counter == 0 {
            break p;
        }
        let antecedents = reason_literals(trail, bool_plugin, &*theory_plugins, p.vi(), p);
        if antecedents.is_empty() {
            // A decision, or a theory explanation with nothing further
            // to split on: `p` cannot be resolved away, so it stays in
            // the clause as a literal instead.
            semantic_blockade = true;
            learnt.push(p.negate());
        } else {
            fold_in(trail, conflict_level, &antecedents, &mut seen, &mut counter, &mut learnt, &mut bumped);
        }
    };
    learnt[0] = uip_lit.negate();

    // Applied after the walk, not inside `fold_in`: every variable and
    // clause the walk touched gets its activity bumped here, and (spec
    // §4.6 "variable scoring") every theory plugin gets first refusal
    // at bumping its own per-variable score for the same ids, since a
    // bumped variable might belong to its own decision heuristic
    // rather than the Boolean one's.
    for vi in bumped {
        var_db.bump_activity(vi, rescale_threshold);
        if let Some(AssignReason::Implication(cid)) = trail.reason_of(vi) {
            bool_plugin.clauses.bump_activity(*cid, rescale_threshold);
        }
        bool_plugin.bump_variable(vi, rescale_threshold);
        for plugin in theory_plugins.iter_mut() {
            plugin.bump_variable(vi, rescale_threshold);
        }
    }

    let backtrack_level = if semantic_blockade {
        conflict_level.saturating_sub(1)
    } else if learnt.len() > 1 {
        let mut max_i = 1;
        let mut max_level = trail.level_of(learnt[1].vi()).unwrap_or(0);
        for i in 2..learnt.len() {
            let l = trail.level_of(learnt[i].vi()).unwrap_or(0);
            if l > max_level {
                max_level = l;
                max_i = i;
            }
        }
        learnt.swap(1, max_i);
        max_level
    } else {
        0
    };

    ConflictOutcome {
        resolvent: learnt,
        backtrack_level,
        semantic_blockade,
    }
}

/// Registers the resolvent with the clause farm. A unit resolvent
/// needs no watch list — it is asserted directly by the caller instead
/// of going through `commit`, mirroring `BoolPlugin::add_clause`'s own
/// unit-clause short-circuit.
pub fn commit_resolvent(bool_plugin: &mut BoolPlugin, resolvent: Vec<Lit>, rank: usize) -> Option<ClauseId> {
    use crate::cdb::RuleId;
    if resolvent.len() <= 1 {
        return None;
    }
    Some(bool_plugin.clauses.commit(resolvent, rank, true, RuleId::Resolution))
}
