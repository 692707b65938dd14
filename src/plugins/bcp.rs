//! The Boolean propagation plugin: two-watched-literal BCP over its
//! own clause farm, plus unit-clause intake from the CNF plugin.
//!
//! Grounded on the teacher's `AssignStack::propagate` (watch-list walk
//! with blocker-literal caching to skip a clause without touching it
//! when the cached blocker is already true) and `cdb::watch`'s
//! `Watch`/`WatchDBIF`, rewritten against this crate's `Trail`/
//! `PropagationToken` instead of the teacher's raw `*mut` watcher
//! slices.

use crate::cdb::{ClauseDb, ClauseId, RuleId, Watch, WatchDBIF};
use crate::trail::{AssignReason, ElementKind, PropagationMode, PropagationToken, Trail};
use crate::types::VarId;
use crate::types::Lit;
use std::collections::HashMap;

use super::{Features, Plugin, PluginContext};

pub struct BoolPlugin {
    pub clauses: ClauseDb,
    /// Every variable id this plugin is responsible for deciding,
    /// in interning order. The variable database is one shared arena
    /// across every type index (spec §3: "partitioned by type index",
    /// not "one contiguous id range per type"), so a Boolean atom can
    /// be interned between two arithmetic term variables; this plugin
    /// must not assume its own variables form a prefix of `VarId`
    /// space and tracks them explicitly instead, appended to by
    /// `Solver::new_bool_variable` as each one is created.
    pub bool_vars: Vec<VarId>,
    /// VSIDS-style per-variable score, bumped by conflict analysis
    /// (`Plugin::bump_variable`) and consulted by `decide` so the
    /// branching order tracks which variables actually show up in
    /// recent conflicts, mirroring the teacher's own `VarIdHeap`.
    activity: HashMap<VarId, f64>,
    var_inc: f64,
}

impl Default for BoolPlugin {
    fn default() -> BoolPlugin {
        BoolPlugin {
            clauses: ClauseDb::new(),
            bool_vars: Vec::new(),
            activity: HashMap::new(),
            var_inc: 1.0,
        }
    }
}

impl BoolPlugin {
    pub fn new() -> BoolPlugin {
        BoolPlugin::default()
    }

    fn activity_of(&self, vi: VarId) -> f64 {
        self.activity.get(&vi).copied().unwrap_or(0.0)
    }

    /// Adds a clause directly (used by the CNF intake plugin and by
    /// conflict-driven clause learning). Unit clauses are asserted on
    /// the trail immediately rather than watched.
    pub fn add_clause(
        &mut self,
        trail: &mut Trail,
        lits: Vec<Lit>,
        learnt: bool,
        rank: usize,
        rule_id: RuleId,
    ) -> Option<ClauseId> {
        if lits.len() == 1 {
            let mut token = PropagationToken::new(trail, ElementKind::ClausalPropagation);
            token.propagate(lits[0], PropagationMode::Init);
            return None;
        }
        Some(self.clauses.commit(lits, rank, learnt, rule_id))
    }

    /// Runs one watch-list scan triggered by `true_lit` becoming true:
    /// every clause registered under this bucket watches `!true_lit`,
    /// which has just gone false. Each either already has its other
    /// watch satisfied, finds a fresh non-false literal to watch
    /// instead, or propagates/contradicts on its remaining watch.
    /// Mirrors the teacher's per-literal inner loop of `propagate`.
    fn propagate_literal(&mut self, trail: &mut Trail, true_lit: Lit) {
        let watches: Vec<Watch> = std::mem::take(self.clauses.watches_on_mut(true_lit));
        let mut kept = Vec::with_capacity(watches.len());
        for w in watches {
            if trail.is_true(w.blocker) {
                kept.push(w);
                continue;
            }
            let cid = w.c;
            let lits = self.clauses.get(cid).lits.clone();
            let this_watch_is_first = lits[0] == true_lit.negate();
            let other = if this_watch_is_first { lits[1] } else { lits[0] };

            if trail.is_true(other) {
                kept.push(Watch { blocker: other, c: cid });
                continue;
            }

            let replacement_idx = lits.iter().enumerate().skip(2).find(|(_, &l)| !trail.is_false(l)).map(|(i, _)| i);

            if let Some(i) = replacement_idx {
                let watch_slot = if this_watch_is_first { 0 } else { 1 };
                let mut new_lits = lits;
                new_lits.swap(watch_slot, i);
                let replacement = new_lits[watch_slot];
                self.clauses.get_mut(cid).lits = new_lits;
                self.clauses.watches_on_mut(replacement.negate()).register(other, cid);
            } else if trail.is_false(other) {
                trail.mark_inconsistent(other, AssignReason::Implication(cid));
                kept.push(Watch { blocker: other, c: cid });
            } else {
                let mut token = PropagationToken::new(trail, ElementKind::ClausalPropagation);
                token.propagate(other, PropagationMode::Normal(AssignReason::Implication(cid)));
                kept.push(Watch { blocker: other, c: cid });
            }
        }
        *self.clauses.watches_on_mut(true_lit) = kept;
    }
}

impl Plugin for BoolPlugin {
    fn feature_set(&self) -> Features {
        Features::CAN_PROPAGATE | Features::CAN_DECIDE
    }

    fn propagate(&mut self, ctx: &mut PluginContext) -> bool {
        // Re-scan from the whole trail rather than keeping a private
        // propagation-queue head: other plugins may also have pushed
        // assignments since our last call, and re-deriving "what's
        // falsified now" from the trail itself keeps this plugin
        // correct regardless of interleaving.
        let before = ctx.trail.size();
        // A clause watches `!x` under the bucket keyed by `x`, so the
        // scan triggers on the literal that just became *true*, not
        // its negation (that negation is computed inside
        // `propagate_literal` to recover the clause's own literal).
        let assigned: Vec<Lit> = ctx.trail.stack().iter().map(|e| e.lit).collect();
        for true_lit in assigned {
            if !ctx.trail.consistent() {
                break;
            }
            self.propagate_literal(ctx.trail, true_lit);
        }
        ctx.trail.size() != before
    }

    fn decide(&mut self, ctx: &mut PluginContext) -> bool {
        let mut best: Option<(VarId, f64)> = None;
        for &vi in &self.bool_vars {
            if ctx.trail.has_value(vi) {
                continue;
            }
            let score = self.activity_of(vi);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((vi, score));
            }
        }
        match best {
            Some((vi, _)) => {
                let mut token = crate::trail::DecisionToken::new(ctx.trail, ElementKind::BooleanDecision);
                token.decide(Lit::positive(vi));
                true
            }
            None => false,
        }
    }

    /// Prefers an unassigned variable named by `hints` — literals the
    /// caller resolved a conflict down to but couldn't assert directly
    /// (spec §4.5 step 8's recovery path) — deciding it with the
    /// hint's own polarity before falling back to the ordinary
    /// activity-ordered scan.
    fn decide_with_hints(&mut self, ctx: &mut PluginContext, hints: &[Lit]) -> bool {
        for &hint in hints {
            if !ctx.trail.has_value(hint.vi()) && self.bool_vars.contains(&hint.vi()) {
                let mut token = crate::trail::DecisionToken::new(ctx.trail, ElementKind::BooleanDecision);
                token.decide(hint);
                return true;
            }
        }
        self.decide(ctx)
    }

    fn explain(&self, _propagated: Lit) -> Vec<Lit> {
        // Boolean propagations explain themselves via the clause
        // stored in their `AssignReason::Implication`; the solver
        // reads the clause directly rather than asking this plugin.
        Vec::new()
    }

    fn gc_relocate(&mut self, _clause_remap: &std::collections::HashMap<ClauseId, ClauseId>) {}

    fn bump_variable(&mut self, vi: VarId, rescale_threshold: f64) {
        let new_score = self.activity_of(vi) + self.var_inc;
        self.activity.insert(vi, new_score);
        if new_score > rescale_threshold {
            let factor = 1.0 / rescale_threshold;
            for v in self.activity.values_mut() {
                *v *= factor;
            }
            self.var_inc *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::Trail;

    #[test]
    fn unit_clause_is_asserted_immediately() {
        let mut trail = Trail::new(2);
        let mut bp = BoolPlugin::new();
        bp.add_clause(&mut trail, vec![Lit::positive(1)], false, 0, RuleId::Input);
        assert!(trail.is_true(Lit::positive(1)));
    }

    #[test]
    fn two_literal_clause_propagates_when_one_literal_falsified() {
        let mut trail = Trail::new(2);
        let mut bp = BoolPlugin::new();
        bp.add_clause(&mut trail, vec![Lit::positive(1), Lit::positive(2)], false, 2, RuleId::Input);
        trail.new_decision_level();
        trail.push(ElementKind::BooleanDecision, Lit::negative(1), AssignReason::Decision);
        let progressed = {
            let mut ctx = PluginContext {
                trail: &mut trail,
                plugin_id: 0,
            };
            bp.propagate(&mut ctx)
        };
        assert!(progressed);
        assert!(trail.is_true(Lit::positive(2)));
    }
}
