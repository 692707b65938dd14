//! Clause-farm garbage collection: mark every clause still serving as
//! a trail reason or named reachable by a plugin, sweep the rest, and
//! propagate the resulting id remap back into the trail and plugins.
//!
//! Grounded on the teacher's two-phase `gc`/`eliminate` reachability
//! pass reduced to clauses only: variable compaction
//! (`VarDb::perform_gc`) is left as tested, standalone infrastructure
//! and is deliberately not wired into this automatic path, since
//! nothing here ever retires a whole variable the way a long-running
//! incremental session eventually would.

use crate::cdb::{ClauseId, RuleId};
use crate::plugins::bcp::BoolPlugin;
use crate::plugins::Plugin;
use crate::trail::{AssignReason, Trail};
use std::collections::HashSet;

/// Runs a clause-farm GC: every clause an `Implication` reason still
/// points to, every clause a plugin's `gc_mark` names, and every
/// input clause (never collected, regardless of activity) survive.
/// Everything else not already flagged dead is dropped.
pub fn collect_garbage(trail: &mut Trail, bool_plugin: &mut BoolPlugin, theory_plugins: &mut [Box<dyn Plugin>]) {
    let mut keep_ids: HashSet<ClauseId> = HashSet::new();

    for i in 0..bool_plugin.clauses.len() {
        let id = ClauseId(i);
        let clause = bool_plugin.clauses.get(id);
        // `reduce` already flagged the lower-activity half of the
        // learnt set `DEAD`; a clause that survived that ranking (or
        // was never subject to it, i.e. an input clause, or hasn't
        // been ranked yet because it was just learnt) stays live here
        // too. Without this, GC would erase reduce's ranking entirely
        // by dropping every learnt clause except the handful currently
        // cited as a trail reason.
        if clause.rule_id == RuleId::Input || !clause.is_dead() {
            keep_ids.insert(id);
        }
    }
    for elem in trail.stack() {
        if let AssignReason::Implication(cid) = elem.reason {
            keep_ids.insert(cid);
        }
    }
    {
        let mut keep_clause = |cid: ClauseId| {
            keep_ids.insert(cid);
        };
        let mut keep_var = |_vi| {};
        bool_plugin.gc_mark(&mut keep_clause, &mut keep_var);
        for plugin in theory_plugins.iter() {
            plugin.gc_mark(&mut keep_clause, &mut keep_var);
        }
    }

    let info = bool_plugin.clauses.perform_gc(|id| keep_ids.contains(&id));
    trail.relocate_clause_reasons(&info.remap);
    bool_plugin.gc_relocate(&info.remap);
    for plugin in theory_plugins.iter_mut() {
        plugin.gc_relocate(&info.remap);
    }
}
