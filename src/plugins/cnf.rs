//! Minimal CNF intake: accepts clauses of an already-ground formula
//! and hands them to the Boolean plugin's clause farm. Full
//! Tseitin/ITE-elimination rewriting of arbitrary formulas is an
//! external collaborator's job; this plugin only covers the in-scope
//! case of a formula that already arrived as a list of clauses.
//!
//! Grounded on the teacher's clause-loading path in
//! `solver::build::inject`/`inject_from_vec`, narrowed to the
//! already-ground case.

use crate::cdb::{ClauseId, RuleId};
use crate::trail::Trail;
use crate::types::Lit;

use super::bcp::BoolPlugin;
use super::{Features, Plugin, PluginContext};

/// Not itself a `Plugin` in the fixpoint sense (it never propagates or
/// decides after the assertions it was given are loaded); it exposes
/// `add_assertion` for the solver's assertion-intake API and otherwise
/// satisfies `Plugin` with an empty feature set so the fabric can still
/// address it uniformly for GC bookkeeping.
#[derive(Default)]
pub struct CnfPlugin;

impl CnfPlugin {
    /// Loads one ground clause (already in CNF, no further rewriting)
    /// into `bcp`'s farm.
    pub fn add_assertion(&mut self, bcp: &mut BoolPlugin, trail: &mut Trail, lits: Vec<Lit>) {
        if lits.is_empty() {
            trail.mark_inconsistent(crate::types::NULL_LIT, crate::trail::AssignReason::Decision);
            return;
        }
        bcp.add_clause(trail, lits, false, 0, RuleId::Input);
    }
}

impl Plugin for CnfPlugin {
    fn feature_set(&self) -> Features {
        Features::empty()
    }

    fn propagate(&mut self, _ctx: &mut PluginContext) -> bool {
        false
    }

    fn decide(&mut self, _ctx: &mut PluginContext) -> bool {
        false
    }

    fn explain(&self, _propagated: Lit) -> Vec<Lit> {
        Vec::new()
    }

    fn gc_relocate(&mut self, _clause_remap: &std::collections::HashMap<ClauseId, ClauseId>) {}
}
