//! The plugin fabric: a small trait every reasoning engine implements,
//! a capability bitmask replacing virtual-dispatch polymorphism, and a
//! registry mapping string ids to factories.
//!
//! Grounded on the `TheoryModule`/`Backtrack` composition pattern in
//! the modular-SMT reference example (theories as trait objects driven
//! in a round-robin fixpoint by the top-level solver loop) and on the
//! original CVC4 plugin header's tagged-capability design (`feature
//! set` replacing a class hierarchy of optional virtual methods).

pub mod ackermann;
pub mod bcp;
pub mod cnf;
pub mod fm;
pub mod registry;

use crate::cdb::ClauseId;
use crate::trail::Trail;
use crate::types::{Lit, VarId};
use std::any::Any;

bitflags! {
    /// What a plugin can be asked to do. The solver loop only calls
    /// `propagate`/`decide` on plugins advertising the matching bit,
    /// so a plugin with no decision procedure (the Ackermann stub)
    /// never has to implement a meaningful `decide`.
    pub struct Features: u8 {
        const CAN_PROPAGATE = 0b0000_0001;
        const CAN_DECIDE    = 0b0000_0010;
    }
}

/// One plugin's view of the fabric: the trail to propagate into/read
/// from, plus its own plugin id (used to stamp `AssignReason::Semantic`
/// so the solver knows who to ask for an explanation later).
pub struct PluginContext<'a> {
    pub trail: &'a mut Trail,
    pub plugin_id: usize,
}

/// A reasoning engine plugged into the MCSAT loop. `feature_set`
/// determines which of `propagate`/`decide` the loop will ever call;
/// every plugin still implements `notify_new_variable` and the GC
/// hooks since those run regardless of capability.
///
/// `Plugin: Any` lets the solver downcast the generic `Vec<Box<dyn
/// Plugin>>` back to a concrete type (`FmPlugin::register_atom` isn't
/// part of the trait — only assertion intake needs it) via
/// [`downcast_ref`]/[`downcast_mut`] below, the same trick `aries` uses
/// to keep a homogeneous theory-module vector while still reaching
/// theory-specific entry points.
pub trait Plugin: Any {
    fn feature_set(&self) -> Features;

    /// Runs to fixpoint, pushing every propagation it can currently
    /// justify onto `ctx.trail` (via a [`crate::trail::PropagationToken`]
    /// the plugin builds from `ctx.trail` itself, tagged with its own
    /// `ctx.plugin_id`). Returns `true` if it made any progress
    /// (another plugin may now be able to do more, so the loop
    /// re-polls until a full round makes no progress).
    fn propagate(&mut self, ctx: &mut PluginContext) -> bool;

    /// Proposes a decision when asked (only called if idle-no-conflict
    /// and no higher-priority plugin decided first). Returns `true` if
    /// it made a decision.
    fn decide(&mut self, ctx: &mut PluginContext) -> bool;

    /// Explains a semantic propagation this plugin made, as a list of
    /// literals whose disjunction is implied (the propagated literal's
    /// negation is implicitly included by the caller, matching the
    /// teacher's clause-learning convention of not storing the unit
    /// literal itself in its own antecedent list).
    fn explain(&self, propagated: Lit) -> Vec<Lit>;

    fn notify_new_variable(&mut self, _vi: VarId) {}

    fn notify_backjump(&mut self, _level: usize) {}

    /// Called once a restart has popped the trail back to level 0,
    /// distinct from an ordinary `notify_backjump(0)`: a plugin that
    /// keeps its own restart-sensitive heuristics (none of the
    /// concrete plugins here do) can tell the two apart by which hook
    /// fired.
    fn notify_restart(&mut self) {}

    /// Called once per conflict, before analysis begins, purely as an
    /// observation hook (a plugin may only watch, never act here).
    fn notify_conflict(&mut self) {}

    /// Called once the solver has committed the resolvent of a
    /// conflict to the clause farm, naming the clause it produced.
    fn notify_conflict_resolution(&mut self, _cid: ClauseId) {}

    /// Bumps whatever per-variable score this plugin keeps for its own
    /// decision ordering (spec §4.6 "Variable scoring"), called by
    /// conflict analysis for every variable it resolves through
    /// regardless of which plugin actually owns that variable — a
    /// plugin with no such scoring (or whose variable set doesn't
    /// include `vi`) just ignores the call via this default.
    fn bump_variable(&mut self, _vi: VarId, _rescale_threshold: f64) {}

    /// Marks clauses/variables this plugin still needs as reachable,
    /// ahead of a clause-farm or variable-database GC.
    fn gc_mark(&self, _keep_clause: &mut dyn FnMut(ClauseId), _keep_var: &mut dyn FnMut(VarId)) {}

    /// Applies the id remapping a GC produced.
    fn gc_relocate(&mut self, _clause_remap: &std::collections::HashMap<ClauseId, ClauseId>) {}

    /// Like [`Plugin::decide`], but given a list of literals the caller
    /// would prefer this plugin pick among first — used when the
    /// solver re-decides after a coalesced backtrack request handed it
    /// a clause that isn't yet unit. The default ignores the hints and
    /// falls back to a plain decision.
    fn decide_with_hints(&mut self, ctx: &mut PluginContext, _hints: &[Lit]) -> bool {
        self.decide(ctx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Plugin {
    pub fn downcast_ref<T: Plugin>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Plugin>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
