//! The top-level MCSAT search loop: assertion intake, the
//! propagate/analyze/request/decide state machine, and the plugin
//! fabric wiring that ties `VarDb`/`Trail`/`ClauseDb` to the concrete
//! plugins.
//!
//! Grounded on the teacher's own `Solver::solve` driving loop
//! (propagate to fixpoint, handle a conflict via `handle_conflict`,
//! decide, repeat) and on `aries::ModularSMT::solve` for the
//! round-robin plugin fixpoint this crate generalizes the teacher's
//! Boolean-only loop into (`examples/other_examples/9ccfd190_plaans-aries__smt-src-modules.rs.rs`).
//!
//! `bool_plugin` is kept as its own field rather than folded into
//! `theory_plugins: Vec<Box<dyn Plugin>>`: conflict analysis needs to
//! bump clause activity on it (a mutable borrow) in the same breath as
//! calling `explain` on a theory plugin (an immutable borrow of a
//! different object), which a single homogeneous vector can't express
//! without an index-juggling workaround uglier than just giving the
//! Boolean engine its own field.

pub mod conflict;
pub mod decide;
pub mod gc;

use self::conflict::BOOL_PLUGIN_ID;
use crate::cdb::{ClauseId, RuleId};
use crate::config::Config;
use crate::error::{McSatError, Result};
use crate::plugins::ackermann::AckermannPlugin;
use crate::plugins::bcp::BoolPlugin;
use crate::plugins::cnf::CnfPlugin;
use crate::plugins::fm::constraint::LinearConstraint;
use crate::plugins::fm::FmPlugin;
use crate::plugins::registry::PluginRegistry;
use crate::plugins::{Features, Plugin, PluginContext};
use crate::restart::Ema2;
use crate::trail::{AssignReason, ElementKind, PropagationMode, PropagationToken, Trail};
use crate::types::{Lit, ModelValue, VarId, TYPE_BOOL, TYPE_INT, TYPE_REAL};
use crate::var::VarDb;

/// Counters published for an embedder to read, playing the role of
/// spec's external statistics registry (out of scope as a service;
/// kept here as plain fields, mirroring the teacher's own `SolverState`
/// counters narrowed to what this core tracks).
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    pub decisions: usize,
    pub conflicts: usize,
    pub restarts: usize,
    pub propagation_rounds: usize,
    pub clausal_propagations: usize,
    pub semantic_propagations: usize,
    pub gcs: usize,
}

/// The MCSAT search core. Owns every piece of solver state; plugins
/// hold no state of their own beyond what they need to answer
/// `propagate`/`decide`/`explain` (the trail and clause farm are
/// always borrowed in, never owned by a plugin).
pub struct Solver {
    config: Config,
    var_db: VarDb,
    trail: Trail,
    bool_plugin: BoolPlugin,
    cnf: CnfPlugin,
    theory_plugins: Vec<Box<dyn Plugin>>,
    fm_plugin_id: usize,
    #[allow(dead_code)]
    registry: PluginRegistry,
    restart_ema: Ema2,
    conflicts_since_reduce: usize,
    decision_hints: Vec<Lit>,
    interrupted: bool,
    stats: Stats,
}

impl Solver {
    pub fn new(config: Config) -> Result<Solver> {
        let mut registry = PluginRegistry::new();
        registry.register("fm", || Box::new(FmPlugin::new()) as Box<dyn Plugin>)?;
        registry.register("ackermann", || Box::new(AckermannPlugin::default()) as Box<dyn Plugin>)?;

        let fm = registry.create("fm")?.downcast_ref::<FmPlugin>().is_some();
        debug_assert!(fm, "fm factory must produce an FmPlugin");
        let fm_plugin = FmPlugin::new().with_int_pick_window(config.int_pick_window);
        let ackermann_plugin = registry.create("ackermann")?;

        Ok(Solver {
            restart_ema: Ema2::new(config.restart_asg_len, config.restart_lbd_len),
            config,
            var_db: VarDb::new(),
            trail: Trail::new(0),
            bool_plugin: BoolPlugin::new(),
            cnf: CnfPlugin::default(),
            theory_plugins: vec![Box::new(fm_plugin), ackermann_plugin],
            fm_plugin_id: 0,
            registry,
            conflicts_since_reduce: 0,
            decision_hints: Vec::new(),
            interrupted: false,
            stats: Stats::default(),
        })
    }

    fn fm_mut(&mut self) -> &mut FmPlugin {
        self.theory_plugins[self.fm_plugin_id]
            .downcast_mut::<FmPlugin>()
            .expect("fm_plugin_id must always name the FmPlugin slot")
    }

    /// Interns a fresh Boolean atom variable, growing the trail and
    /// notifying every theory plugin. Boolean atoms (plain variables
    /// and arithmetic-constraint proxies alike) may be freely
    /// interleaved with arithmetic term variables: the shared variable
    /// arena is partitioned by type index (spec §3), not by id range,
    /// so `BoolPlugin` tracks its own variable ids explicitly rather
    /// than assuming they form a contiguous prefix.
    pub fn new_bool_variable(&mut self, name: &str) -> VarId {
        let fresh = !self.var_db.has_variable(name);
        let vi = self.var_db.intern(name, TYPE_BOOL);
        self.trail.grow_to(vi);
        if fresh {
            self.bool_plugin.bool_vars.push(vi);
            self.notify_new_variable(vi);
        }
        vi
    }

    /// Interns a fresh arithmetic term variable (integer- or
    /// real-sorted) and registers it with the arithmetic plugin.
    pub fn new_term_variable(&mut self, name: &str, is_integer: bool) -> VarId {
        let type_index = if is_integer { TYPE_INT } else { TYPE_REAL };
        let vi = self.var_db.intern(name, type_index);
        self.trail.grow_to(vi);
        self.fm_mut().register_variable(vi, is_integer);
        self.notify_new_variable(vi);
        vi
    }

    fn notify_new_variable(&mut self, vi: VarId) {
        self.bool_plugin.notify_new_variable(vi);
        for plugin in self.theory_plugins.iter_mut() {
            plugin.notify_new_variable(vi);
        }
    }

    /// Registers `vi` (a Boolean atom interned via
    /// [`Solver::new_bool_variable`]) as standing for `constraint` when
    /// asserted positively, the arithmetic-plugin analogue of handing a
    /// ground clause to [`Solver::add_assertion`].
    pub fn register_atom(&mut self, vi: VarId, constraint: LinearConstraint) {
        self.fm_mut().register_atom(vi, constraint);
    }

    /// Accepts one already-ground clause (a disjunction of literals
    /// over previously-interned variables). Term construction,
    /// rewriting, and CNF conversion of arbitrary formulas are external
    /// collaborators per spec's scope; this is the "φ already arrived
    /// as a clause" case `addAssertion` degenerates to at this layer.
    pub fn add_assertion(&mut self, lits: Vec<Lit>) {
        self.cnf.add_assertion(&mut self.bool_plugin, &mut self.trail, lits);
    }

    pub fn value(&self, vi: VarId) -> Option<ModelValue> {
        self.trail.model_value(vi)
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Requests that the search loop stop at the next plugin boundary.
    /// Matches spec's cooperative cancellation: in-progress plugin
    /// calls run to completion, only the loop's own re-dispatch is cut
    /// short.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    fn propagate_round(&mut self) -> bool {
        let mut progressed = false;
        {
            let mut ctx = PluginContext {
                trail: &mut self.trail,
                plugin_id: BOOL_PLUGIN_ID,
            };
            if self.bool_plugin.propagate(&mut ctx) {
                progressed = true;
                self.stats.clausal_propagations += 1;
            }
        }
        if !self.trail.consistent() {
            return progressed;
        }
        for (i, plugin) in self.theory_plugins.iter_mut().enumerate() {
            if !plugin.feature_set().contains(Features::CAN_PROPAGATE) {
                continue;
            }
            let mut ctx = PluginContext {
                trail: &mut self.trail,
                plugin_id: i + 1,
            };
            if plugin.propagate(&mut ctx) {
                progressed = true;
                self.stats.semantic_propagations += 1;
            }
            if !self.trail.consistent() {
                break;
            }
        }
        progressed
    }

    /// Runs plugins round-robin until a full round makes no progress or
    /// the trail goes inconsistent, matching spec's "climb in strength"
    /// fixpoint description (this crate does not distinguish
    /// `INIT`/`NORMAL`/`COMPLETE` dispatch modes at the round-robin
    /// level — every plugin already rescans the whole trail each call,
    /// so there is no queue state a stronger mode would need to flush).
    fn propagate_to_fixpoint(&mut self) {
        loop {
            self.stats.propagation_rounds += 1;
            if !self.trail.consistent() || self.interrupted {
                return;
            }
            if !self.propagate_round() {
                return;
            }
        }
    }

    fn apply_backtrack(&mut self, level: usize) {
        self.trail.pop_to_level(level, |_elem| {});
        self.bool_plugin.notify_backjump(level);
        for plugin in self.theory_plugins.iter_mut() {
            plugin.notify_backjump(level);
        }
    }

    fn do_restart(&mut self) {
        self.apply_backtrack(0);
        self.bool_plugin.notify_restart();
        for plugin in self.theory_plugins.iter_mut() {
            plugin.notify_restart();
        }
        self.restart_ema.fast.reset();
        self.restart_ema.slow.reset();
        self.stats.restarts += 1;
        if self.config.gc_on_restart {
            self.run_gc();
        }
    }

    /// Glucose-style blocking/forcing restart trigger: once the EMA
    /// pair has enough history (the slow average is non-zero) a
    /// falling trend — the fast (recent) average dropping well below
    /// the slow one — signals thrashing and asks for a restart, unless
    /// the fast average is still comfortably above it (still making
    /// fast progress), which blocks the restart for one more round.
    fn should_restart(&self) -> bool {
        let trend = self.restart_ema.trend();
        if trend > self.config.restart_blocking {
            return false;
        }
        trend < self.config.restart_threshold
    }

    fn run_gc(&mut self) {
        gc::collect_garbage(&mut self.trail, &mut self.bool_plugin, &mut self.theory_plugins);
        self.stats.gcs += 1;
    }

    fn maybe_reduce(&mut self) {
        self.conflicts_since_reduce += 1;
        if self.conflicts_since_reduce < self.config.reduce_interval {
            return;
        }
        self.conflicts_since_reduce = 0;
        let trail = &self.trail;
        self.bool_plugin.clauses.reduce(|cid| trail.stack().iter().any(|e| matches!(e.reason, AssignReason::Implication(c) if c == cid)));
        self.run_gc();
    }

    fn handle_conflict(&mut self) -> Option<bool> {
        self.stats.conflicts += 1;
        self.bool_plugin.decay_activity(1.0);
        self.var_db.decay_activity(1.0);
        for plugin in self.theory_plugins.iter_mut() {
            plugin.notify_conflict();
        }
        if self.trail.decision_level() == 0 {
            return Some(false);
        }
        let outcome = conflict::analyze_conflict(
            &self.trail,
            &mut self.var_db,
            &mut self.bool_plugin,
            &mut self.theory_plugins,
            self.config.rescale_threshold,
        );
        let rank = outcome.resolvent.len();
        let cid = conflict::commit_resolvent(&mut self.bool_plugin, outcome.resolvent.clone(), rank);
        if let Some(cid) = cid {
            for plugin in self.theory_plugins.iter_mut() {
                plugin.notify_conflict_resolution(cid);
            }
        }
        self.apply_backtrack(outcome.backtrack_level);
        if cid.is_none() {
            // Unit resolvent: nothing was watched for it, so it has to
            // be asserted directly instead of relying on the next
            // propagation round to find it via a watch list.
            let mut token = PropagationToken::new(&mut self.trail, ElementKind::ClausalPropagation);
            token.propagate(outcome.resolvent[0], PropagationMode::Normal(AssignReason::Decision));
        } else if outcome.semantic_blockade {
            // Not guaranteed unit after the conservative backjump: hand
            // its literals to the next decision round as hints instead
            // of asserting anything ourselves.
            self.decision_hints = outcome.resolvent;
        }
        self.maybe_reduce();
        None
    }

    /// Runs the full state machine to completion: propagate, analyze
    /// on conflict, process pending requests, decide — repeating until
    /// either a level-0 conflict (UNSAT) or no plugin has any
    /// propagation, request, or decision left to make (SAT).
    pub fn check(&mut self) -> bool {
        loop {
            if self.interrupted {
                return false;
            }
            self.propagate_to_fixpoint();
            if !self.trail.consistent() {
                if let Some(result) = self.handle_conflict() {
                    return result;
                }
                continue;
            }
            if let Some(level) = self.trail.take_backtrack_request() {
                self.apply_backtrack(level);
                continue;
            }
            self.restart_ema.update(self.trail.size() as f64);
            if self.should_restart() {
                self.do_restart();
                continue;
            }
            let hints = std::mem::take(&mut self.decision_hints);
            if decide::decide_round(&mut self.trail, &mut self.bool_plugin, &mut self.theory_plugins, &hints) {
                self.stats.decisions += 1;
                continue;
            }
            return true;
        }
    }
}
