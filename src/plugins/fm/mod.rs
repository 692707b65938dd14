//! The Fourier-Motzkin linear-arithmetic plugin: registers ground
//! linear-arithmetic atoms, derives bounds on their term variables as
//! the Boolean side of the trail assigns those atoms, detects
//! infeasible bound/disequality combinations, and proposes values for
//! term variables the Boolean engine leaves undetermined.
//!
//! Grounded on CVC4's `mcsat/fm/fm_plugin.h`: atoms are registered up
//! front (the original's `addVariable`/constraint-registration path),
//! each atom's `unit_info` is reclassified against the current model
//! every round rather than maintained incrementally (matching this
//! crate's `BoolPlugin::propagate`, which rescans the whole trail each
//! call instead of keeping its own queue head — the same
//! simplicity/performance tradeoff, applied here for textural
//! consistency), and bound derivation/conflict detection delegate to
//! [`super::bounds::CdBoundsModel`] and [`super::resolve`].

pub mod bounds;
pub mod constraint;
pub mod priority;
pub mod resolve;

use self::bounds::{Bound, CdBoundsModel, Disequality};
use self::constraint::{LinearConstraint, RelKind};
use self::priority::VariablePriorityQueue;

use crate::trail::{AssignReason, ElementKind, Trail};
use crate::types::{Lit, Rational, VarId};
use std::collections::{BTreeSet, HashMap};

use super::{Features, Plugin, PluginContext};

/// The arithmetic plugin's per-run state. Boolean atom variables are
/// shared with the rest of the solver's `VarId` space (interned under
/// `TYPE_BOOL`); `atoms` maps such an atom variable to the canonical
/// (positive-literal) constraint it stands for, per spec §3's "atom
/// variable -> linear constraint" table.
pub struct FmPlugin {
    atoms: HashMap<VarId, LinearConstraint>,
    /// Every term variable mentioned by a registered atom, so a full
    /// round can look for newly-tight bounds without the plugin
    /// needing its own copy of the variable database.
    term_vars: BTreeSet<VarId>,
    /// Term variables the solver told us are integer-sorted (via
    /// [`FmPlugin::register_variable`]); everything else is treated as
    /// real-sorted for value-picking purposes.
    integer_vars: BTreeSet<VarId>,
    bounds: CdBoundsModel,
    queue: VariablePriorityQueue,
    /// How many consecutive integers around a tight bound
    /// `pick_value` tries before widening outward — `Config`'s
    /// `int_pick_window`, threaded in at construction.
    int_pick_window: i64,
}

impl Default for FmPlugin {
    fn default() -> FmPlugin {
        FmPlugin {
            atoms: HashMap::new(),
            term_vars: BTreeSet::new(),
            integer_vars: BTreeSet::new(),
            bounds: CdBoundsModel::new(),
            queue: VariablePriorityQueue::new(),
            int_pick_window: 2,
        }
    }
}

impl FmPlugin {
    pub fn new() -> FmPlugin {
        FmPlugin::default()
    }

    pub fn with_int_pick_window(mut self, window: i64) -> FmPlugin {
        self.int_pick_window = window;
        self
    }

    /// Tells the plugin that `vi` is integer-sorted, called by the
    /// solver at the point it interns an arithmetic variable under
    /// `TYPE_INT` (the plugin has no access to `VarDb` itself).
    pub fn register_variable(&mut self, vi: VarId, is_integer: bool) {
        self.bounds.grow_to(vi);
        self.term_vars.insert(vi);
        if is_integer {
            self.integer_vars.insert(vi);
        }
    }

    /// Registers `vi` (a Boolean atom variable) as standing for
    /// `constraint` when asserted positively. Called by the solver
    /// during assertion intake, the arithmetic-plugin analogue of
    /// `CnfPlugin::add_assertion` handing a clause to `BoolPlugin`.
    pub fn register_atom(&mut self, vi: VarId, constraint: LinearConstraint) {
        for x in constraint.variables() {
            self.bounds.grow_to(x);
            self.term_vars.insert(x);
        }
        self.atoms.insert(vi, constraint);
    }

    fn satisfies(kind: RelKind, value: Rational) -> bool {
        let zero = Rational::from_integer(0);
        match kind {
            RelKind::Eq => value == zero,
            RelKind::Distinct => value != zero,
            RelKind::Gt => value > zero,
            RelKind::Geq => value >= zero,
        }
    }

    /// Evaluates `constraint` against the trail's current semantic
    /// values, classifying it the way CVC4's `unit_info` does: fully
    /// assigned (every variable has a model value), unit (exactly one
    /// doesn't), or not unit (two or more don't — nothing to do with
    /// it this round).
    fn process_atom(&mut self, trail: &mut Trail, plugin_id: usize, constraint: &LinearConstraint, reason_lit: Lit) {
        let level = trail.decision_level();
        let mut unassigned: Option<VarId> = None;
        let mut multi_unassigned = false;
        let mut sum = constraint.constant();
        for vi in constraint.variables() {
            match trail.semantic_value(vi) {
                Some(v) => sum += constraint.coeff(vi) * v,
                None => {
                    if unassigned.is_some() {
                        multi_unassigned = true;
                        break;
                    }
                    unassigned = Some(vi);
                }
            }
        }
        if multi_unassigned {
            return;
        }
        match unassigned {
            None => {
                if !Self::satisfies(constraint.kind, sum) {
                    trail.mark_inconsistent(reason_lit, AssignReason::Semantic(plugin_id));
                }
            }
            Some(x) => {
                self.derive_bound(trail, plugin_id, constraint, x, sum, reason_lit, level);
                self.queue.enqueue(x);
            }
        }
    }

    /// Derives a bound or disequality on `x` from a unit constraint
    /// `a*x + sum_others (kind) 0`, per the direction table: dividing
    /// by a negative `a` flips which side of the interval the bound
    /// lands on (`GT`/`GEQ` only; `EQ`/`DISTINCT` are sign-symmetric).
    fn derive_bound(
        &mut self,
        trail: &mut Trail,
        plugin_id: usize,
        constraint: &LinearConstraint,
        x: VarId,
        sum_others: Rational,
        reason_lit: Lit,
        level: usize,
    ) {
        let a = constraint.coeff(x);
        debug_assert!(a != Rational::from_integer(0), "unit variable must have a nonzero coefficient");
        let value = -sum_others / a;
        let negative_coeff = a < Rational::from_integer(0);
        match constraint.kind {
            RelKind::Eq => {
                let bound = Bound {
                    value,
                    strict: false,
                    reason: reason_lit,
                    level,
                };
                self.bounds.update_lower_bound(x, level, bound);
                self.bounds.update_upper_bound(x, level, bound);
            }
            RelKind::Distinct => {
                self.bounds.add_disequality(
                    x,
                    level,
                    Disequality {
                        value,
                        reason: reason_lit,
                        level,
                    },
                );
            }
            RelKind::Gt | RelKind::Geq => {
                let strict = matches!(constraint.kind, RelKind::Gt);
                let bound = Bound {
                    value,
                    strict,
                    reason: reason_lit,
                    level,
                };
                if negative_coeff {
                    self.bounds.update_upper_bound(x, level, bound);
                } else {
                    self.bounds.update_lower_bound(x, level, bound);
                }
            }
        }
        if self.bounds.is_in_conflict(x) {
            let trigger = self
                .bounds
                .upper(x)
                .map(|b| b.reason)
                .or_else(|| self.bounds.lower(x).map(|b| b.reason))
                .unwrap_or(reason_lit);
            trail.mark_inconsistent(trigger, AssignReason::Semantic(plugin_id));
        }
    }

    /// Picks a concrete value for `vi` within its current bounds,
    /// preferring the tightest feasible point and stepping away from
    /// disequalities by `int_pick_window` before widening further —
    /// the bias the `Config::int_pick_window` knob documents.
    fn pick_value(&self, vi: VarId) -> Rational {
        let lower = self.bounds.lower(vi);
        let upper = self.bounds.upper(vi);
        let is_int = self.integer_vars.contains(&vi);
        let one = Rational::from_integer(1);
        let base = match (lower, upper) {
            (Some(lo), Some(hi)) => {
                if lo.value == hi.value {
                    lo.value
                } else {
                    let mid = (lo.value + hi.value) / Rational::from_integer(2);
                    if is_int {
                        mid.floor()
                    } else {
                        mid
                    }
                }
            }
            (Some(lo), None) => {
                let start = if lo.strict { lo.value + one } else { lo.value };
                if is_int {
                    start.ceil()
                } else {
                    start
                }
            }
            (None, Some(hi)) => {
                let start = if hi.strict { hi.value - one } else { hi.value };
                if is_int {
                    start.floor()
                } else {
                    start
                }
            }
            (None, None) => Rational::from_integer(0),
        };
        self.avoid_disequalities(vi, base)
    }

    fn within_bounds(&self, vi: VarId, value: Rational) -> bool {
        if let Some(lo) = self.bounds.lower(vi) {
            if value < lo.value || (value == lo.value && lo.strict) {
                return false;
            }
        }
        if let Some(hi) = self.bounds.upper(vi) {
            if value > hi.value || (value == hi.value && hi.strict) {
                return false;
            }
        }
        true
    }

    /// Walks outward from `base` by integer steps (exact rationals
    /// still make perfectly good "distinct from this point" choices
    /// for real-sorted variables) until a value both inside the
    /// current bounds and not excluded by a disequality is found. The
    /// first `int_pick_window` steps alternate above/below `base`
    /// before the search simply keeps widening.
    fn avoid_disequalities(&self, vi: VarId, base: Rational) -> Rational {
        if !self.bounds.is_disequal(vi, base) && self.within_bounds(vi, base) {
            return base;
        }
        let window = self.int_pick_window.max(1);
        let mut k = 1;
        loop {
            let up = base + Rational::from_integer(k);
            if self.within_bounds(vi, up) && !self.bounds.is_disequal(vi, up) {
                return up;
            }
            let down = base - Rational::from_integer(k);
            if self.within_bounds(vi, down) && !self.bounds.is_disequal(vi, down) {
                return down;
            }
            debug_assert!(k < 1_000_000, "runaway disequality search");
            k += 1;
            let _ = window;
        }
    }
}

impl Plugin for FmPlugin {
    fn feature_set(&self) -> Features {
        Features::CAN_PROPAGATE | Features::CAN_DECIDE
    }

    fn propagate(&mut self, ctx: &mut PluginContext) -> bool {
        let before = ctx.trail.size();
        let assigned: Vec<Lit> = ctx
            .trail
            .stack()
            .iter()
            .map(|e| e.lit)
            .filter(|l| self.atoms.contains_key(&l.vi()))
            .collect();
        for lit in assigned {
            if !ctx.trail.consistent() {
                break;
            }
            let base = self.atoms[&lit.vi()].clone();
            let constraint = if lit.is_positive() { base } else { base.negate() };
            self.process_atom(ctx.trail, ctx.plugin_id, &constraint, lit);
        }
        if ctx.trail.consistent() {
            let term_vars: Vec<VarId> = self.term_vars.iter().copied().collect();
            for vi in term_vars {
                if ctx.trail.has_value(vi) {
                    continue;
                }
                if let (Some(lo), Some(hi)) = (self.bounds.lower(vi), self.bounds.upper(vi)) {
                    if !lo.strict && !hi.strict && lo.value == hi.value {
                        ctx.trail
                            .push_semantic(ElementKind::SemanticPropagation, vi, lo.value, AssignReason::Semantic(ctx.plugin_id));
                    }
                }
            }
        }
        ctx.trail.size() != before
    }

    fn decide(&mut self, ctx: &mut PluginContext) -> bool {
        while let Some(vi) = self.queue.pop() {
            if ctx.trail.has_value(vi) {
                continue;
            }
            let value = self.pick_value(vi);
            ctx.trail.new_decision_level();
            ctx.trail.push_semantic(ElementKind::SemanticDecision, vi, value, AssignReason::Decision);
            return true;
        }
        for &vi in &self.term_vars {
            if !ctx.trail.has_value(vi) {
                let value = self.pick_value(vi);
                ctx.trail.new_decision_level();
                ctx.trail.push_semantic(ElementKind::SemanticDecision, vi, value, AssignReason::Decision);
                return true;
            }
        }
        false
    }

    /// Reconstructs the antecedents of a bound-derived propagation or
    /// conflict, in the same false-form convention `Implication`
    /// clauses use: whichever atom literal pinned the *other* side of
    /// the interval, negated so `(propagated OR these)` is valid. When
    /// the two bounds come from different atoms, [`resolve::eliminate`]
    /// actually combines them and, if the result still mentions other
    /// term variables, the chain continues through *their* bounds too
    /// (spec §4.6's "Fourier-Motzkin resolution applied to explain a
    /// derived bound in terms of asserted literals"), rather than
    /// stopping at the first pair the way a degenerate single-variable
    /// conflict would suggest.
    fn explain(&self, propagated: Lit) -> Vec<Lit> {
        for &vi in &self.term_vars {
            if let Some(lo) = self.bounds.lower(vi) {
                if lo.reason == propagated {
                    return match self.bounds.upper(vi) {
                        Some(hi) => self.explain_bound_conflict(vi, lo, hi, propagated),
                        None => Vec::new(),
                    };
                }
            }
            if let Some(hi) = self.bounds.upper(vi) {
                if hi.reason == propagated {
                    return match self.bounds.lower(vi) {
                        Some(lo) => self.explain_bound_conflict(vi, lo, hi, propagated),
                        None => Vec::new(),
                    };
                }
            }
            for d in self.bounds.disequalities(vi) {
                if d.reason == propagated {
                    let mut antecedents = Vec::new();
                    if let Some(lo) = self.bounds.lower(vi) {
                        antecedents.push(lo.reason.negate());
                    }
                    if let Some(hi) = self.bounds.upper(vi) {
                        antecedents.push(hi.reason.negate());
                    }
                    return antecedents;
                }
            }
        }
        Vec::new()
    }

    fn notify_backjump(&mut self, level: usize) {
        self.bounds.pop_to_level(level);
    }

    fn bump_variable(&mut self, vi: VarId, rescale_threshold: f64) {
        if self.term_vars.contains(&vi) {
            self.queue.bump_variable(vi, rescale_threshold);
        }
    }
}

impl FmPlugin {
    /// The atom literal's own constraint, canonicalized to the
    /// literal's polarity — the same lookup `propagate` does before
    /// handing a constraint to [`Self::process_atom`].
    fn atom_constraint(&self, lit: Lit) -> Option<LinearConstraint> {
        let base = self.atoms.get(&lit.vi())?.clone();
        Some(if lit.is_positive() { base } else { base.negate() })
    }

    /// Explains a conflict (or propagation) pinned between `lo` and
    /// `hi` on `x`. `propagated` names whichever of the two is the
    /// literal being explained, so it is excluded from the result (the
    /// caller already counts it); the other bound's reason is always
    /// included, and if the two bounds trace back to different atoms,
    /// [`resolve::eliminate`] resolves `x` out of them and the chain
    /// continues into whatever other term variables the result still
    /// mentions.
    fn explain_bound_conflict(&self, x: VarId, lo: Bound, hi: Bound, propagated: Lit) -> Vec<Lit> {
        if lo.reason == hi.reason {
            // A single EQ atom pinned both sides; nothing else to fold in.
            return Vec::new();
        }
        let other_reason = if lo.reason == propagated { hi.reason } else { lo.reason };
        let mut antecedents = vec![other_reason.negate()];
        if let (Some(lc), Some(hc)) = (self.atom_constraint(lo.reason), self.atom_constraint(hi.reason)) {
            if let Some(resolved) = try_eliminate(&lc, x, &hc) {
                let mut seen = BTreeSet::new();
                seen.insert(x);
                self.chain_resolve(resolved, &mut seen, &mut antecedents);
            }
        }
        antecedents
    }

    /// Continues a Fourier-Motzkin elimination chain: for every term
    /// variable `constraint` still mentions (and hasn't already been
    /// folded in), pulls in whatever asserted facts pin *that*
    /// variable — a matching pair of bounds (eliminated the same way),
    /// a single EQ atom, or a bound tightened to a point by a
    /// coincident disequality (via [`resolve::eliminate_against_distinct`])
    /// — so the final antecedent list traces back to asserted literals
    /// rather than stopping at the first intermediate derived bound.
    fn chain_resolve(&self, constraint: LinearConstraint, seen: &mut BTreeSet<VarId>, antecedents: &mut Vec<Lit>) {
        for y in constraint.variables().collect::<Vec<_>>() {
            if seen.contains(&y) {
                continue;
            }
            seen.insert(y);
            match (self.bounds.lower(y), self.bounds.upper(y)) {
                (Some(lo), Some(hi)) if lo.reason == hi.reason => {
                    antecedents.push(lo.reason.negate());
                }
                (Some(lo), Some(hi)) => {
                    antecedents.push(lo.reason.negate());
                    antecedents.push(hi.reason.negate());
                    if let (Some(lc), Some(hc)) = (self.atom_constraint(lo.reason), self.atom_constraint(hi.reason)) {
                        if let Some(resolved) = try_eliminate(&lc, y, &hc) {
                            self.chain_resolve(resolved, seen, antecedents);
                        }
                    }
                }
                (Some(single), None) | (None, Some(single)) => {
                    if let Some(d) = self.bounds.disequalities(y).iter().find(|d| d.value == single.value) {
                        antecedents.push(single.reason.negate());
                        antecedents.push(d.reason.negate());
                        if let Some(bc) = self.atom_constraint(single.reason) {
                            let resolved = resolve::eliminate_against_distinct(&bc, y, d.value);
                            self.chain_resolve(resolved, seen, antecedents);
                        }
                    }
                }
                (None, None) => {}
            }
        }
    }
}

/// Eliminates `x` between `lc` and `hc` only when their coefficients
/// on `x` actually oppose in sign, as [`resolve::eliminate`] requires;
/// returns `None` rather than tripping that function's `debug_assert`
/// when two same-direction atoms happen to both name `x` (e.g. an EQ
/// atom supplying one side and a GEQ atom the other, overwriting
/// whichever bound it didn't also set).
fn try_eliminate(lc: &LinearConstraint, x: VarId, hc: &LinearConstraint) -> Option<LinearConstraint> {
    let zero = Rational::from_integer(0);
    let a1 = lc.coeff(x);
    let a2 = hc.coeff(x);
    if a1 == zero || a2 == zero || (a1 > zero) == (a2 > zero) {
        return None;
    }
    Some(resolve::eliminate(lc, x, hc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::Trail;
    use std::collections::BTreeMap;

    fn geq(coeffs: &[(VarId, i64)], k: i64) -> LinearConstraint {
        let mut m = BTreeMap::new();
        for &(vi, c) in coeffs {
            m.insert(vi, Rational::from_integer(c));
        }
        m.insert(0, Rational::from_integer(k));
        LinearConstraint { coeffs: m, kind: RelKind::Geq }
    }

    #[test]
    fn unit_constraint_derives_a_lower_bound() {
        // atom variable 10 stands for: x - 3 >= 0  (x is term variable 1)
        let mut fm = FmPlugin::new();
        fm.register_atom(10, geq(&[(1, 1)], -3));
        let mut trail = Trail::new(10);
        trail.push(ElementKind::BooleanDecision, Lit::positive(10), AssignReason::Decision);
        let mut ctx = PluginContext { trail: &mut trail, plugin_id: 0 };
        fm.propagate(&mut ctx);
        assert_eq!(fm.bounds.lower(1).unwrap().value, Rational::from_integer(3));
        assert!(!fm.bounds.lower(1).unwrap().strict);
    }

    #[test]
    fn opposing_unit_constraints_conflict() {
        // atom 10: x - 3 >= 0   (x >= 3)
        // atom 11: -x + 1 >= 0  (x <= 1)
        let mut fm = FmPlugin::new();
        fm.register_atom(10, geq(&[(1, 1)], -3));
        fm.register_atom(11, geq(&[(1, -1)], 1));
        let mut trail = Trail::new(11);
        trail.push(ElementKind::BooleanDecision, Lit::positive(10), AssignReason::Decision);
        trail.push(ElementKind::BooleanDecision, Lit::positive(11), AssignReason::Decision);
        let mut ctx = PluginContext { trail: &mut trail, plugin_id: 0 };
        fm.propagate(&mut ctx);
        assert!(!trail.consistent());
    }

    #[test]
    fn tight_bounds_propagate_the_forced_value() {
        // atom 10: x - 2 >= 0  (x >= 2);  atom 11: -x + 2 >= 0  (x <= 2)
        let mut fm = FmPlugin::new();
        fm.register_atom(10, geq(&[(1, 1)], -2));
        fm.register_atom(11, geq(&[(1, -1)], 2));
        let mut trail = Trail::new(11);
        trail.push(ElementKind::BooleanDecision, Lit::positive(10), AssignReason::Decision);
        trail.push(ElementKind::BooleanDecision, Lit::positive(11), AssignReason::Decision);
        let mut ctx = PluginContext { trail: &mut trail, plugin_id: 0 };
        fm.propagate(&mut ctx);
        assert!(trail.consistent());
        assert_eq!(trail.semantic_value(1), Some(Rational::from_integer(2)));
    }

    #[test]
    fn pick_value_respects_integer_and_disequality() {
        let mut fm = FmPlugin::new();
        fm.register_variable(1, true);
        fm.bounds.update_lower_bound(1, 0, Bound { value: Rational::from_integer(0), strict: false, reason: crate::types::NULL_LIT, level: 0 });
        fm.bounds.update_upper_bound(1, 0, Bound { value: Rational::from_integer(4), strict: false, reason: crate::types::NULL_LIT, level: 0 });
        fm.bounds.add_disequality(1, 0, Disequality { value: Rational::from_integer(2), reason: crate::types::NULL_LIT, level: 0 });
        let v = fm.pick_value(1);
        assert!(v >= Rational::from_integer(0) && v <= Rational::from_integer(4));
        assert_ne!(v, Rational::from_integer(2));
    }

    #[test]
    fn explain_returns_the_opposing_bound_reason() {
        let mut fm = FmPlugin::new();
        fm.register_atom(10, geq(&[(1, 1)], -3));
        fm.register_atom(11, geq(&[(1, -1)], 1));
        let mut trail = Trail::new(11);
        trail.push(ElementKind::BooleanDecision, Lit::positive(10), AssignReason::Decision);
        trail.push(ElementKind::BooleanDecision, Lit::positive(11), AssignReason::Decision);
        let mut ctx = PluginContext { trail: &mut trail, plugin_id: 0 };
        fm.propagate(&mut ctx);
        let antecedents = fm.explain(Lit::positive(10));
        assert_eq!(antecedents, vec![Lit::negative(11)]);
    }
}
