//! The solver trail: the single, append-only record of every decision
//! and propagation made during search, with context-dependent
//! rollback on backtrack.
//!
//! Grounded on the teacher's `AssignStack` (`trail: Vec<Lit>`,
//! `trail_lim: Vec<usize>` marking decision-level boundaries,
//! `reason: Vec<AssignReason>`, `cancel_until` truncation), generalized
//! from "every trail element is a Boolean propagation or decision" to
//! the four-way split the original CVC4 `solver_trail.h` makes
//! (`BOOLEAN_DECISION` / `SEMANTIC_DECISION` / `CLAUSAL_PROPAGATION` /
//! `SEMANTIC_PROPAGATION`), and on that same header for the
//! `PropagationToken`/`DecisionToken` operator shapes (ported to Rust
//! methods since Rust has no operator() overloading).

use crate::cdb::ClauseId;
use crate::types::{Lit, ModelValue, Rational, VarId};
use std::collections::HashMap;

/// What kind of trail element this is, matching the original's
/// `SolverTrail::Type` four-way split.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementKind {
    BooleanDecision,
    SemanticDecision,
    ClausalPropagation,
    SemanticPropagation,
}

/// Why a value ended up on the trail. `None` marks a decision (nothing
/// to explain); `Implication` names the clause and, for multi-literal
/// clauses, the one literal that was the propagation's consequence so
/// the rest can be read off as its negated antecedents. Semantic
/// propagations are explained lazily by calling back into the owning
/// plugin (`reason_plugin`) rather than storing a clause, since a
/// theory's explanation may not be a clause the solver already
/// materialized.
#[derive(Clone, Debug)]
pub enum AssignReason {
    Decision,
    Implication(ClauseId),
    /// The plugin id that can explain this propagation on request, via
    /// `Plugin::explain`.
    Semantic(usize),
}

#[derive(Clone, Debug)]
pub struct TrailElement {
    pub kind: ElementKind,
    pub lit: Lit,
    pub level: usize,
    pub reason: AssignReason,
}

/// The trail itself. Boolean values live in a dense `Option<bool>`
/// array indexed by `VarId` (as in the teacher); the ordered log of
/// elements is what conflict analysis and backtracking walk.
#[derive(Default)]
pub struct Trail {
    assign: Vec<Option<bool>>,
    /// Concrete model values for semantic (theory term) variables.
    /// Sparse: most variables in a run are plain Boolean atoms and
    /// never appear here. Indexed by `VarId` via `HashMap` rather than
    /// a dense `Vec` since only a fraction of variables are semantic.
    semantic_value: HashMap<VarId, Rational>,
    var_level: Vec<usize>,
    var_reason: Vec<AssignReason>,
    elements: Vec<TrailElement>,
    level_lim: Vec<usize>, // elements.len() at the start of each level
    consistent: bool,
    inconsistent_propagations: Vec<(Lit, AssignReason)>,
    backtrack_requested: Option<usize>,
}

impl Trail {
    pub fn new(nvars: usize) -> Trail {
        Trail {
            assign: vec![None; nvars + 1],
            semantic_value: HashMap::new(),
            var_level: vec![0; nvars + 1],
            var_reason: (0..=nvars).map(|_| AssignReason::Decision).collect(),
            elements: Vec::new(),
            level_lim: Vec::new(),
            consistent: true,
            inconsistent_propagations: Vec::new(),
            backtrack_requested: None,
        }
    }

    pub fn grow_to(&mut self, nvars: usize) {
        if self.assign.len() <= nvars {
            self.assign.resize(nvars + 1, None);
            self.var_level.resize(nvars + 1, 0);
            self.var_reason.resize_with(nvars + 1, || AssignReason::Decision);
        }
    }

    pub fn decision_level(&self) -> usize {
        self.level_lim.len()
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn consistent(&self) -> bool {
        self.consistent
    }

    pub fn has_value(&self, vi: VarId) -> bool {
        self.assign[vi].is_some()
    }

    pub fn value(&self, vi: VarId) -> Option<bool> {
        self.assign[vi]
    }

    pub fn is_true(&self, l: Lit) -> bool {
        self.assign[l.vi()] == Some(l.is_positive())
    }

    pub fn is_false(&self, l: Lit) -> bool {
        self.assign[l.vi()] == Some(!l.is_positive())
    }

    pub fn level_of(&self, vi: VarId) -> Option<usize> {
        if self.assign[vi].is_some() {
            Some(self.var_level[vi])
        } else {
            None
        }
    }

    pub fn reason_of(&self, vi: VarId) -> Option<&AssignReason> {
        if self.assign[vi].is_some() {
            Some(&self.var_reason[vi])
        } else {
            None
        }
    }

    pub fn has_reason(&self, vi: VarId) -> bool {
        matches!(self.reason_of(vi), Some(AssignReason::Implication(_)) | Some(AssignReason::Semantic(_)))
    }

    pub fn stack(&self) -> &[TrailElement] {
        &self.elements
    }

    pub fn stack_range(&self, from_level: usize) -> &[TrailElement] {
        let start = self.level_lim.get(from_level.wrapping_sub(1)).copied().unwrap_or(0);
        &self.elements[start..]
    }

    /// Opens a new decision level. Must be called before pushing the
    /// decision element itself.
    pub fn new_decision_level(&mut self) {
        self.level_lim.push(self.elements.len());
    }

    /// Records one trail element. `kind`/`reason` must agree: a
    /// `*Decision` kind pairs with `AssignReason::Decision`, a
    /// `*Propagation` kind with `Implication`/`Semantic`.
    pub fn push(&mut self, kind: ElementKind, lit: Lit, reason: AssignReason) {
        let level = self.decision_level();
        debug_assert!(
            self.assign[lit.vi()].is_none(),
            "variable assigned twice without an intervening backtrack"
        );
        self.assign[lit.vi()] = Some(lit.is_positive());
        self.var_level[lit.vi()] = level;
        self.var_reason[lit.vi()] = reason.clone();
        self.elements.push(TrailElement {
            kind,
            lit,
            level,
            reason,
        });
    }

    /// Records a `SemanticDecision`/`SemanticPropagation` binding a
    /// theory term variable to a concrete rational, alongside the
    /// ordinary bookkeeping `push` performs for the rest of the trail.
    /// There is no polarity to a model value, so the element's `lit`
    /// field carries the variable's positive occurrence purely as an
    /// address; readers of a semantic element must consult
    /// [`Trail::semantic_value`], never `is_true`/`is_false`.
    pub fn push_semantic(&mut self, kind: ElementKind, vi: VarId, value: Rational, reason: AssignReason) {
        debug_assert!(
            matches!(kind, ElementKind::SemanticDecision | ElementKind::SemanticPropagation),
            "push_semantic called with a non-semantic element kind"
        );
        let level = self.decision_level();
        debug_assert!(self.assign[vi].is_none(), "variable assigned twice without an intervening backtrack");
        self.assign[vi] = Some(true);
        self.var_level[vi] = level;
        self.var_reason[vi] = reason.clone();
        self.semantic_value.insert(vi, value);
        self.elements.push(TrailElement {
            kind,
            lit: Lit::positive(vi),
            level,
            reason,
        });
    }

    pub fn semantic_value(&self, vi: VarId) -> Option<Rational> {
        self.semantic_value.get(&vi).copied()
    }

    /// The model value for `vi`, whichever kind it is: a Boolean
    /// truth value if it was assigned via `push`, or a rational if it
    /// was assigned via `push_semantic`. `None` if unassigned.
    pub fn model_value(&self, vi: VarId) -> Option<ModelValue> {
        if let Some(r) = self.semantic_value.get(&vi) {
            return Some(ModelValue::Rational(*r));
        }
        self.assign[vi].map(ModelValue::Bool)
    }

    /// Records a conflicting propagation without aborting: rather than
    /// unwinding through an exception, the conflicting literal and the
    /// reason that would have justified it are filed in
    /// `inconsistent_propagations` and `consistent` flips to `false`;
    /// conflict analysis reads the reason back off this list instead
    /// of `reason_of` (whose slot for this variable still names its
    /// *actual*, contradicting assignment).
    pub fn mark_inconsistent(&mut self, l: Lit, reason: AssignReason) {
        self.consistent = false;
        self.inconsistent_propagations.push((l, reason));
    }

    pub fn inconsistent_propagations(&self) -> &[(Lit, AssignReason)] {
        &self.inconsistent_propagations
    }

    /// Truncates the trail back to `level`, undoing every assignment
    /// made above it and restoring consistency. `notify` is called
    /// once per undone element so plugins can roll back their own
    /// watch-list cursors.
    pub fn pop_to_level(&mut self, level: usize, mut notify: impl FnMut(&TrailElement)) {
        if self.decision_level() <= level {
            return;
        }
        let cut = self.level_lim[level];
        while self.elements.len() > cut {
            let e = self.elements.pop().unwrap();
            self.assign[e.lit.vi()] = None;
            self.semantic_value.remove(&e.lit.vi());
            notify(&e);
        }
        self.level_lim.truncate(level);
        self.consistent = true;
        self.inconsistent_propagations.clear();
        self.backtrack_requested = None;
    }

    /// Files a backtrack request rather than acting immediately —
    /// matches the original's `requestBacktrack`: a plugin mid-
    /// propagation asks for a backjump, and the solver loop honors it
    /// once the current propagation fixpoint settles.
    pub fn request_backtrack(&mut self, level: usize) {
        self.backtrack_requested = Some(match self.backtrack_requested {
            Some(existing) => existing.min(level),
            None => level,
        });
    }

    pub fn take_backtrack_request(&mut self) -> Option<usize> {
        self.backtrack_requested.take()
    }

    /// Applies a clause-database relocation map to every
    /// `AssignReason::Implication` this trail still holds (per-variable
    /// reasons, the ordered element log, and any pending inconsistent
    /// propagation), the consumer side of [`crate::cdb::ClauseRelocationInfo`]
    /// spec §4.3 asks the farm's GC to produce.
    pub fn relocate_clause_reasons(&mut self, remap: &HashMap<ClauseId, ClauseId>) {
        let relocate = |r: &mut AssignReason| {
            if let AssignReason::Implication(cid) = r {
                if let Some(&new_id) = remap.get(cid) {
                    *cid = new_id;
                }
            }
        };
        for r in self.var_reason.iter_mut() {
            relocate(r);
        }
        for e in self.elements.iter_mut() {
            relocate(&mut e.reason);
        }
        for (_, r) in self.inconsistent_propagations.iter_mut() {
            relocate(r);
        }
    }
}

/// The three propagation modes from the original's `PropagationToken`:
/// a plugin proposing a value during the very first fixpoint pass
/// before any clauses exist (`Init`), a normal mid-search propagation
/// explained by a clause or a plugin callback (`Normal`), and a
/// propagation a plugin asserts it can explain only if later asked
/// (`Complete`, used when materializing the explanation eagerly would
/// be wasted work if the propagation is never involved in a conflict).
pub enum PropagationMode {
    Init,
    Normal(AssignReason),
    Complete(AssignReason),
}

/// Handed to a plugin's `propagate` call so it can push new
/// assignments onto the trail without a raw `&mut Trail` (and without
/// being able to open/close decision levels itself, which is the
/// solver loop's job alone).
pub struct PropagationToken<'a> {
    trail: &'a mut Trail,
    kind: ElementKind,
}

impl<'a> PropagationToken<'a> {
    pub fn new(trail: &'a mut Trail, kind: ElementKind) -> PropagationToken<'a> {
        PropagationToken { trail, kind }
    }

    pub fn propagate(&mut self, lit: Lit, mode: PropagationMode) {
        let reason = match mode {
            PropagationMode::Init => AssignReason::Decision,
            PropagationMode::Normal(r) | PropagationMode::Complete(r) => r,
        };
        if self.trail.is_false(lit) {
            self.trail.mark_inconsistent(lit, reason);
            return;
        }
        if self.trail.is_true(lit) {
            return;
        }
        self.trail.push(self.kind, lit, reason);
    }
}

/// Handed to a plugin's `decide` call. Boolean and semantic decisions
/// both flow through here; which kind is recorded is fixed by how the
/// token was constructed, mirroring the original's two `operator()`
/// overloads on `DecisionToken`.
pub struct DecisionToken<'a> {
    trail: &'a mut Trail,
    kind: ElementKind,
}

impl<'a> DecisionToken<'a> {
    pub fn new(trail: &'a mut Trail, kind: ElementKind) -> DecisionToken<'a> {
        DecisionToken { trail, kind }
    }

    pub fn decide(&mut self, lit: Lit) {
        self.trail.new_decision_level();
        self.trail.push(self.kind, lit, AssignReason::Decision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdb::ClauseId;

    #[test]
    fn push_and_pop_restores_unassigned() {
        let mut t = Trail::new(4);
        t.new_decision_level();
        t.push(ElementKind::BooleanDecision, Lit::positive(1), AssignReason::Decision);
        t.push(
            ElementKind::ClausalPropagation,
            Lit::positive(2),
            AssignReason::Implication(ClauseId(0)),
        );
        assert_eq!(t.decision_level(), 1);
        assert!(t.is_true(Lit::positive(2)));
        t.pop_to_level(0, |_| {});
        assert_eq!(t.decision_level(), 0);
        assert!(!t.has_value(1));
        assert!(!t.has_value(2));
    }

    #[test]
    fn conflicting_propagation_marks_inconsistent_without_panicking() {
        let mut t = Trail::new(2);
        t.push(ElementKind::ClausalPropagation, Lit::positive(1), AssignReason::Implication(ClauseId(0)));
        let mut token = PropagationToken::new(&mut t, ElementKind::ClausalPropagation);
        token.propagate(Lit::negative(1), PropagationMode::Normal(AssignReason::Implication(ClauseId(1))));
        assert!(!t.consistent());
        assert!(t.inconsistent_propagations().iter().any(|(l, _)| *l == Lit::negative(1)));
    }

    #[test]
    fn backtrack_request_takes_the_minimum() {
        let mut t = Trail::new(1);
        t.request_backtrack(3);
        t.request_backtrack(1);
        assert_eq!(t.take_backtrack_request(), Some(1));
        assert_eq!(t.take_backtrack_request(), None);
    }
}
