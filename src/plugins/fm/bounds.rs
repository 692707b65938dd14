//! The context-dependent bounds model: for each arithmetic term
//! variable, an optional lower/upper bound and a set of excluded
//! (disequal) values, each with an undo trail so a pop to a prior
//! context level restores the exact prior mapping.
//!
//! Grounded on CVC4's `fm_plugin.h`'s `d_bounds`/`TNodeBoundInfo` and
//! built on this crate's own [`crate::context::Cdo`]/[`crate::context::CdList`]
//! rather than a bespoke undo log, per spec §9's "replace per-object
//! on-pop callbacks with a generic rollback log" design note.

use crate::context::{CdList, Cdo};
use crate::types::{Lit, Rational, VarId};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    pub value: Rational,
    pub strict: bool,
    pub reason: Lit,
    pub level: usize,
}

impl Bound {
    /// `true` iff `self`, as a *lower* bound, is an improvement over
    /// `existing`: strictly greater, or equal with `strict` promoted
    /// from `false` to `true` (spec §3).
    pub fn improves_lower(&self, existing: &Option<Bound>) -> bool {
        match existing {
            None => true,
            Some(e) => self.value > e.value || (self.value == e.value && self.strict && !e.strict),
        }
    }

    /// Mirror of [`Bound::improves_lower`] for an *upper* bound:
    /// strictly smaller, or equal with strictness gained.
    pub fn improves_upper(&self, existing: &Option<Bound>) -> bool {
        match existing {
            None => true,
            Some(e) => self.value < e.value || (self.value == e.value && self.strict && !e.strict),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Disequality {
    pub value: Rational,
    pub reason: Lit,
    pub level: usize,
}

/// Context-dependent lower/upper bound plus disequality set for every
/// arithmetic term variable, with `variables_in_conflict` tracking
/// which variables currently have an infeasible bound/disequality
/// combination (spec §4.6's `CDBoundsModel`).
#[derive(Default)]
pub struct CdBoundsModel {
    lower: Vec<Cdo<Option<Bound>>>,
    upper: Vec<Cdo<Option<Bound>>>,
    disequal: Vec<CdList<Disequality>>,
    variables_in_conflict: BTreeSet<VarId>,
}

impl CdBoundsModel {
    pub fn new() -> CdBoundsModel {
        CdBoundsModel::default()
    }

    /// Grows the per-variable tables so `vi` can be indexed; called
    /// whenever the variable database interns a fresh arithmetic
    /// variable.
    pub fn grow_to(&mut self, vi: VarId) {
        if self.lower.len() <= vi {
            self.lower.resize_with(vi + 1, || Cdo::new(None));
            self.upper.resize_with(vi + 1, || Cdo::new(None));
            self.disequal.resize_with(vi + 1, CdList::new);
        }
    }

    pub fn lower(&self, vi: VarId) -> Option<Bound> {
        *self.lower[vi].get()
    }

    pub fn upper(&self, vi: VarId) -> Option<Bound> {
        *self.upper[vi].get()
    }

    pub fn disequalities(&self, vi: VarId) -> &[Disequality] {
        self.disequal[vi].as_slice()
    }

    pub fn is_disequal(&self, vi: VarId, value: Rational) -> bool {
        self.disequal[vi].as_slice().iter().any(|d| d.value == value)
    }

    pub fn variables_in_conflict(&self) -> impl Iterator<Item = VarId> + '_ {
        self.variables_in_conflict.iter().copied()
    }

    pub fn is_in_conflict(&self, vi: VarId) -> bool {
        self.variables_in_conflict.contains(&vi)
    }

    /// Applies `bound` as a candidate lower bound on `vi` at `level`,
    /// returning `true` if it improved (and was therefore applied).
    /// An applied bound that now contradicts the existing upper bound
    /// or a disequality pinning the interval to a point files `vi`
    /// into `variables_in_conflict`.
    pub fn update_lower_bound(&mut self, vi: VarId, level: usize, bound: Bound) -> bool {
        self.grow_to(vi);
        if !bound.improves_lower(&self.lower[vi].get().clone()) {
            return false;
        }
        self.lower[vi].set(level, Some(bound));
        self.recheck_conflict(vi);
        true
    }

    pub fn update_upper_bound(&mut self, vi: VarId, level: usize, bound: Bound) -> bool {
        self.grow_to(vi);
        if !bound.improves_upper(&self.upper[vi].get().clone()) {
            return false;
        }
        self.upper[vi].set(level, Some(bound));
        self.recheck_conflict(vi);
        true
    }

    /// Records `vi != value`, returning `true` if this is a new
    /// disequality (duplicates are silently ignored, matching the
    /// original's idempotent `addDisequality`).
    pub fn add_disequality(&mut self, vi: VarId, level: usize, d: Disequality) -> bool {
        self.grow_to(vi);
        if self.is_disequal(vi, d.value) {
            return false;
        }
        self.disequal[vi].push(level, d);
        self.recheck_conflict(vi);
        true
    }

    fn recheck_conflict(&mut self, vi: VarId) {
        let conflict = self.computes_conflict(vi);
        if conflict {
            self.variables_in_conflict.insert(vi);
        } else {
            self.variables_in_conflict.remove(&vi);
        }
    }

    fn computes_conflict(&self, vi: VarId) -> bool {
        let l = self.lower(vi);
        let u = self.upper(vi);
        if let (Some(l), Some(u)) = (l, u) {
            if l.value > u.value || (l.value == u.value && (l.strict || u.strict)) {
                return true;
            }
            if l.value == u.value && !l.strict && !u.strict && self.is_disequal(vi, l.value) {
                return true;
            }
        }
        false
    }

    /// Rolls every variable's bounds/disequalities back to `level`.
    /// `variables_in_conflict` is recomputed from scratch afterward
    /// (cheap relative to search, and keeps it exactly consistent
    /// with whatever bounds survive the pop) rather than trying to
    /// incrementally undo conflict-set membership alongside the undo
    /// trail.
    pub fn pop_to_level(&mut self, level: usize) {
        for c in self.lower.iter_mut() {
            c.pop_to(level);
        }
        for c in self.upper.iter_mut() {
            c.pop_to(level);
        }
        for l in self.disequal.iter_mut() {
            l.pop_to(level);
        }
        self.variables_in_conflict.clear();
        for vi in 0..self.lower.len() {
            if self.computes_conflict(vi) {
                self.variables_in_conflict.insert(vi);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NULL_LIT;

    fn b(v: i64, strict: bool, level: usize) -> Bound {
        Bound {
            value: Rational::from_integer(v),
            strict,
            reason: NULL_LIT,
            level,
        }
    }

    #[test]
    fn opposing_bounds_conflict() {
        let mut m = CdBoundsModel::new();
        assert!(m.update_lower_bound(1, 1, b(3, false, 1)));
        assert!(!m.is_in_conflict(1));
        assert!(m.update_upper_bound(1, 2, b(2, false, 2)));
        assert!(m.is_in_conflict(1));
    }

    #[test]
    fn pop_restores_exact_prior_state() {
        let mut m = CdBoundsModel::new();
        m.update_lower_bound(1, 1, b(0, false, 1));
        m.update_upper_bound(1, 1, b(3, false, 1));
        m.update_lower_bound(1, 2, b(1, false, 2));
        m.update_upper_bound(1, 3, b(2, false, 3));
        assert_eq!(m.lower(1).unwrap().value, Rational::from_integer(1));
        assert_eq!(m.upper(1).unwrap().value, Rational::from_integer(2));
        m.pop_to_level(2);
        assert_eq!(m.lower(1).unwrap().value, Rational::from_integer(1));
        assert_eq!(m.upper(1).unwrap().value, Rational::from_integer(3));
        m.pop_to_level(1);
        assert_eq!(m.lower(1).unwrap().value, Rational::from_integer(0));
        assert_eq!(m.upper(1).unwrap().value, Rational::from_integer(3));
    }

    #[test]
    fn disequal_point_interval_is_a_conflict() {
        let mut m = CdBoundsModel::new();
        m.update_lower_bound(1, 1, b(2, false, 1));
        m.update_upper_bound(1, 1, b(2, false, 1));
        assert!(!m.is_in_conflict(1));
        m.add_disequality(
            1,
            2,
            Disequality {
                value: Rational::from_integer(2),
                reason: NULL_LIT,
                level: 2,
            },
        );
        assert!(m.is_in_conflict(1));
    }
}
