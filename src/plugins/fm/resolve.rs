//! Fourier-Motzkin resolution: eliminate a shared variable between two
//! opposing linear constraints by a coefficient-scaled addition.
//!
//! Grounded on CVC4's `mcsat/fm/fm_plugin.h` resolution step and the
//! spec §4.6 table (resulting kind = strictest of the two inputs,
//! `GT` > `GEQ` > `EQ`); the disequality case split is the original's
//! handling of a `DISTINCT` operand, which can't be added directly
//! (its "relation" isn't a half-plane) and is instead split into the
//! two half-planes it excludes.

use super::constraint::{LinearConstraint, RelKind};
use crate::types::{Rational, VarId};

/// Eliminates `x` from `c1` and `c2`, producing `|a2|*c1 + |a1|*c2`
/// where `a1`/`a2` are `x`'s coefficients in each. Requires
/// `sign(a1) != sign(a2)` (one constraint bounds `x` from below, the
/// other from above) — violating this is a caller bug, not a runtime
/// condition, so it's a `debug_assert!` per spec §7 kind 1.
pub fn eliminate(c1: &LinearConstraint, x: VarId, c2: &LinearConstraint) -> LinearConstraint {
    let a1 = c1.coeff(x);
    let a2 = c2.coeff(x);
    debug_assert!(a1 != Rational::from_integer(0) && a2 != Rational::from_integer(0));
    debug_assert!(
        (a1 > Rational::from_integer(0)) != (a2 > Rational::from_integer(0)),
        "Fourier-Motzkin elimination requires opposing signs on the eliminated variable"
    );
    let w1 = a2.abs_ratio();
    let w2 = a1.abs_ratio();
    combine(c1, w1, c2, w2, x)
}

fn combine(c1: &LinearConstraint, w1: Rational, c2: &LinearConstraint, w2: Rational, drop: VarId) -> LinearConstraint {
    use std::collections::BTreeMap;
    let mut coeffs: BTreeMap<VarId, Rational> = BTreeMap::new();
    for (&vi, &c) in c1.coeffs.iter() {
        *coeffs.entry(vi).or_insert_with(|| Rational::from_integer(0)) += w1 * c;
    }
    for (&vi, &c) in c2.coeffs.iter() {
        *coeffs.entry(vi).or_insert_with(|| Rational::from_integer(0)) += w2 * c;
    }
    coeffs.remove(&drop);
    coeffs.retain(|_, c| *c != Rational::from_integer(0));
    coeffs.entry(0).or_insert_with(|| Rational::from_integer(0));
    LinearConstraint {
        coeffs,
        kind: c1.kind.strictest(c2.kind),
    }
}

/// Resolves `c1` (which names `x`) against a disequality `x != d` by
/// case-splitting on which side of `d` the rest of `c1`'s feasible
/// region falls: the disequality excludes the single point `d`, so
/// whichever direction opposes `c1`'s own coefficient on `x` is the
/// half of the split that can actually eliminate it (the other half
/// points the same way `c1` already does and contributes nothing new
/// to combine). Only that opposing half is built and eliminated —
/// building both, as a literal case split would, is unsound here since
/// `eliminate` requires opposing signs and `c1`'s sign can only oppose
/// one of the two.
pub fn eliminate_against_distinct(c1: &LinearConstraint, x: VarId, distinct_value: Rational) -> LinearConstraint {
    use std::collections::BTreeMap;
    let a1 = c1.coeff(x);
    let mut coeffs: BTreeMap<VarId, Rational> = BTreeMap::new();
    if a1 > Rational::from_integer(0) {
        // c1 bounds x from below; the opposing half is "x < d".
        coeffs.insert(x, Rational::from_integer(-1));
        coeffs.insert(0, distinct_value);
    } else {
        // c1 bounds x from above; the opposing half is "x > d".
        coeffs.insert(x, Rational::from_integer(1));
        coeffs.insert(0, -distinct_value);
    }
    let opposing = LinearConstraint { coeffs, kind: RelKind::Gt };
    eliminate(c1, x, &opposing)
}

trait RationalAbs {
    fn abs_ratio(self) -> Self;
}

impl RationalAbs for Rational {
    fn abs_ratio(self) -> Rational {
        if self < Rational::from_integer(0) {
            -self
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lc(coeffs: &[(VarId, i64)], k: i64, kind: RelKind) -> LinearConstraint {
        let mut m = BTreeMap::new();
        for &(vi, c) in coeffs {
            m.insert(vi, Rational::from_integer(c));
        }
        m.insert(0, Rational::from_integer(k));
        LinearConstraint { coeffs: m, kind }
    }

    #[test]
    fn eliminates_shared_variable() {
        // x - y + 1 >= 0  (x >= y - 1)
        let c1 = lc(&[(1, 1), (2, -1)], 1, RelKind::Geq);
        // -x + z - 2 > 0  (x < z - 2, i.e. z > x + 2)
        let c2 = lc(&[(1, -1), (3, 1)], -2, RelKind::Gt);
        let r = eliminate(&c1, 1, &c2);
        assert!(!r.coeffs.contains_key(&1));
        // y - 1 + z - 2 > 0  =>  y + z - 3 > 0
        assert_eq!(r.coeff(2), Rational::from_integer(1));
        assert_eq!(r.coeff(3), Rational::from_integer(1));
        assert_eq!(r.constant(), Rational::from_integer(-3));
        assert_eq!(r.kind, RelKind::Gt);
    }

    #[test]
    fn strictest_kind_dominates() {
        let c1 = lc(&[(1, 1)], 0, RelKind::Geq);
        let c2 = lc(&[(1, -1)], 0, RelKind::Gt);
        let r = eliminate(&c1, 1, &c2);
        assert_eq!(r.kind, RelKind::Gt);
    }
}
