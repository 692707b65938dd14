//! Linear-constraint parsing and canonicalization.
//!
//! Grounded directly on CVC4's `mcsat/fm/linear_constraint.cpp`: walk
//! the atom term accumulating `Σ coeff·var + const`, reject anything
//! non-linear, and canonicalize the relation so only `{EQ, GT, GEQ,
//! DISTINCT}` are ever stored (an asserted `LT`/`LEQ`, or the negation
//! of a `GT`/`GEQ`, is represented by flipping the coefficients'
//! signs instead of keeping a fifth/sixth relation kind around).

use crate::types::{Rational, VarId};
use std::collections::BTreeMap;

/// The term grammar this crate's arithmetic plugin can parse. Full
/// term construction/hash-consing is an external collaborator (spec
/// §1's "out of scope" list); this is the minimal shape `parse` needs
/// to walk, matching what a ground linear arithmetic atom looks like
/// once the term rewriter (also external) has normalized it.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Var(VarId),
    Const(Rational),
    Add(Vec<Term>),
    /// `coeff * term`. Linear only if `coeff` doesn't itself contain a
    /// variable, which by construction it never does here; a `Mult`
    /// of two non-constant subterms has no representation in this
    /// grammar and such atoms are simply never handed to `parse`.
    Mult(Rational, Box<Term>),
    Neg(Box<Term>),
}

/// The relation an atom asserts before any De Morgan/sign-flip
/// canonicalization is applied — i.e. exactly the six comparison
/// operators a rewritten arithmetic atom can carry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RawRel {
    Eq,
    Distinct,
    Lt,
    Leq,
    Gt,
    Geq,
}

impl RawRel {
    /// De Morgan: the relation asserted by `not(term REL 0)`.
    pub fn negate(self) -> RawRel {
        match self {
            RawRel::Eq => RawRel::Distinct,
            RawRel::Distinct => RawRel::Eq,
            RawRel::Lt => RawRel::Geq,
            RawRel::Leq => RawRel::Gt,
            RawRel::Gt => RawRel::Leq,
            RawRel::Geq => RawRel::Lt,
        }
    }

    /// The relation asserted by `(-term) REL 0`, i.e. multiplying the
    /// left-hand side by -1. Involutive by construction (applying it
    /// twice is the identity), resolving the Open Question about the
    /// original's `flipKind` table: `GT` and `LT` swap, `GEQ` and
    /// `LEQ` swap, `EQ`/`DISTINCT` are self-flips.
    pub fn flip_sign(self) -> RawRel {
        match self {
            RawRel::Eq => RawRel::Eq,
            RawRel::Distinct => RawRel::Distinct,
            RawRel::Lt => RawRel::Gt,
            RawRel::Gt => RawRel::Lt,
            RawRel::Leq => RawRel::Geq,
            RawRel::Geq => RawRel::Leq,
        }
    }
}

/// The canonical relation kinds a stored [`LinearConstraint`] may
/// carry. `LT`/`LEQ` never appear: `parse` eliminates them by sign
/// flip before construction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelKind {
    Eq,
    Gt,
    Geq,
    Distinct,
}

impl RelKind {
    /// Resolution dominance order used when Fourier-Motzkin-combining
    /// two constraints: the combined relation is the strictest of the
    /// two inputs. `GT` dominates `GEQ` dominates `EQ`.
    pub fn strictness(self) -> u8 {
        match self {
            RelKind::Gt => 2,
            RelKind::Geq => 1,
            RelKind::Eq => 0,
            RelKind::Distinct => 0,
        }
    }

    pub fn strictest(self, other: RelKind) -> RelKind {
        if self.strictness() >= other.strictness() {
            self
        } else {
            other
        }
    }
}

/// `Σ coeff·var + const (rel) 0`, with the constant term stored under
/// the null variable id `0` (never a real interned variable) per
/// spec §3. Zero coefficients are pruned on construction except the
/// constant term, which is always present (possibly zero) so
/// `to_term` round-trips without special-casing "no constant".
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    pub coeffs: BTreeMap<VarId, Rational>,
    pub kind: RelKind,
}

const CONST_KEY: VarId = 0;

impl LinearConstraint {
    /// Parses `term (raw) 0` as asserted by a literal of polarity
    /// `positive`, canonicalizing the relation so only `{EQ, GT, GEQ,
    /// DISTINCT}` are ever produced. Returns `None` if `term` is
    /// non-linear (a `Mult` whose either side still contains a
    /// variable after flattening, or any other non-linear shape) —
    /// per spec §7 kind 2, this is a silent decline, not an error.
    pub fn parse(term: &Term, raw: RawRel, positive: bool) -> Option<LinearConstraint> {
        let rel = if positive { raw } else { raw.negate() };
        let (rel, sign) = if matches!(rel, RawRel::Lt | RawRel::Leq) {
            (rel.flip_sign(), Rational::from_integer(-1))
        } else {
            (rel, Rational::from_integer(1))
        };
        let kind = match rel {
            RawRel::Eq => RelKind::Eq,
            RawRel::Distinct => RelKind::Distinct,
            RawRel::Gt => RelKind::Gt,
            RawRel::Geq => RelKind::Geq,
            RawRel::Lt | RawRel::Leq => unreachable!("flip_sign eliminates Lt/Leq above"),
        };
        let mut coeffs = BTreeMap::new();
        accumulate(term, sign, &mut coeffs)?;
        coeffs.retain(|vi, c| *vi == CONST_KEY || !c.is_zero_ratio());
        coeffs.entry(CONST_KEY).or_insert_with(|| Rational::from_integer(0));
        Some(LinearConstraint { coeffs, kind })
    }

    pub fn constant(&self) -> Rational {
        self.coeffs.get(&CONST_KEY).copied().unwrap_or_else(|| Rational::from_integer(0))
    }

    pub fn coeff(&self, vi: VarId) -> Rational {
        self.coeffs.get(&vi).copied().unwrap_or_else(|| Rational::from_integer(0))
    }

    /// Every variable this constraint mentions, excluding the
    /// constant-term slot.
    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.coeffs.keys().copied().filter(|&vi| vi != CONST_KEY)
    }

    pub fn is_empty_of_variables(&self) -> bool {
        self.variables().next().is_none()
    }

    /// Rebuilds a `Term` from this constraint — the other half of the
    /// idempotence property spec §8 requires
    /// (`parse(lit); to_term()` round-trips modulo canonicalization).
    pub fn to_term(&self) -> Term {
        let mut parts: Vec<Term> = self
            .coeffs
            .iter()
            .filter(|(vi, _)| **vi != CONST_KEY)
            .map(|(&vi, &c)| Term::Mult(c, Box::new(Term::Var(vi))))
            .collect();
        let k = self.constant();
        if !k.is_zero_ratio() || parts.is_empty() {
            parts.push(Term::Const(k));
        }
        if parts.len() == 1 {
            parts.pop().unwrap()
        } else {
            Term::Add(parts)
        }
    }

    pub fn raw_rel(&self) -> RawRel {
        match self.kind {
            RelKind::Eq => RawRel::Eq,
            RelKind::Distinct => RawRel::Distinct,
            RelKind::Gt => RawRel::Gt,
            RelKind::Geq => RawRel::Geq,
        }
    }

    /// The constraint asserted when the atom this constraint came from
    /// is assigned the opposite polarity on the trail: De Morgan over
    /// the canonical relation (`EQ`/`DISTINCT` swap outright; `GT`/`GEQ`
    /// sign-flip into the other since `LT`/`LEQ` are never stored).
    /// Involutive, matching [`RawRel::flip_sign`]'s resolution of the
    /// same Open Question.
    pub fn negate(&self) -> LinearConstraint {
        match self.kind {
            RelKind::Eq => LinearConstraint {
                coeffs: self.coeffs.clone(),
                kind: RelKind::Distinct,
            },
            RelKind::Distinct => LinearConstraint {
                coeffs: self.coeffs.clone(),
                kind: RelKind::Eq,
            },
            RelKind::Gt => self.sign_flipped(RelKind::Geq),
            RelKind::Geq => self.sign_flipped(RelKind::Gt),
        }
    }

    fn sign_flipped(&self, kind: RelKind) -> LinearConstraint {
        let coeffs = self.coeffs.iter().map(|(&vi, &c)| (vi, -c)).collect();
        LinearConstraint { coeffs, kind }
    }
}

/// Small helper trait so `is_zero_ratio`/`from_integer` calls above
/// read without importing `num_traits` just for `Zero`.
trait RationalExt {
    fn is_zero_ratio(&self) -> bool;
}

impl RationalExt for Rational {
    fn is_zero_ratio(&self) -> bool {
        *self.numer() == 0
    }
}

fn accumulate(term: &Term, scale: Rational, out: &mut BTreeMap<VarId, Rational>) -> Option<()> {
    match term {
        Term::Var(vi) => {
            *out.entry(*vi).or_insert_with(|| Rational::from_integer(0)) += scale;
            Some(())
        }
        Term::Const(c) => {
            *out.entry(CONST_KEY).or_insert_with(|| Rational::from_integer(0)) += scale * c;
            Some(())
        }
        Term::Add(ts) => {
            for t in ts {
                accumulate(t, scale, out)?;
            }
            Some(())
        }
        Term::Mult(c, t) => accumulate(t, scale * c, out),
        Term::Neg(t) => accumulate(t, -scale, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(vi: VarId) -> Term {
        Term::Var(vi)
    }

    fn c(n: i64) -> Rational {
        Rational::from_integer(n)
    }

    #[test]
    fn parses_simple_geq() {
        // x - 3 >= 0, positive literal, already canonical.
        let t = Term::Add(vec![var(1), Term::Const(c(-3))]);
        let lc = LinearConstraint::parse(&t, RawRel::Geq, true).unwrap();
        assert_eq!(lc.kind, RelKind::Geq);
        assert_eq!(lc.coeff(1), c(1));
        assert_eq!(lc.constant(), c(-3));
    }

    #[test]
    fn negated_literal_applies_de_morgan() {
        // not(x >= 3)  <=>  x < 3  <=>  (canonicalized) -x + 3 > 0
        let t = Term::Add(vec![var(1), Term::Const(c(-3))]);
        let lc = LinearConstraint::parse(&t, RawRel::Geq, false).unwrap();
        assert_eq!(lc.kind, RelKind::Gt);
        assert_eq!(lc.coeff(1), c(-1));
        assert_eq!(lc.constant(), c(3));
    }

    #[test]
    fn lt_is_canonicalized_to_gt_by_sign_flip() {
        // x < 3  <=>  -x + 3 > 0
        let t = Term::Add(vec![var(1), Term::Const(c(-3))]);
        let lc = LinearConstraint::parse(&t, RawRel::Lt, true).unwrap();
        assert_eq!(lc.kind, RelKind::Gt);
        assert_eq!(lc.coeff(1), c(-1));
        assert_eq!(lc.constant(), c(3));
    }

    #[test]
    fn flip_sign_is_involutive() {
        for rel in [RawRel::Eq, RawRel::Distinct, RawRel::Lt, RawRel::Leq, RawRel::Gt, RawRel::Geq] {
            assert_eq!(rel.flip_sign().flip_sign(), rel);
        }
    }

    #[test]
    fn zero_coefficients_are_pruned() {
        // x + y - y - 2 >= 0  ->  x - 2 >= 0 (y coefficient cancels to 0).
        let t = Term::Add(vec![var(1), var(2), Term::Neg(Box::new(var(2))), Term::Const(c(-2))]);
        let lc = LinearConstraint::parse(&t, RawRel::Geq, true).unwrap();
        assert!(!lc.coeffs.contains_key(&2));
        assert_eq!(lc.coeff(1), c(1));
    }

    #[test]
    fn negate_is_involutive_and_flips_satisfaction() {
        // x - 3 >= 0
        let t = Term::Add(vec![var(1), Term::Const(c(-3))]);
        let lc = LinearConstraint::parse(&t, RawRel::Geq, true).unwrap();
        let not_lc = lc.negate();
        assert_eq!(not_lc.kind, RelKind::Gt);
        assert_eq!(not_lc.coeff(1), c(-1));
        assert_eq!(not_lc.constant(), c(3));
        assert_eq!(not_lc.negate(), lc);
    }

    #[test]
    fn parse_then_to_term_then_parse_is_idempotent() {
        let t = Term::Add(vec![Term::Mult(c(2), Box::new(var(1))), Term::Const(c(-3))]);
        let lc = LinearConstraint::parse(&t, RawRel::Gt, true).unwrap();
        let back = LinearConstraint::parse(&lc.to_term(), lc.raw_rel(), true).unwrap();
        assert_eq!(lc, back);
    }
}
