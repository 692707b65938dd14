//! Integration tests exercising the numbered scenarios from the
//! trail/solver specification end to end, through the public
//! `Solver` API rather than any one module's internals.

use mcsat_core::config::Config;
use mcsat_core::plugins::fm::constraint::{LinearConstraint, RelKind};
use mcsat_core::solver::Solver;
use mcsat_core::types::{Lit, ModelValue, Rational};
use std::collections::BTreeMap;

fn new_solver() -> Solver {
    Solver::new(Config::default()).unwrap()
}

/// `a*x + k (kind) 0`, the single-variable constraint shape the unit
/// tests in `plugins::fm` build by hand.
fn linear(a: i64, x: mcsat_core::types::VarId, k: i64, kind: RelKind) -> LinearConstraint {
    let mut coeffs = BTreeMap::new();
    coeffs.insert(x, Rational::from_integer(a));
    coeffs.insert(0, Rational::from_integer(k));
    LinearConstraint { coeffs, kind }
}

/// Scenario 1: a pure Boolean propagation chain that is UNSAT.
/// `(a ∨ b), (¬a ∨ c), (¬b ∨ c), ¬c` forces `c` both ways.
#[test]
fn pure_sat_propagation_chain_is_unsat() {
    let mut s = new_solver();
    let a = s.new_bool_variable("a");
    let b = s.new_bool_variable("b");
    let c = s.new_bool_variable("c");

    s.add_assertion(vec![Lit::positive(a), Lit::positive(b)]);
    s.add_assertion(vec![Lit::negative(a), Lit::positive(c)]);
    s.add_assertion(vec![Lit::negative(b), Lit::positive(c)]);
    s.add_assertion(vec![Lit::negative(c)]);

    assert!(!s.check());
}

/// Scenario 2: `x >= 3` and `x <= 2` conflict immediately once both
/// atoms are asserted true, with no Boolean search needed at all.
#[test]
fn linear_arithmetic_bound_conflict_is_unsat() {
    let mut s = new_solver();
    let x = s.new_term_variable("x", false);

    let ge3 = s.new_bool_variable("x>=3");
    s.register_atom(ge3, linear(1, x, -3, RelKind::Geq)); // x - 3 >= 0
    let le2 = s.new_bool_variable("x<=2");
    s.register_atom(le2, linear(-1, x, 2, RelKind::Geq)); // -x + 2 >= 0

    s.add_assertion(vec![Lit::positive(ge3)]);
    s.add_assertion(vec![Lit::positive(le2)]);

    assert!(!s.check());
}

/// Scenario 3: `x >= 0, x <= 3, x != 0, x != 2` is SAT, and the model
/// the arithmetic plugin picks must land in the only feasible points,
/// `{1, 3}`.
#[test]
fn integer_picking_respects_disequalities() {
    let mut s = new_solver();
    let x = s.new_term_variable("x", true);

    let ge0 = s.new_bool_variable("x>=0");
    s.register_atom(ge0, linear(1, x, 0, RelKind::Geq));
    let le3 = s.new_bool_variable("x<=3");
    s.register_atom(le3, linear(-1, x, 3, RelKind::Geq));
    let ne0 = s.new_bool_variable("x!=0");
    s.register_atom(ne0, linear(1, x, 0, RelKind::Distinct));
    let ne2 = s.new_bool_variable("x!=2");
    s.register_atom(ne2, linear(1, x, -2, RelKind::Distinct));

    s.add_assertion(vec![Lit::positive(ge0)]);
    s.add_assertion(vec![Lit::positive(le3)]);
    s.add_assertion(vec![Lit::positive(ne0)]);
    s.add_assertion(vec![Lit::positive(ne2)]);

    assert!(s.check());
    let value = match s.value(x) {
        Some(ModelValue::Rational(r)) => r,
        other => panic!("expected a rational model value, got {:?}", other),
    };
    assert!(
        value == Rational::from_integer(1) || value == Rational::from_integer(3),
        "picked value {} is not in the feasible set {{1, 3}}",
        value
    );
}

/// A mixed Boolean/theory problem: `(p ∨ x>=5)` with `p` forced false
/// and `x <= 4` asserted must be UNSAT (the only Boolean escape is
/// blocked, and the arithmetic side is infeasible too).
#[test]
fn mixed_boolean_and_arithmetic_conflict() {
    let mut s = new_solver();
    let x = s.new_term_variable("x", false);
    let p = s.new_bool_variable("p");
    let ge5 = s.new_bool_variable("x>=5");
    s.register_atom(ge5, linear(1, x, -5, RelKind::Geq));
    let le4 = s.new_bool_variable("x<=4");
    s.register_atom(le4, linear(-1, x, 4, RelKind::Geq));

    s.add_assertion(vec![Lit::positive(p), Lit::positive(ge5)]);
    s.add_assertion(vec![Lit::negative(p)]);
    s.add_assertion(vec![Lit::positive(le4)]);

    assert!(!s.check());
}

/// A satisfiable mixed problem: once `p` is forced true, the clause
/// requiring `x >= 5` is vacuously satisfied, and `x`'s own bounds
/// (`0 <= x <= 10`) are consistent with no value being forced.
#[test]
fn mixed_boolean_and_arithmetic_sat() {
    let mut s = new_solver();
    let x = s.new_term_variable("x", false);
    let p = s.new_bool_variable("p");
    let ge5 = s.new_bool_variable("x>=5");
    s.register_atom(ge5, linear(1, x, -5, RelKind::Geq));
    let ge0 = s.new_bool_variable("x>=0");
    s.register_atom(ge0, linear(1, x, 0, RelKind::Geq));
    let le10 = s.new_bool_variable("x<=10");
    s.register_atom(le10, linear(-1, x, 10, RelKind::Geq));

    s.add_assertion(vec![Lit::positive(p)]);
    s.add_assertion(vec![Lit::positive(p), Lit::positive(ge5)]);
    s.add_assertion(vec![Lit::positive(ge0)]);
    s.add_assertion(vec![Lit::positive(le10)]);

    assert!(s.check());
}

/// `(a ∨ b), (¬a ∨ b), (a ∨ ¬b), (¬a ∨ ¬b)` is UNSAT, but unlike the
/// other scenarios here none of its clauses is unit: the solver has to
/// make a Boolean decision before anything propagates, so the
/// resulting conflict is analyzed above decision level 0 and actually
/// exercises the 1-UIP walk in `solver::conflict::analyze_conflict`
/// rather than the immediate-contradiction shortcut `handle_conflict`
/// takes for a level-0 conflict.
#[test]
fn unsat_requires_a_decision_before_the_conflict() {
    let mut s = new_solver();
    let a = s.new_bool_variable("a");
    let b = s.new_bool_variable("b");

    s.add_assertion(vec![Lit::positive(a), Lit::positive(b)]);
    s.add_assertion(vec![Lit::negative(a), Lit::positive(b)]);
    s.add_assertion(vec![Lit::positive(a), Lit::negative(b)]);
    s.add_assertion(vec![Lit::negative(a), Lit::negative(b)]);

    assert!(!s.check());
    assert!(s.stats().decisions >= 1, "this formula has no unit clause; reaching UNSAT requires at least one decision");
}
