//! Thin CLI front-end: parse `Config`, read a DIMACS-style ground-CNF
//! file, build a `Solver`, run `check()`, and report SAT/UNSAT plus a
//! model dump.
//!
//! Grounded on `splr`'s own binary (`src/bin/splr.rs`) for the overall
//! shape (`Config::from_args`, a colored SAT/UNSAT line, a model dump
//! on stdout); narrowed since full DIMACS tooling (proof certificates,
//! `.ans` result files, a progress-line reporter reading internal
//! solver state) is outside this core's scope. Parsing a file of
//! already-ground clauses is not CNF *conversion* (out of scope per
//! spec's Non-goals) — it is exactly the "formula already arrived as a
//! list of clauses" case `CnfPlugin::add_assertion` exists for.

use mcsat_core::config::Config;
use mcsat_core::solver::Solver;
use mcsat_core::types::{Lit, ModelValue, VarId};
use std::collections::HashMap;
use std::fs;
use std::process;
use structopt::StructOpt;

const RED: &str = "\x1B[001m\x1B[031m";
const GREEN: &str = "\x1B[001m\x1B[032m";
const BLUE: &str = "\x1B[001m\x1B[034m";
const RESET: &str = "\x1B[000m";

fn main() {
    let config = Config::from_args();
    let path = match &config.input {
        Some(p) => p.clone(),
        None => {
            eprintln!("mcsat: no input file given");
            process::exit(1);
        }
    };
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("mcsat: failed to read {}: {}", path.to_string_lossy(), e);
            process::exit(1);
        }
    };

    let mut solver = Solver::new(config).expect("built-in plugin registration cannot fail");
    let mut vars: HashMap<i32, VarId> = HashMap::new();
    let mut max_var = 0i32;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') || line.starts_with('p') {
            continue;
        }
        let mut lits = Vec::new();
        for tok in line.split_whitespace() {
            let n: i32 = match tok.parse() {
                Ok(n) => n,
                Err(_) => continue,
            };
            if n == 0 {
                continue;
            }
            let name = n.unsigned_abs();
            max_var = max_var.max(name as i32);
            let vi = *vars
                .entry(name as i32)
                .or_insert_with(|| solver.new_bool_variable(&name.to_string()));
            lits.push(Lit::from_sign(vi, n > 0));
        }
        if !lits.is_empty() {
            solver.add_assertion(lits);
        }
    }

    let sat = solver.check();
    if sat {
        println!("{}s SATISFIABLE{}", BLUE, RESET);
        print!("v ");
        for n in 1..=max_var {
            if let Some(&vi) = vars.get(&n) {
                if let Some(ModelValue::Bool(b)) = solver.value(vi) {
                    print!("{} ", if b { n } else { -n });
                }
            }
        }
        println!("0");
    } else {
        println!("{}s UNSATISFIABLE{}", GREEN, RESET);
    }
    let stats = solver.stats();
    eprintln!(
        "c decisions:{} conflicts:{} restarts:{} gcs:{}",
        stats.decisions, stats.conflicts, stats.restarts, stats.gcs
    );

    process::exit(if sat { 10 } else { 20 });
}
