/*!
# mcsat-core

An MCSAT (Model-Constructing Satisfiability) search core: a context
stack, a variable database, a clause farm, a solver trail, a plugin
fabric, and a Fourier-Motzkin linear-arithmetic plugin sitting beside a
watched-literal Boolean engine.

The crate implements the search loop itself; it does not build terms,
rewrite them, or turn arbitrary formulas into clauses. Callers hand it
already-ground Boolean/arithmetic atoms and drive `Solver::check`.
*/

/// `cdb` provides the clause farm: an arena of clauses addressed by
/// `CRef`, watch lists, and a two-phase mark/relocate garbage collector.
pub mod cdb;
/// `config` provides the solver's tunable parameters and CLI surface.
pub mod config;
/// `context` provides the generic context-dependent rollback log used
/// by every plugin that needs backtrackable state.
pub mod context;
/// `error` provides the crate's error type.
pub mod error;
/// `plugins` provides the plugin trait, the registry, and the concrete
/// plugins (Boolean propagation, CNF intake, the arithmetic plugin, and
/// the Ackermann/UF stub).
pub mod plugins;
/// `restart` provides EMA-based restart heuristics.
pub mod restart;
/// `solver` provides the top-level MCSAT search loop.
pub mod solver;
/// `trail` provides the solver trail: decisions, propagations, and
/// backtracking.
pub mod trail;
/// `types` provides the shared building blocks: `VarId`, `Lit`,
/// per-object flag bits, and small conversions.
pub mod types;
/// `var` provides the variable database.
pub mod var;

#[macro_use]
extern crate bitflags;

pub use crate::error::McSatError;
pub use crate::solver::Solver;
