//! The crate's error type.
//!
//! Per the solver's error-handling design, most failure kinds are not
//! `Result`s at all: invariant violations are `debug_assert!`/`panic!`
//! (a correct driver cannot trigger them), parse rejection is
//! `Option::None`, and logical UNSAT is the plain `bool` returned by
//! [`crate::solver::Solver::check`]. `McSatError` covers the one kind
//! that is a genuine, synchronous, caller-recoverable failure: asking
//! the plugin registry for an id it doesn't know.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McSatError {
    #[error("unknown plugin id: {0}")]
    UnknownPlugin(String),
    #[error("plugin id already registered: {0}")]
    DuplicatePlugin(String),
}

pub type Result<T> = std::result::Result<T, McSatError>;
