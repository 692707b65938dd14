//! Solver configuration, built the way the teacher builds its own
//! `Config`: a `structopt`-derived struct with sane defaults, usable
//! both as a CLI front-end and as a plain struct an embedder
//! constructs directly.

use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "mcsat", about = "An MCSAT search core")]
pub struct Config {
    /// Ground-formula input file (see `src/bin/mcsat.rs` for the
    /// minimal text format this front-end accepts).
    #[structopt(parse(from_os_str))]
    pub input: Option<PathBuf>,

    /// Length of the fast (assignment-rate) EMA window used by the
    /// restart heuristic.
    #[structopt(long = "restart-asg-len", default_value = "3500")]
    pub restart_asg_len: usize,

    /// Length of the slow (LBD) EMA window used by the restart
    /// heuristic.
    #[structopt(long = "restart-lbd-len", default_value = "50")]
    pub restart_lbd_len: usize,

    /// Blocking-restart threshold: a restart request is suppressed
    /// when the fast assignment EMA exceeds this multiple of the slow
    /// one.
    #[structopt(long = "restart-blocking", default_value = "1.40")]
    pub restart_blocking: f64,

    /// Forcing-restart threshold on the LBD EMA ratio.
    #[structopt(long = "restart-threshold", default_value = "0.70")]
    pub restart_threshold: f64,

    /// Clause-activity and variable-activity rescale threshold; once
    /// any score would exceed this, every score in the same pool is
    /// multiplied by its reciprocal.
    #[structopt(long = "rescale-threshold", default_value = "1e20")]
    pub rescale_threshold: f64,

    /// Number of conflicts between clause-database reductions.
    #[structopt(long = "reduce-interval", default_value = "1000")]
    pub reduce_interval: usize,

    /// Run a clause-database GC on every restart rather than only
    /// when the farm's own growth trigger fires. Resolves spec's open
    /// question about GC-on-restart as an explicit, overridable
    /// policy rather than a hard-coded `true`.
    #[structopt(long = "gc-on-restart")]
    pub gc_on_restart: bool,

    /// Chronological-backtrack threshold: conflicts whose computed
    /// backjump level is within this many levels of the conflict level
    /// backtrack chronologically instead of to the 1-UIP level.
    #[structopt(long = "chronobt-threshold", default_value = "100")]
    pub chronobt_threshold: usize,

    /// Bias window used by the arithmetic plugin's integer
    /// value-picking heuristic (how many consecutive integers around a
    /// tight bound are preferred before widening the search).
    #[structopt(long = "int-pick-window", default_value = "2")]
    pub int_pick_window: i64,

    /// Suppress the progress line the CLI front-end prints per
    /// restart.
    #[structopt(short = "q", long = "quiet")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            input: None,
            restart_asg_len: 3500,
            restart_lbd_len: 50,
            restart_blocking: 1.40,
            restart_threshold: 0.70,
            rescale_threshold: 1e20,
            reduce_interval: 1000,
            gc_on_restart: true,
            chronobt_threshold: 100,
            int_pick_window: 2,
            quiet: false,
        }
    }
}
