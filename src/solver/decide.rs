//! Decision dispatch: ask the Boolean engine first, then each theory
//! plugin in registration order, stopping at the first one that
//! actually commits to a choice.
//!
//! Grounded on the teacher's own decision step in `search` (always a
//! Boolean var_order pick) generalized to the plugin fabric's
//! round-robin convention used for `propagate` in `solver.rs`: decide
//! only runs when propagation has already reached a fixpoint with no
//! conflict, and only one plugin gets to move per call.

use crate::plugins::bcp::BoolPlugin;
use crate::plugins::{Features, Plugin, PluginContext};
use crate::solver::conflict::BOOL_PLUGIN_ID;
use crate::trail::Trail;
use crate::types::Lit;

/// Tries the Boolean engine, then every theory plugin advertising
/// `CAN_DECIDE`, in order. `hints` are literals the caller would
/// prefer satisfied first (used to steer a re-decision after a
/// coalesced backtrack handed back a clause that still isn't unit);
/// plugins that don't care about hints just fall back to their plain
/// `decide`. Returns `true` as soon as one plugin commits to a choice.
pub fn decide_round(trail: &mut Trail, bool_plugin: &mut BoolPlugin, theory_plugins: &mut [Box<dyn Plugin>], hints: &[Lit]) -> bool {
    if bool_plugin.feature_set().contains(Features::CAN_DECIDE) {
        let mut ctx = PluginContext {
            trail,
            plugin_id: BOOL_PLUGIN_ID,
        };
        if bool_plugin.decide_with_hints(&mut ctx, hints) {
            return true;
        }
    }
    for (i, plugin) in theory_plugins.iter_mut().enumerate() {
        if !plugin.feature_set().contains(Features::CAN_DECIDE) {
            continue;
        }
        let mut ctx = PluginContext {
            trail,
            plugin_id: i + 1,
        };
        if plugin.decide_with_hints(&mut ctx, hints) {
            return true;
        }
    }
    false
}
