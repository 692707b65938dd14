//! Interface-level stub for the equality/uninterpreted-function
//! theory. Theory combination beyond what the plugin fabric itself
//! composes is explicitly out of scope, so this plugin registers with
//! an empty feature set and never propagates or decides; it exists so
//! the plugin registry has a named slot to fill in when UF reasoning
//! is added later, the way the original's congruence-closure plugin
//! sits beside the arithmetic one.

use crate::cdb::ClauseId;
use crate::types::Lit;

use super::{Features, Plugin, PluginContext};

#[derive(Default)]
pub struct AckermannPlugin;

impl Plugin for AckermannPlugin {
    fn feature_set(&self) -> Features {
        Features::empty()
    }

    fn propagate(&mut self, _ctx: &mut PluginContext) -> bool {
        false
    }

    fn decide(&mut self, _ctx: &mut PluginContext) -> bool {
        false
    }

    fn explain(&self, _propagated: Lit) -> Vec<Lit> {
        Vec::new()
    }

    fn gc_relocate(&mut self, _clause_remap: &std::collections::HashMap<ClauseId, ClauseId>) {}
}
