//! Plugin registry: maps a stable string id to a factory closure, the
//! way the original's `MCSAT_REGISTER_PLUGIN` macro registers a
//! constructor under the plugin's name. Rust has no static-init
//! registration macro as convenient as the C++ one, so registration is
//! explicit: `Solver::new` calls `register` for each plugin it wants.

use super::Plugin;
use crate::error::{McSatError, Result};
use std::collections::HashMap;

type Factory = Box<dyn Fn() -> Box<dyn Plugin>>;

#[derive(Default)]
pub struct PluginRegistry {
    factories: HashMap<String, Factory>,
}

impl PluginRegistry {
    pub fn new() -> PluginRegistry {
        PluginRegistry {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, id: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Plugin> + 'static,
    {
        if self.factories.contains_key(id) {
            return Err(McSatError::DuplicatePlugin(id.to_string()));
        }
        self.factories.insert(id.to_string(), Box::new(factory));
        Ok(())
    }

    pub fn create(&self, id: &str) -> Result<Box<dyn Plugin>> {
        self.factories
            .get(id)
            .map(|f| f())
            .ok_or_else(|| McSatError::UnknownPlugin(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::ackermann::AckermannPlugin;

    #[test]
    fn unknown_plugin_is_a_factory_error() {
        let reg = PluginRegistry::new();
        assert!(matches!(reg.create("nope"), Err(McSatError::UnknownPlugin(_))));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = PluginRegistry::new();
        reg.register("ackermann", || Box::new(AckermannPlugin::default()))
            .unwrap();
        assert!(matches!(
            reg.register("ackermann", || Box::new(AckermannPlugin::default())),
            Err(McSatError::DuplicatePlugin(_))
        ));
    }
}
