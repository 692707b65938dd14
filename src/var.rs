//! The variable database: interns variables, tracks which "type
//! index" (Boolean vs. a given arithmetic sort) each belongs to, and
//! runs the GC compaction pass the plugin fabric triggers alongside a
//! clause-database GC.
//!
//! Grounded on the teacher's `var` module (`Var`, `VarIdHeap`): this
//! keeps the same "dense arena of small per-variable records plus an
//! activity-ordered heap" shape, generalized from a single Boolean
//! pool to one arena shared across type indices.

use crate::types::VarId;
use std::collections::HashMap;

/// A per-variable record. `activity` drives the decision heap shared
/// by any plugin that wants variable-activity-ordered decisions (the
/// Boolean engine reads it directly; the arithmetic plugin keeps its
/// own separate priority queue, see `plugins::fm::priority`).
#[derive(Clone, Debug)]
pub struct Var {
    pub id: VarId,
    pub type_index: usize,
    pub activity: f64,
}

/// Dense variable arena plus a name -> id intern table. Variables are
/// never removed individually; [`VarDb::perform_gc`] compacts the
/// whole arena at once, the way the clause farm's GC relocates clauses
/// in one pass rather than one at a time.
#[derive(Default)]
pub struct VarDb {
    vars: Vec<Var>,
    intern: HashMap<String, VarId>,
    var_inc: f64,
}

impl VarDb {
    pub fn new() -> VarDb {
        let mut db = VarDb {
            vars: Vec::new(),
            intern: HashMap::new(),
            var_inc: 1.0,
        };
        // index 0 is reserved as the null variable.
        db.vars.push(Var {
            id: 0,
            type_index: usize::MAX,
            activity: 0.0,
        });
        db
    }

    /// Interns `name` under `type_index`, creating a fresh variable if
    /// this is the first time it's seen. Returns the (possibly
    /// pre-existing) id.
    pub fn intern(&mut self, name: &str, type_index: usize) -> VarId {
        if let Some(&id) = self.intern.get(name) {
            return id;
        }
        let id = self.vars.len();
        self.vars.push(Var {
            id,
            type_index,
            activity: 0.0,
        });
        self.intern.insert(name.to_string(), id);
        self.new_variable_notify(id);
        id
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.intern.contains_key(name)
    }

    pub fn variable_of(&self, name: &str) -> Option<VarId> {
        self.intern.get(name).copied()
    }

    pub fn type_index(&self, vi: VarId) -> usize {
        self.vars[vi].type_index
    }

    pub fn len(&self) -> usize {
        self.vars.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hook called whenever a new variable is created. Plugins that
    /// need to react to new variables (the arithmetic plugin grows its
    /// per-variable unit-info table here) observe this indirectly
    /// through the plugin fabric's own `notify_new_variable` dispatch;
    /// the database itself just logs.
    fn new_variable_notify(&self, vi: VarId) {
        log::trace!("new variable interned: {}", vi);
    }

    pub fn activity(&self, vi: VarId) -> f64 {
        self.vars[vi].activity
    }

    /// Bumps `vi`'s activity by the current increment, rescaling every
    /// variable's activity (and the increment itself) if the bump
    /// would push any score past the rescale threshold — the same
    /// `1e20` / `1e-20` halving the teacher applies to clause
    /// activities, applied here to variables instead.
    pub fn bump_activity(&mut self, vi: VarId, rescale_threshold: f64) {
        self.vars[vi].activity += self.var_inc;
        if self.vars[vi].activity > rescale_threshold {
            for v in self.vars.iter_mut() {
                v.activity *= 1.0 / rescale_threshold;
            }
            self.var_inc *= 1.0 / rescale_threshold;
        }
    }

    pub fn decay_activity(&mut self, decay: f64) {
        self.var_inc *= 1.0 / decay;
    }

    /// Two-phase GC: `mark` decides which variables are still
    /// reachable (referenced by a live clause or a plugin's own
    /// state), `perform_gc` compacts the arena and returns the id
    /// remapping so callers can relocate their own indices.
    pub fn perform_gc(&mut self, keep: impl Fn(VarId) -> bool) -> HashMap<VarId, VarId> {
        let mut remap = HashMap::new();
        let mut compacted = Vec::with_capacity(self.vars.len());
        compacted.push(self.vars[0].clone());
        remap.insert(0, 0);
        for v in self.vars.iter().skip(1) {
            if keep(v.id) {
                let new_id = compacted.len();
                remap.insert(v.id, new_id);
                let mut nv = v.clone();
                nv.id = new_id;
                compacted.push(nv);
            }
        }
        self.vars = compacted;
        self.intern
            .retain(|_, id| remap.contains_key(id));
        for id in self.intern.values_mut() {
            if let Some(&new_id) = remap.get(id) {
                *id = new_id;
            }
        }
        remap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut db = VarDb::new();
        let a = db.intern("x", 0);
        let b = db.intern("x", 0);
        assert_eq!(a, b);
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn gc_compacts_and_remaps() {
        let mut db = VarDb::new();
        let x = db.intern("x", 0);
        let _y = db.intern("y", 0);
        let z = db.intern("z", 0);
        let remap = db.perform_gc(|id| id == x || id == z);
        assert_eq!(db.len(), 2);
        assert!(remap.contains_key(&x));
        assert!(remap.contains_key(&z));
    }
}
