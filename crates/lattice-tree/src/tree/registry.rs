//! Node registry: identifier assignment and validation.
//!
//! Identifiers are caller supplied and uniqueness is advisory. The registry
//! counts how many live records carry each id so a collision can be reported
//! as a warning when it happens, and it hands out `node-<n>` ids for records
//! that arrive without one.

use std::collections::HashMap;

use lattice_tree_core::targets;

#[derive(Debug, Default)]
pub(crate) struct NodeRegistry {
    counts: HashMap<String, usize>,
    next_auto_id: u64,
}

impl NodeRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers an id, assigning one when `requested` is `None`.
    ///
    /// A duplicate is logged and accepted.
    pub(crate) fn register(&mut self, requested: Option<String>) -> String {
        let id = match requested {
            Some(id) => id,
            None => self.next_auto(),
        };

        let count = self.counts.entry(id.clone()).or_insert(0);
        if *count > 0 {
            tracing::warn!(target: targets::INDEX, id = %id, "duplicate tree item id");
        }
        *count += 1;
        id
    }

    pub(crate) fn unregister(&mut self, id: &str) {
        if let Some(count) = self.counts.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(id);
            }
        }
    }

    /// Moves one registration from `old` to `new`.
    pub(crate) fn rename(&mut self, old: &str, new: &str) {
        self.unregister(old);
        self.register(Some(new.to_string()));
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.counts.contains_key(id)
    }

    pub(crate) fn is_duplicate(&self, id: &str) -> bool {
        self.counts.get(id).is_some_and(|&count| count > 1)
    }

    pub(crate) fn clear(&mut self) {
        self.counts.clear();
    }

    fn next_auto(&mut self) -> String {
        loop {
            self.next_auto_id += 1;
            let candidate = format!("node-{}", self.next_auto_id);
            if !self.counts.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}
