//! Name → id mapping of rule chains known to the current session.

use std::collections::HashMap;

use crate::types::RuleChainId;

/// Rule chains imported (or found pre-existing) during one provisioning
/// session, keyed by name. Grows monotonically and is dropped with the
/// session.
#[derive(Debug, Default)]
pub struct ImportRegistry {
    by_name: HashMap<String, RuleChainId>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` → `id`. A later registration under the same name
    /// replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, id: RuleChainId) {
        let name = name.into();
        tracing::debug!(rule_chain = %name, id = %id, "Registered rule chain");
        self.by_name.insert(name, id);
    }

    pub fn get(&self, name: &str) -> Option<&RuleChainId> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
