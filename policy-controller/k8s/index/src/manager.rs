//! The plugin registry.
//!
//! Registration happens once, single-threaded, at startup; after that the
//! manager is read-only and hands out defensive copies of its map.

use crate::{
    plugins::{ContributesPolicies, SharedPlugin},
    AgwCollections,
};
use agentgateway_policy_controller_core::{Errors, GroupKind, Policy};
use std::collections::hash_map::Entry;

#[derive(Default)]
pub struct PolicyManager {
    plugins: ContributesPolicies,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("a plugin for {group_kind} is already registered by {existing}")]
    DuplicateGroupKind {
        group_kind: GroupKind,
        existing: String,
    },
}

// === impl PolicyManager ===

impl PolicyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin for its GroupKind.
    ///
    /// A second registration for an already-claimed kind is rejected and
    /// leaves the first registration intact. This is a configuration error,
    /// fatal at startup.
    pub fn register_plugin(&mut self, plugin: SharedPlugin) -> Result<(), RegistrationError> {
        let group_kind = plugin.group_kind();
        match self.plugins.entry(group_kind.clone()) {
            Entry::Occupied(entry) => Err(RegistrationError::DuplicateGroupKind {
                group_kind,
                existing: entry.get().name().to_string(),
            }),
            Entry::Vacant(entry) => {
                tracing::debug!(plugin = plugin.name(), %group_kind, "registered plugin");
                entry.insert(plugin);
                Ok(())
            }
        }
    }

    pub fn plugin_for(&self, group_kind: &GroupKind) -> Option<SharedPlugin> {
        self.plugins.get(group_kind).cloned()
    }

    /// A copy of the registry map. Callers cannot mutate live state.
    pub fn contributes_policies(&self) -> ContributesPolicies {
        self.plugins.clone()
    }

    /// Runs every registered plugin and returns the union of their outputs.
    ///
    /// A failing plugin never stops iteration; its error is wrapped with
    /// the plugin's name and kind, logged, and returned in the aggregate so
    /// callers can decide whether the partial set is acceptable.
    pub fn generate_all_policies(
        &self,
        collections: &AgwCollections,
    ) -> (Vec<Policy>, Option<Errors>) {
        let mut policies = Vec::new();
        let mut errors = Errors::default();

        for (group_kind, plugin) in &self.plugins {
            match plugin.generate_policies(collections) {
                Ok(mut generated) => {
                    tracing::trace!(
                        plugin = plugin.name(),
                        %group_kind,
                        count = generated.len(),
                        "generated policies"
                    );
                    policies.append(&mut generated);
                }
                Err(error) => {
                    tracing::warn!(
                        %error,
                        plugin = plugin.name(),
                        %group_kind,
                        "policy generation failed"
                    );
                    errors.push(
                        error.context(format!("plugin {} ({group_kind})", plugin.name())),
                    );
                }
            }
        }

        (policies, errors.into_option())
    }
}
