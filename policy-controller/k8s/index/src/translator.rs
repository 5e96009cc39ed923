//! The composition root wiring collections, the merged plugin set, and the
//! backend translator together.

use crate::{
    backend::BackendTranslator,
    collections::AgwCollections,
    manager::PolicyManager,
    plugins::{self, merge_plugins, AgwPlugin},
    ClusterInfo,
};
use agentgateway_policy_controller_core::{Backend, BackendObjectIR, Errors, Policy};
use anyhow::Result;
use std::sync::Arc;

pub struct AgentGatewayTranslator {
    collections: AgwCollections,
    extensions: AgwPlugin,
    manager: PolicyManager,
    backends: BackendTranslator,
}

// === impl AgentGatewayTranslator ===

impl AgentGatewayTranslator {
    /// Wires a translator from plugin bundles.
    ///
    /// Bundle merging and plugin registration reject GroupKind conflicts;
    /// those are deployment mistakes and fatal at startup. The
    /// plugin-dependent collections are built here, after registration,
    /// because plugins contribute backend kinds.
    pub fn new(cluster_info: Arc<ClusterInfo>, bundles: Vec<AgwPlugin>) -> Result<Self> {
        let extensions = merge_plugins(bundles)?;

        let mut manager = PolicyManager::new();
        for plugin in extensions.contributes_policies.values() {
            manager.register_plugin(plugin.clone())?;
        }

        let mut collections = AgwCollections::new(cluster_info);
        collections.init_plugin_dependent(&extensions);

        let mut backends = BackendTranslator::new(manager.contributes_policies());
        for plugin in extensions.contributes_policies.values() {
            for (group_kind, init) in plugin.backend_inits() {
                backends.register_backend_init(group_kind, init)?;
            }
        }

        Ok(Self {
            collections,
            extensions,
            manager,
            backends,
        })
    }

    /// A translator with the built-in plugin set.
    pub fn with_default_plugins(cluster_info: Arc<ClusterInfo>) -> Result<Self> {
        let bundles = plugins::default_plugins(cluster_info.clone());
        Self::new(cluster_info, bundles)
    }

    /// The collection store. Stores share state with their clones, so the
    /// watch driver feeds the handles cloned out of here.
    pub fn collections(&self) -> &AgwCollections {
        &self.collections
    }

    /// True once every collection and every plugin's readiness predicate
    /// reports synced. Consumers must not treat the policy set as complete
    /// before this.
    pub fn has_synced(&self) -> bool {
        self.collections.has_synced() && self.extensions.has_synced(&self.collections)
    }

    /// The merged policy set plus any per-plugin failures.
    pub fn generate_policies(&self) -> (Vec<Policy>, Option<Errors>) {
        self.manager.generate_all_policies(&self.collections)
    }

    pub fn translate_backend(&self, ir: &BackendObjectIR) -> Result<(Vec<Backend>, Vec<Policy>)> {
        self.backends.translate_backend(ir, &self.collections)
    }
}
