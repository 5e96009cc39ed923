//! Per-kind policy plugins and plugin bundles.
//!
//! A plugin owns all policy derivation for one resource kind. Bundles group
//! plugins with an extra readiness predicate and compose associatively via
//! [`merge_plugins`].

pub mod a2a;
pub mod inference;
pub mod traffic;

use crate::{backend::BackendInit, AgwCollections};
use agentgateway_policy_controller_core::{Backend, GroupKind, Policy};
use ahash::AHashMap as HashMap;
use anyhow::Result;
use std::sync::Arc;

pub use self::{a2a::A2aPlugin, inference::InferencePlugin, traffic::TrafficPolicyPlugin};

/// Derives policies from one watched resource kind.
///
/// Implementations must be pure, synchronous functions over the collection
/// snapshots: bounded in-memory lookups are fine, network I/O and other
/// long-running work are not.
pub trait PolicyPlugin: Send + Sync {
    /// The resource kind this plugin owns. At most one plugin may be
    /// registered per kind.
    fn group_kind(&self) -> GroupKind;

    fn name(&self) -> &'static str;

    /// Additional kinds this plugin lets act as backends.
    fn backend_kinds(&self) -> Vec<GroupKind> {
        Vec::new()
    }

    /// Backend-initialization functions for the kinds in `backend_kinds`.
    fn backend_inits(&self) -> Vec<(GroupKind, BackendInit)> {
        Vec::new()
    }

    /// Derives every policy this plugin contributes from the current
    /// snapshots. Output order is stable for a given input.
    fn generate_policies(&self, collections: &AgwCollections) -> Result<Vec<Policy>>;

    /// Applies one of this plugin's policies to a translated backend.
    fn apply_backend_policy(&self, policy: &Policy, backend: &mut Backend) -> Result<()> {
        let _ = policy;
        let _ = backend;
        Ok(())
    }
}

pub type SharedPlugin = Arc<dyn PolicyPlugin>;

/// Maps each resource kind to the plugin that owns it. Keys are unique.
pub type ContributesPolicies = HashMap<GroupKind, SharedPlugin>;

type SyncCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// A set of plugins contributed as one unit, with an optional extra
/// readiness predicate.
#[derive(Clone, Default)]
pub struct AgwPlugin {
    pub contributes_policies: ContributesPolicies,
    extra_has_synced: Option<SyncCheck>,
}

#[derive(Debug, thiserror::Error)]
#[error("plugins {existing} and {conflicting} both contribute policies for {group_kind}")]
pub struct MergeError {
    pub group_kind: GroupKind,
    pub existing: String,
    pub conflicting: String,
}

// === impl AgwPlugin ===

impl AgwPlugin {
    pub fn from_plugin(plugin: SharedPlugin) -> Self {
        let mut contributes_policies = ContributesPolicies::default();
        contributes_policies.insert(plugin.group_kind(), plugin);
        Self {
            contributes_policies,
            extra_has_synced: None,
        }
    }

    pub fn with_has_synced(mut self, check: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.extra_has_synced = Some(Arc::new(check));
        self
    }

    /// True iff every contributed kind's source collection has synced and
    /// the bundle's own readiness predicate (if any) holds.
    pub fn has_synced(&self, collections: &AgwCollections) -> bool {
        self.contributes_policies
            .keys()
            .all(|gk| collections.kind_synced(gk))
            && self.extra_has_synced.as_ref().map(|f| f()).unwrap_or(true)
    }
}

impl std::fmt::Debug for AgwPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgwPlugin")
            .field(
                "contributes_policies",
                &self.contributes_policies.keys().collect::<Vec<_>>(),
            )
            .field("extra_has_synced", &self.extra_has_synced.is_some())
            .finish()
    }
}

/// Combines plugin bundles into one.
///
/// Policy maps are unioned; a kind contributed by two bundles is a hard
/// error, matching `PolicyManager::register_plugin`. Readiness predicates
/// are conjoined and short-circuit on the first false.
pub fn merge_plugins(bundles: impl IntoIterator<Item = AgwPlugin>) -> Result<AgwPlugin, MergeError> {
    let mut contributes_policies = ContributesPolicies::default();
    let mut checks = Vec::new();

    for bundle in bundles {
        for (gk, plugin) in bundle.contributes_policies {
            if let Some(existing) = contributes_policies.get(&gk) {
                return Err(MergeError {
                    existing: existing.name().to_string(),
                    conflicting: plugin.name().to_string(),
                    group_kind: gk,
                });
            }
            contributes_policies.insert(gk, plugin);
        }
        if let Some(check) = bundle.extra_has_synced {
            checks.push(check);
        }
    }

    let extra_has_synced = if checks.is_empty() {
        None
    } else {
        Some(Arc::new(move || checks.iter().all(|check| check())) as SyncCheck)
    };

    Ok(AgwPlugin {
        contributes_policies,
        extra_has_synced,
    })
}

/// The built-in plugin set. Inference is only contributed when the
/// inference collection is enabled.
pub fn default_plugins(cluster_info: Arc<crate::ClusterInfo>) -> Vec<AgwPlugin> {
    let mut bundles = vec![
        AgwPlugin::from_plugin(Arc::new(A2aPlugin::new())),
        AgwPlugin::from_plugin(Arc::new(TrafficPolicyPlugin::new())),
    ];
    if cluster_info.enable_inference {
        bundles.push(AgwPlugin::from_plugin(Arc::new(InferencePlugin::new(
            cluster_info,
        ))));
    } else {
        tracing::info!("inference support disabled; inference plugin not installed");
    }
    bundles
}
