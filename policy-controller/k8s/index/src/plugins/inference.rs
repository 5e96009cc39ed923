use crate::{backend::BackendInit, plugins::PolicyPlugin, store::ObjectRef, AgwCollections, ClusterInfo};
use agentgateway_policy_controller_core::{
    Backend, BackendObjectIR, FailureMode, GroupKind, Policy, PolicySpec, Target,
};
use agentgateway_policy_controller_k8s_api::inference::{ExtensionFailureMode, InferencePool};
use anyhow::Result;
use std::sync::Arc;

/// The conventional endpoint-picker port when the extension ref leaves it
/// unset.
pub const DEFAULT_EPP_PORT: u16 = 9002;

/// Derives routing policy from InferencePools: an inference-routing policy
/// on the pool's backend and a TLS policy on the endpoint-picker backend.
#[derive(Clone, Debug)]
pub struct InferencePlugin {
    cluster_info: Arc<ClusterInfo>,
}

// === impl InferencePlugin ===

impl InferencePlugin {
    pub fn new(cluster_info: Arc<ClusterInfo>) -> Self {
        Self { cluster_info }
    }
}

impl PolicyPlugin for InferencePlugin {
    fn group_kind(&self) -> GroupKind {
        GroupKind::inference_pool()
    }

    fn name(&self) -> &'static str {
        "inference"
    }

    fn backend_kinds(&self) -> Vec<GroupKind> {
        vec![GroupKind::inference_pool()]
    }

    fn backend_inits(&self) -> Vec<(GroupKind, BackendInit)> {
        vec![(
            GroupKind::inference_pool(),
            Arc::new(pool_backend_init) as BackendInit,
        )]
    }

    fn generate_policies(&self, collections: &AgwCollections) -> Result<Vec<Policy>> {
        let Some(pools) = &collections.inference_pools else {
            // Inference support is disabled; nothing to derive.
            return Ok(Vec::new());
        };
        Ok(pools
            .snapshot()
            .into_iter()
            .flat_map(|(_, pool)| pool_policies(&pool, &self.cluster_info))
            .collect())
    }

    fn apply_backend_policy(&self, policy: &Policy, backend: &mut Backend) -> Result<()> {
        backend.applied_policies.push(policy.clone());
        Ok(())
    }
}

/// Translates an InferencePool IR into its data-plane backend.
fn pool_backend_init(
    ir: &BackendObjectIR,
    collections: &AgwCollections,
) -> Result<(Vec<Backend>, Vec<Policy>)> {
    let pools = collections
        .inference_pools
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("inference support is disabled"))?;
    let key = ObjectRef::new(&ir.namespace, &ir.name);
    let pool = pools
        .fetch_one(&key)
        .ok_or_else(|| anyhow::anyhow!("inference pool {key} not found"))?;

    let port = pool.spec.target_port_number;
    let backend = Backend::new(
        collections
            .cluster_info()
            .inference_pool_target(&ir.namespace, &ir.name, port),
        collections
            .cluster_info()
            .service_dns_authority(&ir.namespace, &ir.name, port),
    );
    Ok((vec![backend], Vec::new()))
}

/// Derives the policies of a single InferencePool.
///
/// A pool without a usable extension ref contributes nothing; that is a
/// skip, not a failure.
pub(crate) fn pool_policies(pool: &InferencePool, cluster_info: &ClusterInfo) -> Vec<Policy> {
    let Some(ns) = pool.metadata.namespace.as_deref() else {
        return Vec::new();
    };
    let Some(name) = pool.metadata.name.as_deref() else {
        return Vec::new();
    };

    let Some(ext) = &pool.spec.extension_ref else {
        tracing::debug!(pool = %name, namespace = %ns, "inference pool has no extension ref, skipping");
        return Vec::new();
    };
    if !ext.group.as_deref().unwrap_or("").is_empty() {
        tracing::warn!(pool = %name, namespace = %ns, group = ?ext.group, "unsupported extension ref group, skipping");
        return Vec::new();
    }
    // Extension refs default to the Service kind.
    if ext.kind.as_deref().unwrap_or("Service") != "Service" {
        tracing::warn!(pool = %name, namespace = %ns, kind = ?ext.kind, "unsupported extension ref kind, skipping");
        return Vec::new();
    }

    let failure_mode = match ext.failure_mode {
        Some(ExtensionFailureMode::FailClosed) => FailureMode::FailClosed,
        _ => FailureMode::FailOpen,
    };
    let epp_port = ext.port_number.unwrap_or(DEFAULT_EPP_PORT);

    let pool_target = Target::Backend(cluster_info.inference_pool_target(
        ns,
        name,
        pool.spec.target_port_number,
    ));

    vec![
        Policy {
            name: format!("inference/{ns}/{name}"),
            target: pool_target,
            spec: PolicySpec::InferenceRouting {
                endpoint_picker: format!("{ns}/{}:{epp_port}", ext.name),
                failure_mode,
            },
        },
        // The endpoint picker is always contacted insecurely; the
        // inference-extension spec does not provide for EPP server certs.
        Policy {
            name: format!("inference/{ns}/{name}:epp-tls"),
            target: Target::backend(ns, &ext.name, epp_port),
            spec: PolicySpec::BackendTls { insecure: true },
        },
    ]
}
