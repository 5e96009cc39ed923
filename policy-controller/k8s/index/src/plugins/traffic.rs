use crate::{plugins::PolicyPlugin, store::ObjectRef, AgwCollections, Store};
use agentgateway_policy_controller_core::{GroupKind, Policy, PolicySpec, Target};
use agentgateway_policy_controller_k8s_api::{
    gateway,
    policy::{GatewayExtension, GatewayExtensionType, TrafficPolicy},
};
use anyhow::Result;

/// Derives target-scoped policies from TrafficPolicy resources.
///
/// Only external authorization is derived today; each resolved targetRef
/// yields one ExternalAuth policy when the TrafficPolicy carries an extAuth
/// block.
#[derive(Clone, Debug, Default)]
pub struct TrafficPolicyPlugin(());

// === impl TrafficPolicyPlugin ===

impl TrafficPolicyPlugin {
    pub fn new() -> Self {
        Self(())
    }
}

impl PolicyPlugin for TrafficPolicyPlugin {
    fn group_kind(&self) -> GroupKind {
        GroupKind::traffic_policy()
    }

    fn name(&self) -> &'static str {
        "trafficpolicy"
    }

    fn generate_policies(&self, collections: &AgwCollections) -> Result<Vec<Policy>> {
        Ok(collections
            .traffic_policies
            .snapshot()
            .into_iter()
            .flat_map(|(_, tp)| traffic_policy_policies(&tp, &collections.gateway_extensions))
            .collect())
    }
}

/// Derives the policies of a single TrafficPolicy, in targetRef order.
///
/// Unresolvable targets are logged and skipped; they never fail the batch.
pub(crate) fn traffic_policy_policies(
    tp: &TrafficPolicy,
    extensions: &Store<GatewayExtension>,
) -> Vec<Policy> {
    let Some(ns) = tp.metadata.namespace.as_deref() else {
        return Vec::new();
    };
    let Some(name) = tp.metadata.name.as_deref() else {
        return Vec::new();
    };

    let mut policies = Vec::new();
    for target_ref in &tp.spec.target_refs {
        if target_ref.section_name.is_some() {
            tracing::warn!(
                policy = %name,
                namespace = %ns,
                target = %target_ref.name,
                "section-name scoped targets are not supported, skipping"
            );
            continue;
        }

        let target = if target_ref.targets_kind::<gateway::Gateway>() {
            Target::gateway(ns, &target_ref.name)
        } else if target_ref.targets_kind::<gateway::HttpRoute>() {
            Target::route(ns, &target_ref.name)
        } else {
            tracing::warn!(
                policy = %name,
                namespace = %ns,
                kind = %target_ref.kind,
                "targets must be a Gateway or HTTPRoute, skipping"
            );
            continue;
        };

        let Some(ext_auth) = &tp.spec.ext_auth else {
            continue;
        };

        match resolve_ext_auth(ns, ext_auth, extensions) {
            Ok(spec) => policies.push(Policy {
                name: format!("{ns}/{name}/{}:extauth", target_ref.name),
                target,
                spec,
            }),
            Err(error) => {
                // Soft failure: this target contributes nothing, the rest of
                // the batch is unaffected.
                tracing::error!(
                    %error,
                    policy = %name,
                    namespace = %ns,
                    target = %target_ref.name,
                    "failed to resolve extauth extension"
                );
            }
        }
    }
    policies
}

fn resolve_ext_auth(
    policy_ns: &str,
    ext_auth: &agentgateway_policy_controller_k8s_api::policy::ExtAuthPolicy,
    extensions: &Store<GatewayExtension>,
) -> Result<PolicySpec> {
    let ext_ns = ext_auth
        .extension_ref
        .namespace
        .as_deref()
        .unwrap_or(policy_ns);
    let key = ObjectRef::new(ext_ns, &ext_auth.extension_ref.name);

    let ext = extensions
        .fetch_one(&key)
        .ok_or_else(|| anyhow::anyhow!("gateway extension {key} not found"))?;
    anyhow::ensure!(
        ext.spec.extension_type == GatewayExtensionType::ExtAuth,
        "gateway extension {key} is not an ExtAuth extension",
    );
    let provider = ext
        .spec
        .ext_auth
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("gateway extension {key} has no extAuth configuration"))?;

    let backend = &provider.grpc_service.backend_ref;
    let backend_ns = backend.namespace.as_deref().unwrap_or(policy_ns);
    Ok(PolicySpec::ExternalAuth {
        service: format!("{backend_ns}/{}", backend.name),
        port: backend.port.unwrap_or(80),
        context: ext_auth.context_extensions.clone().unwrap_or_default(),
    })
}
