use crate::{plugins::PolicyPlugin, AgwCollections};
use agentgateway_policy_controller_core::{Backend, GroupKind, Policy, PolicySpec, Target};
use agentgateway_policy_controller_k8s_api as k8s;
use anyhow::Result;

/// Sentinel `appProtocol` marking a Service port as an A2A endpoint.
pub const A2A_APP_PROTOCOL: &str = "kgateway.dev/a2a";

/// Emits one A2A policy per Service port whose `appProtocol` carries the
/// A2A sentinel.
#[derive(Clone, Debug, Default)]
pub struct A2aPlugin(());

// === impl A2aPlugin ===

impl A2aPlugin {
    pub fn new() -> Self {
        Self(())
    }
}

impl PolicyPlugin for A2aPlugin {
    fn group_kind(&self) -> GroupKind {
        GroupKind::service()
    }

    fn name(&self) -> &'static str {
        "a2a"
    }

    fn generate_policies(&self, collections: &AgwCollections) -> Result<Vec<Policy>> {
        Ok(collections
            .services
            .snapshot()
            .into_iter()
            .flat_map(|(_, svc)| service_policies(&svc))
            .collect())
    }

    fn apply_backend_policy(&self, policy: &Policy, backend: &mut Backend) -> Result<()> {
        backend.applied_policies.push(policy.clone());
        Ok(())
    }
}

/// Derives the A2A policies of a single Service, in port order.
pub(crate) fn service_policies(service: &k8s::Service) -> Vec<Policy> {
    let Some(ns) = service.metadata.namespace.as_deref() else {
        return Vec::new();
    };
    let Some(name) = service.metadata.name.as_deref() else {
        return Vec::new();
    };

    service
        .spec
        .iter()
        .flat_map(|spec| spec.ports.iter().flatten())
        .filter(|port| port.app_protocol.as_deref() == Some(A2A_APP_PROTOCOL))
        .map(|port| Policy {
            name: format!("a2a/{ns}/{name}/{}", port.port),
            target: Target::backend(ns, name, port.port),
            spec: PolicySpec::A2a,
        })
        .collect()
}
