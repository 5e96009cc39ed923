use super::{LocalPolicyTargetRef, NamespacedObjectRef};
use std::collections::BTreeMap;

/// Attaches traffic-handling policy to Gateway-API resources.
#[derive(
    Clone, Debug, kube::CustomResource, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[kube(
    group = "gateway.kgateway.dev",
    version = "v1alpha1",
    kind = "TrafficPolicy",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPolicySpec {
    /// The Gateways and HTTPRoutes this policy applies to.
    pub target_refs: Vec<LocalPolicyTargetRef>,

    pub ext_auth: Option<ExtAuthPolicy>,
}

/// Configures external authorization through a `GatewayExtension`.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtAuthPolicy {
    /// Names the `GatewayExtension` providing the authorization service.
    /// The namespace defaults to the policy's own.
    pub extension_ref: NamespacedObjectRef,

    /// Additional key-value context forwarded on every check request.
    pub context_extensions: Option<BTreeMap<String, String>>,
}
