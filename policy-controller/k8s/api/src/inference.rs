use std::collections::BTreeMap;

/// A pool of model-serving endpoints fronted by an endpoint-picker
/// extension, per the Kubernetes inference-extension project.
#[derive(
    Clone, Debug, kube::CustomResource, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[kube(
    group = "inference.networking.x-k8s.io",
    version = "v1alpha2",
    kind = "InferencePool",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct InferencePoolSpec {
    /// Selects the pods serving the pool.
    pub selector: Option<BTreeMap<String, String>>,

    /// The port model-server traffic is sent to.
    pub target_port_number: u16,

    pub extension_ref: Option<ExtensionRef>,
}

/// References the endpoint-picker (EPP) service for a pool.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRef {
    /// Defaults to the core group.
    pub group: Option<String>,

    /// Defaults to `Service`.
    pub kind: Option<String>,

    pub name: String,

    pub port_number: Option<u16>,

    pub failure_mode: Option<ExtensionFailureMode>,
}

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
pub enum ExtensionFailureMode {
    FailOpen,
    FailClosed,
}
