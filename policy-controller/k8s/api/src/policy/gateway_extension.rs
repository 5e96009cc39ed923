/// Describes an auxiliary service the gateway calls out to, e.g. an external
/// authorization server.
#[derive(
    Clone, Debug, kube::CustomResource, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[kube(
    group = "gateway.kgateway.dev",
    version = "v1alpha1",
    kind = "GatewayExtension",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GatewayExtensionSpec {
    #[serde(rename = "type")]
    pub extension_type: GatewayExtensionType,

    pub ext_auth: Option<ExtAuthProvider>,
}

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
pub enum GatewayExtensionType {
    ExtAuth,
    ExtProc,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtAuthProvider {
    pub grpc_service: ExtGrpcService,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtGrpcService {
    pub backend_ref: GrpcBackendRef,
}

/// References the Service backing a gRPC extension server.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct GrpcBackendRef {
    pub name: String,
    pub namespace: Option<String>,
    pub port: Option<u16>,
}
