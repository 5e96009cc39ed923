use std::{collections::BTreeMap, fmt};

/// The (API group, kind) pair identifying a Kubernetes resource type.
///
/// Used as the dispatch key everywhere a resource kind must be associated
/// with exactly one plugin.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

/// Identifies what a policy applies to on the data plane.
///
/// Identity is a structured reference string, never an object pointer:
/// backends are `{namespace}/{name}:{port}` and gateways/routes are
/// `{namespace}/{name}`.
///
/// Listener- and route-rule-scoped targets are reserved for future use.
#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Serialize)]
pub enum Target {
    Backend(String),
    Gateway(String),
    Route(String),
}

/// A single data-plane policy object.
///
/// Policies are immutable value objects: they are recomputed wholesale
/// whenever their source resource changes and are never patched in place.
/// Names are deterministic and globally unique per source object and policy
/// kind, so consumers may rely on them for idempotent re-application.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Policy {
    pub name: String,
    pub target: Target,
    pub spec: PolicySpec,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum PolicySpec {
    A2a,
    InferenceRouting {
        /// Backend reference of the endpoint-picker, `{ns}/{name}:{port}`.
        endpoint_picker: String,
        failure_mode: FailureMode,
    },
    BackendTls {
        insecure: bool,
    },
    ExternalAuth {
        /// Backend reference of the authorization gRPC service, `{ns}/{name}`.
        service: String,
        port: u16,
        context: BTreeMap<String, String>,
    },
}

/// How inference routing behaves when the endpoint picker is unreachable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub enum FailureMode {
    #[default]
    FailOpen,
    FailClosed,
}

// === impl GroupKind ===

impl GroupKind {
    pub fn new(group: impl ToString, kind: impl ToString) -> Self {
        Self {
            group: group.to_string(),
            kind: kind.to_string(),
        }
    }

    /// The core `Service` kind.
    pub fn service() -> Self {
        Self::new("", "Service")
    }

    pub fn inference_pool() -> Self {
        Self::new("inference.networking.x-k8s.io", "InferencePool")
    }

    pub fn traffic_policy() -> Self {
        Self::new("gateway.kgateway.dev", "TrafficPolicy")
    }

    pub fn gateway_extension() -> Self {
        Self::new("gateway.kgateway.dev", "GatewayExtension")
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}.{}", self.kind, self.group)
        }
    }
}

// === impl Target ===

impl Target {
    /// A port-qualified backend target, `{namespace}/{name}:{port}`.
    pub fn backend(ns: &str, name: &str, port: impl fmt::Display) -> Self {
        Self::Backend(format!("{ns}/{name}:{port}"))
    }

    pub fn gateway(ns: &str, name: &str) -> Self {
        Self::Gateway(format!("{ns}/{name}"))
    }

    pub fn route(ns: &str, name: &str) -> Self {
        Self::Route(format!("{ns}/{name}"))
    }

    pub fn reference(&self) -> &str {
        match self {
            Self::Backend(r) | Self::Gateway(r) | Self::Route(r) => r,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(r) => write!(f, "backend/{r}"),
            Self::Gateway(r) => write!(f, "gateway/{r}"),
            Self::Route(r) => write!(f, "route/{r}"),
        }
    }
}
