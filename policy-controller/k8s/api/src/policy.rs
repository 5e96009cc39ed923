pub mod gateway_extension;
pub mod traffic_policy;

pub use self::{
    gateway_extension::{
        ExtAuthProvider, ExtGrpcService, GatewayExtension, GatewayExtensionSpec,
        GatewayExtensionType, GrpcBackendRef,
    },
    traffic_policy::{ExtAuthPolicy, TrafficPolicy, TrafficPolicySpec},
};

/// Targets a resource within the same namespace.
#[derive(
    Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct LocalPolicyTargetRef {
    pub group: Option<String>,
    pub kind: String,
    pub name: String,
    pub section_name: Option<String>,
}

/// References an object that may live in another namespace.
#[derive(
    Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
pub struct NamespacedObjectRef {
    pub name: String,
    pub namespace: Option<String>,
}

// === impl LocalPolicyTargetRef ===

impl LocalPolicyTargetRef {
    /// Checks whether the target references the given resource type.
    ///
    /// An unset or empty group matches any group, since policy targets leave
    /// the group implied by the kind.
    pub fn targets_kind<T>(&self) -> bool
    where
        T: kube::Resource,
        T::DynamicType: Default,
    {
        let dt = Default::default();
        self.group
            .as_deref()
            .map(|g| g.is_empty() || *g == *T::group(&dt))
            .unwrap_or(true)
            && *self.kind == *T::kind(&dt)
    }
}

#[cfg(test)]
mod tests {
    use super::LocalPolicyTargetRef;
    use k8s_gateway_api::{Gateway, HttpRoute};

    #[test]
    fn targets_gateway_kind() {
        let t = LocalPolicyTargetRef {
            group: None,
            kind: "Gateway".to_string(),
            name: "gw".to_string(),
            section_name: None,
        };
        assert!(t.targets_kind::<Gateway>());
        assert!(!t.targets_kind::<HttpRoute>());
    }

    #[test]
    fn group_mismatch_does_not_target() {
        let t = LocalPolicyTargetRef {
            group: Some("example.com".to_string()),
            kind: "Gateway".to_string(),
            name: "gw".to_string(),
            section_name: None,
        };
        assert!(!t.targets_kind::<Gateway>());
    }
}
