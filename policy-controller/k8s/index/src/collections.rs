//! The collection store: one keyed view per watched kind, plus the derived
//! indices that can only be built once the plugin set is known.

use crate::{
    plugins::AgwPlugin,
    store::{ObjectRef, Store},
    ClusterInfo,
};
use agentgateway_policy_controller_core::{BackendObjectIR, GroupKind};
use agentgateway_policy_controller_k8s_api::{self as k8s, gateway};
use ahash::AHashSet as HashSet;
use std::{num::NonZeroU16, sync::Arc};

/// Holds every watched collection and the indices derived from them.
///
/// Construction is two-phase: [`AgwCollections::new`] wires one store per
/// statically known kind, and [`AgwCollections::init_plugin_dependent`]
/// builds the backend/route/endpoint/gateway indices once plugin
/// registration has settled (plugins contribute additional backend kinds).
#[derive(Debug)]
pub struct AgwCollections {
    cluster_info: Arc<ClusterInfo>,

    pub namespaces: Store<k8s::Namespace>,
    pub services: Store<k8s::Service>,
    pub secrets: Store<k8s::Secret>,
    pub endpoint_slices: Store<k8s::EndpointSlice>,
    pub http_routes: Store<gateway::HttpRoute>,
    pub gateways: Store<gateway::Gateway>,
    pub reference_grants: Store<gateway::ReferenceGrant>,
    pub traffic_policies: Store<k8s::policy::TrafficPolicy>,
    pub gateway_extensions: Store<k8s::policy::GatewayExtension>,

    /// Only populated when `ClusterInfo::enable_inference` is set.
    pub inference_pools: Option<Store<k8s::inference::InferencePool>>,

    // Populated by `init_plugin_dependent`.
    backend_index: Option<BackendIndex>,
    route_index: Option<RouteIndex>,
    endpoints: Option<EndpointIndex>,
    gateway_index: Option<GatewayIndex>,
}

/// Knows every kind that can act as a backend and derives backend IRs from
/// the Service collection.
#[derive(Debug)]
pub struct BackendIndex {
    kinds: HashSet<GroupKind>,
    services: Store<k8s::Service>,
}

/// Looks routes up by the Gateway they attach to.
#[derive(Debug)]
pub struct RouteIndex {
    routes: Store<gateway::HttpRoute>,
}

/// Resolves ready endpoint addresses for a Service.
#[derive(Debug)]
pub struct EndpointIndex {
    slices: Store<k8s::EndpointSlice>,
}

#[derive(Debug)]
pub struct GatewayIndex {
    gateways: Store<gateway::Gateway>,
}

// === impl AgwCollections ===

impl AgwCollections {
    pub fn new(cluster_info: Arc<ClusterInfo>) -> Self {
        let inference_pools = if cluster_info.enable_inference {
            tracing::info!("inference pool collection enabled");
            Some(Store::new())
        } else {
            tracing::debug!("inference pool collection disabled");
            None
        };

        Self {
            cluster_info,
            namespaces: Store::new(),
            services: Store::new(),
            secrets: Store::new(),
            endpoint_slices: Store::new(),
            http_routes: Store::new(),
            gateways: Store::new(),
            reference_grants: Store::new(),
            traffic_policies: Store::new(),
            gateway_extensions: Store::new(),
            inference_pools,
            backend_index: None,
            route_index: None,
            endpoints: None,
            gateway_index: None,
        }
    }

    /// Builds the plugin-dependent indices. Must be invoked exactly once,
    /// after plugin registration.
    pub fn init_plugin_dependent(&mut self, plugins: &AgwPlugin) {
        debug_assert!(
            self.backend_index.is_none(),
            "plugin-dependent collections already initialized"
        );

        let mut kinds = HashSet::default();
        kinds.insert(GroupKind::service());
        for plugin in plugins.contributes_policies.values() {
            kinds.extend(plugin.backend_kinds());
        }

        self.backend_index = Some(BackendIndex {
            kinds,
            services: self.services.clone(),
        });
        self.route_index = Some(RouteIndex {
            routes: self.http_routes.clone(),
        });
        self.endpoints = Some(EndpointIndex {
            slices: self.endpoint_slices.clone(),
        });
        self.gateway_index = Some(GatewayIndex {
            gateways: self.gateways.clone(),
        });
    }

    pub fn cluster_info(&self) -> &ClusterInfo {
        &self.cluster_info
    }

    pub fn backend_index(&self) -> Option<&BackendIndex> {
        self.backend_index.as_ref()
    }

    pub fn route_index(&self) -> Option<&RouteIndex> {
        self.route_index.as_ref()
    }

    pub fn endpoints(&self) -> Option<&EndpointIndex> {
        self.endpoints.as_ref()
    }

    pub fn gateway_index(&self) -> Option<&GatewayIndex> {
        self.gateway_index.as_ref()
    }

    /// True once every collection has completed its initial sync.
    ///
    /// The plugin-dependent fields are checked for presence as well as
    /// sync, since they are only populated by the second construction
    /// phase.
    pub fn has_synced(&self) -> bool {
        let base = self.namespaces.has_synced()
            && self.services.has_synced()
            && self.secrets.has_synced()
            && self.endpoint_slices.has_synced()
            && self.http_routes.has_synced()
            && self.gateways.has_synced()
            && self.reference_grants.has_synced()
            && self.traffic_policies.has_synced()
            && self.gateway_extensions.has_synced();
        let inference = self
            .inference_pools
            .as_ref()
            .map(|pools| pools.has_synced())
            .unwrap_or(true);
        let derived = self
            .backend_index
            .as_ref()
            .map(|idx| idx.has_synced())
            .unwrap_or(false)
            && self
                .route_index
                .as_ref()
                .map(|idx| idx.has_synced())
                .unwrap_or(false)
            && self
                .endpoints
                .as_ref()
                .map(|idx| idx.has_synced())
                .unwrap_or(false)
            && self
                .gateway_index
                .as_ref()
                .map(|idx| idx.has_synced())
                .unwrap_or(false);
        base && inference && derived
    }

    /// Whether the source collection of the given kind has synced.
    ///
    /// A kind with no backing collection (e.g. InferencePool while inference
    /// is disabled) has nothing to sync and reports true.
    pub fn kind_synced(&self, gk: &GroupKind) -> bool {
        if *gk == GroupKind::service() {
            self.services.has_synced()
        } else if *gk == GroupKind::traffic_policy() {
            self.traffic_policies.has_synced()
        } else if *gk == GroupKind::gateway_extension() {
            self.gateway_extensions.has_synced()
        } else if *gk == GroupKind::inference_pool() {
            self.inference_pools
                .as_ref()
                .map(|pools| pools.has_synced())
                .unwrap_or(true)
        } else {
            true
        }
    }
}

// === impl BackendIndex ===

impl BackendIndex {
    /// Whether the given kind may act as a backend.
    pub fn has_kind(&self, gk: &GroupKind) -> bool {
        self.kinds.contains(gk)
    }

    pub fn backend_kinds(&self) -> impl Iterator<Item = &GroupKind> {
        self.kinds.iter()
    }

    /// One backend IR per Service port, in key order.
    pub fn service_backends(&self) -> Vec<BackendObjectIR> {
        self.services
            .snapshot()
            .into_iter()
            .flat_map(|(key, svc)| {
                svc.spec
                    .iter()
                    .flat_map(|spec| spec.ports.iter().flatten())
                    .filter_map(|port| {
                        u16::try_from(port.port).ok().and_then(NonZeroU16::new)
                    })
                    .map(|port| {
                        let mut ir = BackendObjectIR::new(
                            GroupKind::service(),
                            &key.namespace,
                            &key.name,
                        );
                        ir.port = Some(port);
                        ir
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn has_synced(&self) -> bool {
        self.services.has_synced()
    }
}

// === impl RouteIndex ===

impl RouteIndex {
    /// Routes whose parent refs include the given Gateway, in key order.
    pub fn routes_for_gateway(&self, ns: &str, name: &str) -> Vec<ObjectRef> {
        self.routes
            .snapshot()
            .into_iter()
            .filter(|(key, route)| {
                route
                    .spec
                    .inner
                    .parent_refs
                    .iter()
                    .flatten()
                    .any(|parent| {
                        parent.kind.as_deref() == Some("Gateway")
                            && parent.name == name
                            && parent.namespace.as_deref().unwrap_or(&key.namespace) == ns
                    })
            })
            .map(|(key, _)| key)
            .collect()
    }

    pub fn has_synced(&self) -> bool {
        self.routes.has_synced()
    }
}

// === impl EndpointIndex ===

impl EndpointIndex {
    /// Ready addresses of the slices owned by the given Service.
    pub fn endpoints_for_service(&self, ns: &str, name: &str) -> Vec<String> {
        self.slices
            .snapshot()
            .into_iter()
            .filter(|(key, slice)| {
                key.namespace == ns
                    && slice
                        .metadata
                        .labels
                        .as_ref()
                        .and_then(|labels| labels.get(k8s::SERVICE_NAME_LABEL))
                        .map(|owner| owner == name)
                        .unwrap_or(false)
            })
            .flat_map(|(_, slice)| {
                slice
                    .endpoints
                    .iter()
                    .filter(|ep| {
                        ep.conditions
                            .as_ref()
                            .and_then(|c| c.ready)
                            .unwrap_or(true)
                    })
                    .flat_map(|ep| ep.addresses.iter().cloned())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn has_synced(&self) -> bool {
        self.slices.has_synced()
    }
}

// === impl GatewayIndex ===

impl GatewayIndex {
    pub fn gateway(&self, ns: &str, name: &str) -> Option<Arc<gateway::Gateway>> {
        self.gateways.fetch_one(&ObjectRef::new(ns, name))
    }

    pub fn has_synced(&self) -> bool {
        self.gateways.has_synced()
    }
}
