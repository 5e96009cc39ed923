//! Agentgateway policy derivation
//!
//! This crate turns watched cluster state into the policy and backend
//! objects pushed to the agentgateway data plane. It watches the following
//! resources:
//!
//! - Each `Service` port carrying the A2A `appProtocol` yields an A2A policy
//!   on the port's backend.
//! - Each `InferencePool` yields an inference-routing policy on the pool's
//!   backend and a TLS policy on its endpoint-picker backend.
//! - Each `TrafficPolicy` attaches policies (currently external
//!   authorization) to the Gateways and HTTPRoutes it targets, resolving the
//!   `GatewayExtension` objects it references.
//!
//! ```text
//! [ Service | InferencePool | TrafficPolicy ] -> [ plugin ] -> [ Policy ]
//! ```
//!
//! Derivation is incremental: each watched kind feeds a keyed [`Store`], and
//! a per-kind [`plugins::PolicyPlugin`] recomputes only the policies of
//! changed objects. The [`PolicyManager`] fans generation out across all
//! registered plugins and aggregates their failures without ever letting one
//! plugin block the rest. The [`BackendTranslator`] re-applies each plugin's
//! backend hook when a backend is translated for the data plane.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod backend;
mod collections;
mod manager;
pub mod plugins;
mod store;
mod translator;


pub use self::{
    backend::{BackendInit, BackendTranslator, TranslationError},
    collections::{AgwCollections, BackendIndex, EndpointIndex, GatewayIndex, RouteIndex},
    manager::{PolicyManager, RegistrationError},
    plugins::{merge_plugins, AgwPlugin, ContributesPolicies, PolicyPlugin, SharedPlugin},
    store::{ObjectRef, Store},
    translator::AgentGatewayTranslator,
};
use std::fmt;

/// Holds cluster metadata.
#[derive(Clone, Debug)]
pub struct ClusterInfo {
    /// E.g. "cluster.local"
    pub cluster_domain: String,

    /// Enables the InferencePool watch. Off by default; the watch driver
    /// leaves this unset when the inference-extension client cannot be
    /// constructed, and the pipeline runs without inference support rather
    /// than failing startup.
    pub enable_inference: bool,
}

// === impl ClusterInfo ===

impl ClusterInfo {
    pub(crate) fn service_dns_authority(&self, ns: &str, svc: &str, port: impl fmt::Display) -> String {
        format!("{}.{}.svc.{}:{port}", svc, ns, self.cluster_domain)
    }

    /// The backend target string of an inference pool.
    pub(crate) fn inference_pool_target(&self, ns: &str, pool: &str, port: u16) -> String {
        format!("service/{ns}/{pool}.{ns}.inference.{}:{port}", self.cluster_domain)
    }
}

impl Default for ClusterInfo {
    fn default() -> Self {
        Self {
            cluster_domain: "cluster.local".to_string(),
            enable_inference: false,
        }
    }
}
