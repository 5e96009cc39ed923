#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod inference;
pub mod policy;

pub use k8s_gateway_api as gateway;
pub use k8s_openapi::api::{
    self,
    core::v1::{Namespace, Secret, Service, ServicePort, ServiceSpec},
    discovery::v1::EndpointSlice,
};
pub use kube::api::{ObjectMeta, Resource, ResourceExt};

/// Label placed on `EndpointSlice` objects naming the owning `Service`.
pub const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";
