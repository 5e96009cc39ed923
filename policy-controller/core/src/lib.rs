#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod backend;
mod errors;
mod policy;

pub use self::{
    backend::{AttachedPolicies, Backend, BackendObjectIR, PolicyAttachment, ResolutionError},
    errors::Errors,
    policy::{FailureMode, GroupKind, Policy, PolicySpec, Target},
};

pub const POLICY_CONTROLLER_NAME: &str = "kgateway.dev/agentgateway-policy-controller";
