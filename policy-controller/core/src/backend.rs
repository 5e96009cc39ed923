use crate::{GroupKind, Policy};
use ahash::AHashMap as HashMap;
use std::num::NonZeroU16;

/// A data-plane backend object produced by backend translation.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Backend {
    /// The backend reference, `{namespace}/{name}:{port}`. Policies with a
    /// matching `Target::Backend` apply to this backend.
    pub name: String,

    /// DNS authority the proxy dials for this backend.
    pub authority: String,

    /// Backend-attached policies, in application order.
    pub applied_policies: Vec<Policy>,
}

/// An intermediate representation of one backend resource, decoupled from
/// its source object's exact schema.
///
/// Reference resolution happens before translation; an IR carrying a
/// non-empty `errors` list is known-invalid and must never be translated.
#[derive(Clone, Debug)]
pub struct BackendObjectIR {
    pub group_kind: GroupKind,
    pub namespace: String,
    pub name: String,

    /// Restricts translation to a single port. When unset, every port of the
    /// source object yields a backend.
    pub port: Option<NonZeroU16>,

    /// Resolution errors recorded while building this IR.
    pub errors: Vec<ResolutionError>,

    pub attached_policies: AttachedPolicies,
}

/// Policies attached to a backend, grouped by the source resource kind that
/// produced them.
#[derive(Clone, Debug, Default)]
pub struct AttachedPolicies(HashMap<GroupKind, Vec<PolicyAttachment>>);

/// One policy attachment: either a resolved policy IR or the errors that
/// prevented resolution.
#[derive(Clone, Debug)]
pub enum PolicyAttachment {
    Resolved(Policy),
    /// The error list is always non-empty.
    Invalid(Vec<ResolutionError>),
}

/// A soft, per-object resolution failure. These values are carried inside IR
/// objects, so they must be cheaply clonable.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("backend reference {0} could not be resolved")]
    BackendNotFound(String),

    #[error("policy {policy} failed to attach: {reason}")]
    PolicyAttachment { policy: String, reason: String },

    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

// === impl Backend ===

impl Backend {
    pub fn new(name: impl ToString, authority: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            authority: authority.to_string(),
            applied_policies: Vec::new(),
        }
    }
}

// === impl BackendObjectIR ===

impl BackendObjectIR {
    pub fn new(group_kind: GroupKind, ns: impl ToString, name: impl ToString) -> Self {
        Self {
            group_kind,
            namespace: ns.to_string(),
            name: name.to_string(),
            port: None,
            errors: Vec::new(),
            attached_policies: AttachedPolicies::default(),
        }
    }

    /// The unqualified backend reference, `{namespace}/{name}`.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

// === impl AttachedPolicies ===

impl AttachedPolicies {
    pub fn attach(&mut self, group_kind: GroupKind, attachment: PolicyAttachment) {
        self.0.entry(group_kind).or_default().push(attachment);
    }

    /// Attachments contributed by the given resource kind, in attachment
    /// order.
    pub fn get(&self, group_kind: &GroupKind) -> &[PolicyAttachment] {
        self.0.get(group_kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(GroupKind, PolicyAttachment)> for AttachedPolicies {
    fn from_iter<I: IntoIterator<Item = (GroupKind, PolicyAttachment)>>(iter: I) -> Self {
        let mut attached = Self::default();
        for (gk, attachment) in iter {
            attached.attach(gk, attachment);
        }
        attached
    }
}
