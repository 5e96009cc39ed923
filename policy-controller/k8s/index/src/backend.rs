//! Backend translation: turns one backend IR into data-plane backend
//! objects and re-applies every attached policy plugin's backend hook.

use crate::{plugins::ContributesPolicies, store::ObjectRef, AgwCollections};
use agentgateway_policy_controller_core::{
    Backend, BackendObjectIR, Errors, GroupKind, Policy, PolicyAttachment,
};
use ahash::AHashMap as HashMap;
use anyhow::Result;
use std::{collections::hash_map::Entry, sync::Arc};

/// Converts a backend IR of one kind into data-plane backends and any
/// policies implied by the backend itself.
pub type BackendInit =
    Arc<dyn Fn(&BackendObjectIR, &AgwCollections) -> Result<(Vec<Backend>, Vec<Policy>)> + Send + Sync>;

pub struct BackendTranslator {
    inits: HashMap<GroupKind, BackendInit>,
    plugins: ContributesPolicies,
}

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("no backend translator registered for {0}")]
    NoBackendTranslator(GroupKind),

    #[error("backend {backend} has unresolved errors: {errors}")]
    InvalidBackend { backend: String, errors: Errors },

    #[error("a backend translator for {0} is already registered")]
    DuplicateInit(GroupKind),
}

// === impl BackendTranslator ===

impl BackendTranslator {
    /// A translator with the built-in Service init plus whatever the given
    /// plugins contribute via their backend hooks.
    pub fn new(plugins: ContributesPolicies) -> Self {
        let mut translator = Self {
            inits: HashMap::default(),
            plugins,
        };
        translator
            .register_backend_init(GroupKind::service(), Arc::new(service_backend_init))
            .expect("the initial registry is empty");
        translator
    }

    /// Registers the init function for one backend kind. Duplicate
    /// registration is a configuration error.
    pub fn register_backend_init(
        &mut self,
        group_kind: GroupKind,
        init: BackendInit,
    ) -> Result<(), TranslationError> {
        match self.inits.entry(group_kind.clone()) {
            Entry::Occupied(_) => Err(TranslationError::DuplicateInit(group_kind)),
            Entry::Vacant(entry) => {
                entry.insert(init);
                Ok(())
            }
        }
    }

    /// Translates one backend IR.
    ///
    /// An IR carrying pre-resolved errors fails immediately with those
    /// errors joined; translation is never attempted on a known-invalid IR.
    /// An incompletely-translated backend is a failure, so policy-hook
    /// errors propagate (joined) to the caller.
    pub fn translate_backend(
        &self,
        ir: &BackendObjectIR,
        collections: &AgwCollections,
    ) -> Result<(Vec<Backend>, Vec<Policy>)> {
        if !ir.errors.is_empty() {
            return Err(TranslationError::InvalidBackend {
                backend: ir.reference(),
                errors: ir.errors.iter().cloned().collect(),
            }
            .into());
        }

        let init = self
            .inits
            .get(&ir.group_kind)
            .ok_or_else(|| TranslationError::NoBackendTranslator(ir.group_kind.clone()))?;

        let (mut backends, policies) = init(ir, collections)?;

        let mut errors = Errors::default();
        for backend in &mut backends {
            if let Err(error) = self.run_backend_policies(ir, backend) {
                errors.push(error);
            }
        }
        errors.into_result()?;

        Ok((backends, policies))
    }

    /// Re-applies every plugin's backend hook to one translated backend.
    ///
    /// Every plugin/attachment pair is attempted regardless of earlier
    /// failures; errors are joined and returned once at the end.
    fn run_backend_policies(&self, ir: &BackendObjectIR, backend: &mut Backend) -> Result<()> {
        let mut errors = Errors::default();

        for (group_kind, plugin) in &self.plugins {
            for attachment in ir.attached_policies.get(group_kind) {
                match attachment {
                    PolicyAttachment::Invalid(attachment_errors) => {
                        errors.extend(attachment_errors.iter().cloned());
                    }
                    PolicyAttachment::Resolved(policy) => {
                        if let Err(error) = plugin.apply_backend_policy(policy, backend) {
                            tracing::warn!(
                                %error,
                                plugin = plugin.name(),
                                %group_kind,
                                backend = %backend.name,
                                "backend policy hook failed"
                            );
                            errors.push(error.context(format!(
                                "plugin {} ({group_kind})",
                                plugin.name()
                            )));
                        }
                    }
                }
            }
        }

        errors.into_result().map_err(Into::into)
    }
}

/// The built-in Service backend init: resolves the Service and yields one
/// backend per translated port.
fn service_backend_init(
    ir: &BackendObjectIR,
    collections: &AgwCollections,
) -> Result<(Vec<Backend>, Vec<Policy>)> {
    let key = ObjectRef::new(&ir.namespace, &ir.name);
    let service = collections
        .services
        .fetch_one(&key)
        .ok_or_else(|| anyhow::anyhow!("service {key} not found"))?;

    let ports = service
        .spec
        .iter()
        .flat_map(|spec| spec.ports.iter().flatten())
        .filter_map(|port| u16::try_from(port.port).ok())
        .filter(|port| ir.port.map(|p| p.get() == *port).unwrap_or(true))
        .collect::<Vec<_>>();
    anyhow::ensure!(
        !ports.is_empty(),
        "service {key} has no port matching the backend"
    );

    let backends = ports
        .into_iter()
        .map(|port| {
            Backend::new(
                format!("{key}:{port}"),
                collections
                    .cluster_info()
                    .service_dns_authority(&ir.namespace, &ir.name, port),
            )
        })
        .collect();

    Ok((backends, Vec::new()))
}
