use crate::{
    plugins::A2aPlugin,
    tests::{mk_service, FailingPlugin, TestConfig},
    PolicyManager, RegistrationError,
};
use agentgateway_policy_controller_core::GroupKind;
use std::sync::Arc;

#[test]
fn duplicate_registration_is_rejected() {
    let mut manager = PolicyManager::new();
    manager
        .register_plugin(Arc::new(A2aPlugin::new()))
        .expect("first registration succeeds");

    // A second plugin claiming the Service kind.
    let error = manager
        .register_plugin(Arc::new(FailingPlugin::new(GroupKind::service())))
        .expect_err("second registration for the same kind must fail");
    assert!(matches!(
        error,
        RegistrationError::DuplicateGroupKind { ref existing, .. } if existing == "a2a"
    ));

    // The first registration is intact.
    let registered = manager.plugin_for(&GroupKind::service()).unwrap();
    assert_eq!(registered.name(), "a2a");
}

#[test]
fn lookup_misses_return_none() {
    let manager = PolicyManager::new();
    assert!(manager.plugin_for(&GroupKind::service()).is_none());
}

#[test]
fn contributes_policies_is_a_defensive_copy() {
    let mut manager = PolicyManager::new();
    manager.register_plugin(Arc::new(A2aPlugin::new())).unwrap();

    let mut copy = manager.contributes_policies();
    copy.clear();
    assert!(manager.plugin_for(&GroupKind::service()).is_some());
}

#[test]
fn one_failing_plugin_does_not_block_the_rest() {
    let test = TestConfig::default();
    test.apply_service(mk_service(
        "ns-0",
        "svc-0",
        vec![(8080, Some("kgateway.dev/a2a"))],
    ));

    let mut manager = PolicyManager::new();
    manager.register_plugin(Arc::new(A2aPlugin::new())).unwrap();
    manager
        .register_plugin(Arc::new(FailingPlugin::new(GroupKind::new(
            "example.com",
            "Broken",
        ))))
        .unwrap();

    let (policies, errors) = manager.generate_all_policies(test.collections());

    // The successful plugin's output is returned in full.
    assert_eq!(policies.len(), 1);
    assert_eq!(policies[0].name, "a2a/ns-0/svc-0/8080");

    // The failure is reported explicitly, wrapped with the plugin identity.
    let errors = errors.expect("the failure must be aggregated");
    assert_eq!(errors.len(), 1);
    let message = errors.to_string();
    assert!(message.contains("failing"), "missing plugin name: {message}");
    assert!(
        message.contains("Broken.example.com"),
        "missing group kind: {message}"
    );
}

#[test]
fn empty_manager_generates_nothing() {
    let test = TestConfig::default();
    let manager = PolicyManager::new();
    let (policies, errors) = manager.generate_all_policies(test.collections());
    assert!(policies.is_empty());
    assert!(errors.is_none());
}
