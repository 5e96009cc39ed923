use crate::{
    plugins::{PolicyPlugin, TrafficPolicyPlugin},
    tests::{
        mk_backend_ref, mk_ext_auth, mk_ext_auth_extension, mk_meta, mk_target_ref,
        mk_traffic_policy, TestConfig,
    },
};
use agentgateway_policy_controller_core::{PolicySpec, Target};
use agentgateway_policy_controller_k8s_api::policy::{
    GatewayExtension, GatewayExtensionSpec, GatewayExtensionType, GrpcBackendRef,
    NamespacedObjectRef,
};
use maplit::btreemap;

#[test]
fn emits_one_extauth_policy_per_target() {
    let test = TestConfig::default();
    test.apply_extension(mk_ext_auth_extension("ns-0", "authz", mk_backend_ref("authz-svc")));
    test.apply_traffic_policy(mk_traffic_policy(
        "ns-0",
        "tp-0",
        vec![mk_target_ref("Gateway", "gw"), mk_target_ref("HTTPRoute", "route")],
        Some(mk_ext_auth("authz")),
    ));

    let policies = TrafficPolicyPlugin::new()
        .generate_policies(test.collections())
        .unwrap();
    assert_eq!(policies.len(), 2);

    assert_eq!(policies[0].name, "ns-0/tp-0/gw:extauth");
    assert_eq!(policies[0].target, Target::Gateway("ns-0/gw".to_string()));
    assert_eq!(
        policies[0].spec,
        PolicySpec::ExternalAuth {
            service: "ns-0/authz-svc".to_string(),
            port: 80,
            context: Default::default(),
        }
    );

    assert_eq!(policies[1].name, "ns-0/tp-0/route:extauth");
    assert_eq!(policies[1].target, Target::Route("ns-0/route".to_string()));
}

#[test]
fn backend_ref_namespace_and_port_override_defaults() {
    let test = TestConfig::default();
    test.apply_extension(mk_ext_auth_extension(
        "ext-ns",
        "authz",
        GrpcBackendRef {
            name: "authz-svc".to_string(),
            namespace: Some("authz-ns".to_string()),
            port: Some(9191),
        },
    ));

    let mut ext_auth = mk_ext_auth("authz");
    ext_auth.extension_ref = NamespacedObjectRef {
        name: "authz".to_string(),
        namespace: Some("ext-ns".to_string()),
    };
    ext_auth.context_extensions = Some(btreemap! {
        "tenant".to_string() => "a".to_string(),
    });
    test.apply_traffic_policy(mk_traffic_policy(
        "ns-0",
        "tp-0",
        vec![mk_target_ref("Gateway", "gw")],
        Some(ext_auth),
    ));

    let policies = TrafficPolicyPlugin::new()
        .generate_policies(test.collections())
        .unwrap();
    assert_eq!(policies.len(), 1);
    assert_eq!(
        policies[0].spec,
        PolicySpec::ExternalAuth {
            service: "authz-ns/authz-svc".to_string(),
            port: 9191,
            context: btreemap! { "tenant".to_string() => "a".to_string() },
        }
    );
}

#[test]
fn missing_extension_is_a_soft_failure() {
    let test = TestConfig::default();
    test.apply_extension(mk_ext_auth_extension("ns-0", "authz", mk_backend_ref("authz-svc")));

    // References an extension that does not exist.
    test.apply_traffic_policy(mk_traffic_policy(
        "ns-0",
        "broken",
        vec![mk_target_ref("HTTPRoute", "r")],
        Some(mk_ext_auth("missing")),
    ));
    // A sibling policy in the same batch is unaffected.
    test.apply_traffic_policy(mk_traffic_policy(
        "ns-0",
        "working",
        vec![mk_target_ref("Gateway", "gw")],
        Some(mk_ext_auth("authz")),
    ));

    let policies = TrafficPolicyPlugin::new()
        .generate_policies(test.collections())
        .unwrap();
    assert_eq!(policies.len(), 1);
    assert_eq!(policies[0].name, "ns-0/working/gw:extauth");
}

#[test]
fn mistyped_extension_is_a_soft_failure() {
    let test = TestConfig::default();
    test.apply_extension(GatewayExtension {
        metadata: mk_meta("ns-0", "authz"),
        spec: GatewayExtensionSpec {
            extension_type: GatewayExtensionType::ExtProc,
            ext_auth: None,
        },
    });
    test.apply_traffic_policy(mk_traffic_policy(
        "ns-0",
        "tp-0",
        vec![mk_target_ref("Gateway", "gw")],
        Some(mk_ext_auth("authz")),
    ));

    let policies = TrafficPolicyPlugin::new()
        .generate_policies(test.collections())
        .unwrap();
    assert!(policies.is_empty());
}

#[test]
fn unsupported_target_kinds_are_skipped() {
    let test = TestConfig::default();
    test.apply_extension(mk_ext_auth_extension("ns-0", "authz", mk_backend_ref("authz-svc")));

    let mut sectioned = mk_target_ref("Gateway", "gw");
    sectioned.section_name = Some("listener-0".to_string());
    test.apply_traffic_policy(mk_traffic_policy(
        "ns-0",
        "tp-0",
        vec![
            sectioned,
            mk_target_ref("TCPRoute", "tcp"),
            mk_target_ref("Gateway", "gw"),
        ],
        Some(mk_ext_auth("authz")),
    ));

    let policies = TrafficPolicyPlugin::new()
        .generate_policies(test.collections())
        .unwrap();
    assert_eq!(policies.len(), 1, "only the plain Gateway target resolves");
    assert_eq!(policies[0].target, Target::Gateway("ns-0/gw".to_string()));
}

#[test]
fn targets_without_ext_auth_contribute_nothing() {
    let test = TestConfig::default();
    test.apply_traffic_policy(mk_traffic_policy(
        "ns-0",
        "tp-0",
        vec![mk_target_ref("Gateway", "gw")],
        None,
    ));

    let policies = TrafficPolicyPlugin::new()
        .generate_policies(test.collections())
        .unwrap();
    assert!(policies.is_empty());
}
