use crate::{
    plugins::{A2aPlugin, AgwPlugin},
    tests::{
        collections::mark_base_synced, mk_backend_ref, mk_ext_auth, mk_ext_auth_extension,
        mk_extension_ref, mk_pool, mk_service, mk_target_ref, mk_traffic_policy, TestConfig,
    },
    AgentGatewayTranslator, ClusterInfo,
};
use agentgateway_policy_controller_core::{BackendObjectIR, GroupKind};
use std::sync::Arc;

#[test]
fn colliding_bundles_fail_construction() {
    let cluster_info = Arc::new(ClusterInfo::default());
    let bundles = vec![
        AgwPlugin::from_plugin(Arc::new(A2aPlugin::new())),
        AgwPlugin::from_plugin(Arc::new(A2aPlugin::new())),
    ];
    assert!(AgentGatewayTranslator::new(cluster_info, bundles).is_err());
}

#[test]
fn readiness_requires_all_collections() {
    let test = TestConfig::default();
    assert!(!test.translator.has_synced());

    mark_base_synced(test.collections());
    assert!(test.translator.has_synced());
}

#[test]
fn policies_are_generated_across_all_plugins() {
    let test = TestConfig::default();
    test.apply_service(mk_service(
        "ns-0",
        "agent",
        vec![(8080, Some("kgateway.dev/a2a"))],
    ));
    test.apply_pool(mk_pool("ns-0", "pool-0", 8000, Some(mk_extension_ref("epp"))));
    test.apply_extension(mk_ext_auth_extension(
        "ns-0",
        "authz",
        mk_backend_ref("authz-svc"),
    ));
    test.apply_traffic_policy(mk_traffic_policy(
        "ns-0",
        "tp-0",
        vec![mk_target_ref("Gateway", "gw")],
        Some(mk_ext_auth("authz")),
    ));

    let (policies, errors) = test.translator.generate_policies();
    assert!(errors.is_none(), "{errors:?}");

    // Plugin iteration order is unspecified; compare the sorted names.
    let mut names = policies.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "a2a/ns-0/agent/8080",
            "inference/ns-0/pool-0",
            "inference/ns-0/pool-0:epp-tls",
            "ns-0/tp-0/gw:extauth",
        ]
    );
}

#[test]
fn backends_are_translated_through_registered_inits() {
    let test = TestConfig::default();
    test.apply_service(mk_service("ns-0", "svc-0", vec![(8080, None)]));
    test.apply_pool(mk_pool("ns-0", "pool-0", 8000, Some(mk_extension_ref("epp"))));

    let ir = BackendObjectIR::new(GroupKind::service(), "ns-0", "svc-0");
    let (backends, _) = test.translator.translate_backend(&ir).unwrap();
    assert_eq!(backends.len(), 1);
    assert_eq!(backends[0].name, "ns-0/svc-0:8080");

    // The inference plugin registered an init for its own kind.
    let ir = BackendObjectIR::new(GroupKind::inference_pool(), "ns-0", "pool-0");
    let (backends, _) = test.translator.translate_backend(&ir).unwrap();
    assert_eq!(backends.len(), 1);
    assert_eq!(
        backends[0].name,
        "service/ns-0/pool-0.ns-0.inference.cluster.local:8000"
    );
}
