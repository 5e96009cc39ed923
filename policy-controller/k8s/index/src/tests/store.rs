use crate::{tests::mk_service, ObjectRef, Store};
use agentgateway_policy_controller_k8s_api as k8s;

#[test]
fn apply_fetch_delete() {
    let store = Store::<&'static str>::new();
    let key = ObjectRef::new("ns-0", "obj-0");

    assert!(store.fetch_one(&key).is_none());
    assert!(store.is_empty());

    store.apply(key.clone(), "v0");
    assert_eq!(*store.fetch_one(&key).unwrap(), "v0");
    assert_eq!(store.len(), 1);

    store.apply(key.clone(), "v1");
    assert_eq!(*store.fetch_one(&key).unwrap(), "v1");
    assert_eq!(store.len(), 1);

    store.delete(&key);
    assert!(store.fetch_one(&key).is_none());
}

#[test]
fn snapshot_is_key_ordered() {
    let store = Store::<u32>::new();
    store.apply(ObjectRef::new("ns-1", "b"), 2);
    store.apply(ObjectRef::new("ns-0", "z"), 1);
    store.apply(ObjectRef::new("ns-1", "a"), 3);

    let keys = store
        .snapshot()
        .into_iter()
        .map(|(key, _)| key.to_string())
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["ns-0/z", "ns-1/a", "ns-1/b"]);
}

#[test]
fn clones_share_state() {
    let store = Store::<u32>::new();
    let handle = store.clone();
    handle.apply(ObjectRef::new("ns-0", "obj-0"), 7);
    assert_eq!(*store.fetch_one(&ObjectRef::new("ns-0", "obj-0")).unwrap(), 7);
}

#[test]
fn sync_is_explicit() {
    let store = Store::<u32>::new();
    store.apply(ObjectRef::new("ns-0", "obj-0"), 1);
    assert!(!store.has_synced(), "applies must not imply sync");
    store.mark_synced();
    assert!(store.has_synced());
}

#[test]
fn namespaced_resources_are_ingested_by_watch_key() {
    let store = Store::<k8s::Service>::new();
    let mut handle = store.clone();

    kubert::index::IndexNamespacedResource::apply(
        &mut handle,
        mk_service("ns-0", "svc-0", vec![(80, None)]),
    );
    assert!(store.fetch_one(&ObjectRef::new("ns-0", "svc-0")).is_some());

    kubert::index::IndexNamespacedResource::delete(
        &mut handle,
        "ns-0".to_string(),
        "svc-0".to_string(),
    );
    assert!(store.is_empty());
}

#[test]
fn cluster_scoped_resources_are_keyed_without_a_namespace() {
    let store = Store::<k8s::Namespace>::new();
    let mut handle = store.clone();

    let ns = k8s::Namespace {
        metadata: k8s::ObjectMeta {
            name: Some("ns-0".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    kubert::index::IndexClusterResource::apply(&mut handle, ns);
    assert!(store.fetch_one(&ObjectRef::new("", "ns-0")).is_some());

    kubert::index::IndexClusterResource::delete(&mut handle, "ns-0".to_string());
    assert!(store.is_empty());
}

#[test]
fn subscribers_observe_changes() {
    let store = Store::<u32>::new();
    let rx = store.subscribe();
    let v0 = *rx.borrow();

    store.apply(ObjectRef::new("ns-0", "obj-0"), 1);
    assert!(*rx.borrow() > v0);

    let v1 = *rx.borrow();
    store.delete(&ObjectRef::new("ns-0", "missing"));
    assert_eq!(*rx.borrow(), v1, "no-op deletes must not signal");

    store.delete(&ObjectRef::new("ns-0", "obj-0"));
    assert!(*rx.borrow() > v1);
}
