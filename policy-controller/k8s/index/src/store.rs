//! Keyed, incrementally updated views over watched resources.
//!
//! A [`Store`] holds the latest snapshot of one resource kind, keyed by
//! namespace/name. Watch streams feed it through the
//! `kubert::index::IndexNamespacedResource` impl, or through
//! `IndexClusterResource` for cluster-scoped kinds; consumers read the current
//! snapshot synchronously (`fetch_one`/`snapshot`) or subscribe to a change
//! signal. Updates touch only the changed key, never the whole snapshot.

use ahash::AHashMap as HashMap;
use parking_lot::RwLock;
use std::{fmt, sync::Arc};
use tokio::sync::watch;

/// Identifies one namespaced object within a collection.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectRef {
    pub namespace: String,
    pub name: String,
}

/// A keyed snapshot of one watched resource kind.
///
/// Clones share state, so a `Store` handed to the watch driver feeds every
/// reader.
pub struct Store<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    entries: RwLock<HashMap<ObjectRef, Arc<T>>>,

    /// Set once the initial LIST has been fully applied.
    synced: watch::Sender<bool>,

    /// Bumped on every apply/delete.
    version: watch::Sender<u64>,
}

// === impl ObjectRef ===

impl ObjectRef {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl Store ===

impl<T> Store<T> {
    pub fn new() -> Self {
        let (synced, _) = watch::channel(false);
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::default()),
                synced,
                version,
            }),
        }
    }

    /// Inserts or replaces the object at `key`.
    pub fn apply(&self, key: ObjectRef, value: T) {
        self.inner.entries.write().insert(key, Arc::new(value));
        self.bump();
    }

    pub fn delete(&self, key: &ObjectRef) {
        if self.inner.entries.write().remove(key).is_some() {
            self.bump();
        }
    }

    /// The current value at `key`, if any. Never blocks on I/O.
    pub fn fetch_one(&self, key: &ObjectRef) -> Option<Arc<T>> {
        self.inner.entries.read().get(key).cloned()
    }

    /// The current snapshot in key order.
    ///
    /// Key order keeps derived output stable across recomputations.
    pub fn snapshot(&self) -> Vec<(ObjectRef, Arc<T>)> {
        let mut entries = self
            .inner
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Marks the initial LIST complete. Called by the watch driver.
    pub fn mark_synced(&self) {
        self.inner.synced.send_replace(true);
    }

    pub fn has_synced(&self) -> bool {
        *self.inner.synced.borrow()
    }

    /// A receiver updated whenever the snapshot changes. Used by derived
    /// collections to recompute affected keys.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    fn bump(&self) {
        self.inner.version.send_modify(|v| *v += 1);
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("len", &self.len())
            .field("synced", &self.has_synced())
            .finish()
    }
}

impl<T> kubert::index::IndexNamespacedResource<T> for Store<T>
where
    T: kube::Resource,
    T::DynamicType: Default,
{
    fn apply(&mut self, resource: T) {
        let namespace = resource
            .meta()
            .namespace
            .clone()
            .expect("resource must be namespaced");
        let name = resource.meta().name.clone().expect("resource must be named");
        Store::apply(self, ObjectRef { namespace, name }, resource);
    }

    fn delete(&mut self, namespace: String, name: String) {
        Store::delete(self, &ObjectRef { namespace, name });
    }
}

/// Cluster-scoped resources (e.g. `Namespace`) carry no namespace of their
/// own and are keyed with an empty one.
impl<T> kubert::index::IndexClusterResource<T> for Store<T>
where
    T: kube::Resource,
    T::DynamicType: Default,
{
    fn apply(&mut self, resource: T) {
        let name = resource.meta().name.clone().expect("resource must be named");
        Store::apply(
            self,
            ObjectRef {
                namespace: String::new(),
                name,
            },
            resource,
        );
    }

    fn delete(&mut self, name: String) {
        Store::delete(
            self,
            &ObjectRef {
                namespace: String::new(),
                name,
            },
        );
    }
}
