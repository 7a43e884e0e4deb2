//! Sync stores: per-vCenter writers for one kind of task result.
//!
//! A [`StoreRegistry`] maps each [`ResultKind`] to a factory. The
//! [`SyncStoreCache`] builds at most one store per `(vCenter, kind)` and hands
//! out the same instance until the cache is cleared, since stores keep
//! incremental state that must not be split across two writers.

mod object;

pub use object::{builtin_tables, Column, ObjectSyncStore, ObjectTable};

use crate::error::{SyncError, SyncResult};
use crate::vcenter::VCenter;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use vspheredb_db::Db;
use vspheredb_types::{ResultBatch, ResultKind, SyncStats, VCenterId};

/// Writes task results of one kind for one vCenter.
pub trait SyncStore: Send {
    /// The vCenter this store is bound to.
    fn vcenter(&self) -> &VCenter;

    /// Reconciles `batch` with the stored state, counting into `stats`.
    ///
    /// On error, `stats` describes the progress made before it.
    fn store(
        &mut self,
        db: &Db,
        batch: &ResultBatch,
        kind: &ResultKind,
        stats: &mut SyncStats,
    ) -> SyncResult<()>;

    /// Drops whatever the store remembers about stored rows, so the next
    /// [`store`](SyncStore::store) reads them again.
    fn forget_state(&mut self) {}
}

/// A cached store instance.
pub type SharedSyncStore = Arc<Mutex<dyn SyncStore>>;

/// Builds a store bound to a vCenter.
pub type StoreFactory = Box<dyn Fn(Arc<VCenter>) -> SharedSyncStore + Send + Sync>;

/// Closed set of result kinds the runner can store.
pub struct StoreRegistry {
    factories: HashMap<ResultKind, StoreFactory>,
}

impl StoreRegistry {
    /// A registry without any kinds.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with the built-in vSphere object stores.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for table in builtin_tables() {
            registry.register_object_table(table);
        }
        registry
    }

    /// Registers (or replaces) the factory for `kind`.
    pub fn register<F>(&mut self, kind: ResultKind, factory: F)
    where
        F: Fn(Arc<VCenter>) -> SharedSyncStore + Send + Sync + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
    }

    /// Registers an [`ObjectSyncStore`] for the table's kind.
    pub fn register_object_table(&mut self, table: &'static ObjectTable) {
        self.register(ResultKind::from_static(table.kind), move |vcenter| {
            Arc::new(Mutex::new(ObjectSyncStore::new(vcenter, table))) as SharedSyncStore
        });
    }

    pub fn contains(&self, kind: &ResultKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&ResultKind> {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort();
        kinds
    }

    fn build(&self, kind: &ResultKind, vcenter: Arc<VCenter>) -> SyncResult<SharedSyncStore> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| SyncError::UnknownResultKind(kind.to_string()))?;
        Ok(factory(vcenter))
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Stores built through the current connection.
pub struct SyncStoreCache {
    registry: Arc<StoreRegistry>,
    stores: HashMap<(VCenterId, ResultKind), SharedSyncStore>,
}

impl SyncStoreCache {
    pub fn new(registry: Arc<StoreRegistry>) -> Self {
        Self {
            registry,
            stores: HashMap::new(),
        }
    }

    /// Returns the store for `(vcenter, kind)`, building it on first access.
    pub fn require(&mut self, vcenter: Arc<VCenter>, kind: &ResultKind) -> SyncResult<SharedSyncStore> {
        let key = (vcenter.id, kind.clone());
        if let Some(store) = self.stores.get(&key) {
            return Ok(Arc::clone(store));
        }
        let id = vcenter.id;
        let store = self.registry.build(kind, vcenter)?;
        debug!("Created {kind} store for vCenter {id}");
        self.stores.insert(key, Arc::clone(&store));
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Makes every cached store reload its state on next use.
    pub fn forget_state(&self) {
        for store in self.stores.values() {
            store
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .forget_state();
        }
        if !self.stores.is_empty() {
            debug!("Cached sync stores will reload their state");
        }
    }

    /// Drops every cached store.
    pub fn clear(&mut self) {
        self.stores.clear();
    }
}
