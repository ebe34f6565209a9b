//! Chunk address resolution: (server, dimension) to namespace.

use redb::ReadableTable;
use tracing::{debug, info};
use webmap_core::{NamespaceId, ServerId};

use crate::db::ChunkDb;
use crate::error::{Result, StoreError};
use crate::tables::{dimension_key, server_key_range, COUNTERS, DIMENSIONS, NAMESPACES, NEXT_NAMESPACE};

/// Maps dimensions to storage namespaces, creating them lazily.
pub trait NamespaceResolver: Send + Sync {
    /// Look up the namespace of a dimension, registering it on first use.
    ///
    /// Concurrent first callers for the same pair all receive the same id.
    fn resolve_namespace(&self, server: ServerId, dimension: &str) -> Result<NamespaceId>;

    /// Provision backing storage for a namespace. Redundant calls are no-ops.
    fn ensure_namespace_storage(&self, namespace: NamespaceId) -> Result<()>;

    /// Dimensions registered for a server, ordered by key.
    fn dimensions(&self, server: ServerId) -> Result<Vec<(String, NamespaceId)>>;
}

/// Outcome of an attempt to register a dimension.
enum Registration {
    Inserted(NamespaceId),
    Conflict,
}

impl ChunkDb {
    fn lookup_dimension(&self, key: &str) -> Result<Option<NamespaceId>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DIMENSIONS)?;
        Ok(table.get(key)?.map(|guard| NamespaceId(guard.value())))
    }

    // Insert-if-absent. A key that already exists is a conflict and the caller
    // re-reads instead of erroring.
    fn register_dimension(&self, key: &str) -> Result<Registration> {
        let txn = self.db.begin_write()?;
        let namespace = {
            let mut dimensions = txn.open_table(DIMENSIONS)?;
            if dimensions.get(key)?.is_some() {
                drop(dimensions);
                txn.abort()?;
                return Ok(Registration::Conflict);
            }

            let mut counters = txn.open_table(COUNTERS)?;
            let next = counters
                .get(NEXT_NAMESPACE)?
                .map_or(1, |guard| guard.value());
            let following = next
                .checked_add(1)
                .ok_or_else(|| StoreError::Corrupt("namespace counter exhausted".into()))?;
            counters.insert(NEXT_NAMESPACE, following)?;
            dimensions.insert(key, next)?;
            NamespaceId(next)
        };
        txn.commit()?;
        Ok(Registration::Inserted(namespace))
    }

    fn namespace_exists(&self, namespace: NamespaceId) -> Result<bool> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(NAMESPACES)?;
        Ok(table.get(namespace.0)?.is_some())
    }
}

impl NamespaceResolver for ChunkDb {
    fn resolve_namespace(&self, server: ServerId, dimension: &str) -> Result<NamespaceId> {
        if let Some(namespace) = self.memo.namespace(server, dimension) {
            return Ok(namespace);
        }

        let key = dimension_key(server.0, dimension);
        if let Some(namespace) = self.lookup_dimension(&key)? {
            self.memo.remember_namespace(server, dimension, namespace);
            return Ok(namespace);
        }

        match self.register_dimension(&key)? {
            Registration::Inserted(namespace) => {
                info!(%server, dimension, %namespace, "registered dimension");
            }
            Registration::Conflict => {
                debug!(%server, dimension, "dimension registered concurrently, re-reading");
            }
        }

        let namespace = self.lookup_dimension(&key)?.ok_or_else(|| {
            StoreError::Corrupt(format!("dimension {key:?} missing after registration"))
        })?;
        self.memo.remember_namespace(server, dimension, namespace);
        Ok(namespace)
    }

    fn ensure_namespace_storage(&self, namespace: NamespaceId) -> Result<()> {
        if self.memo.is_provisioned(namespace) {
            return Ok(());
        }
        if self.namespace_exists(namespace)? {
            self.memo.remember_provisioned(namespace);
            return Ok(());
        }

        let txn = self.db.begin_write()?;
        let created = {
            let mut table = txn.open_table(NAMESPACES)?;
            let created = table.insert(namespace.0, ())?.is_none();
            created
        };
        txn.commit()?;

        if created {
            debug!(%namespace, "provisioned namespace storage");
        }
        self.memo.remember_provisioned(namespace);
        Ok(())
    }

    fn dimensions(&self, server: ServerId) -> Result<Vec<(String, NamespaceId)>> {
        let (start, end) = server_key_range(server.0);
        let prefix_len = start.len();

        let txn = self.db.begin_read()?;
        let table = txn.open_table(DIMENSIONS)?;
        let mut dimensions = Vec::new();
        for entry in table.range(start.as_str()..end.as_str())? {
            let (key, value) = entry?;
            let name = key.value()[prefix_len..].to_owned();
            dimensions.push((name, NamespaceId(value.value())));
        }
        Ok(dimensions)
    }
}
