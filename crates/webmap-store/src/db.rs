//! Database handle.

use std::fmt;
use std::path::Path;

use redb::backends::InMemoryBackend;
use redb::Database;
use tracing::{info, trace};

use crate::error::Result;
use crate::memo::NamespaceMemo;
use crate::tables::{CELLS, COUNTERS, DIMENSIONS, NAMESPACES};

/// Open handle to the chunk store database.
///
/// Implements both [`NamespaceResolver`](crate::NamespaceResolver) and
/// [`ChunkRepository`](crate::ChunkRepository). Operations are blocking; share
/// the handle between threads behind an `Arc`.
pub struct ChunkDb {
    pub(crate) db: Database,
    pub(crate) memo: NamespaceMemo,
}

impl ChunkDb {
    /// Open an existing database file, or create one if the path is empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pre_existent = path.try_exists().unwrap_or(false);
        trace!(?pre_existent, path = %path.display(), "opening chunk database");

        let db = Database::create(path)?;
        let store = Self::bootstrap(db)?;

        info!(?pre_existent, path = %path.display(), "opened chunk database");
        Ok(store)
    }

    /// Create a database that lives only as long as the handle.
    pub fn in_memory() -> Result<Self> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::bootstrap(db)
    }

    // create every table up front so read transactions never see a missing one
    fn bootstrap(db: Database) -> Result<Self> {
        let txn = db.begin_write()?;
        txn.open_table(DIMENSIONS)?;
        txn.open_table(NAMESPACES)?;
        txn.open_table(COUNTERS)?;
        txn.open_table(CELLS)?;
        txn.commit()?;

        Ok(Self {
            db,
            memo: NamespaceMemo::default(),
        })
    }
}

impl fmt::Debug for ChunkDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkDb").finish_non_exhaustive()
    }
}
