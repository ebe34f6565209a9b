//! Chunk cell repository.

use std::borrow::Cow;
use std::fmt;
use std::ops::Bound;

use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use tracing::debug;
use webmap_core::{CellMeta, CellPos, CellWrite, NamespaceId, Region};

use crate::db::ChunkDb;
use crate::error::{Result, StoreError};
use crate::tables::{CELLS, NAMESPACES};

/// Durable store of chunk cells, keyed by `(namespace, x, y, z)`.
pub trait ChunkRepository: Send + Sync {
    /// Insert-or-replace every cell of the batch in one atomic write.
    ///
    /// Duplicate keys within a batch resolve to the last one submitted.
    fn upsert_cells(&self, namespace: NamespaceId, cells: &[CellWrite]) -> Result<()>;

    /// All cells of the region's footprint and layer, in unspecified order.
    ///
    /// Every call scans afresh; no cursor state is kept between calls.
    fn scan_range(&self, namespace: NamespaceId, region: &Region) -> Result<CellScan>;

    /// The cell stored at one position, if any.
    fn get_cell(&self, namespace: NamespaceId, pos: CellPos) -> Result<Option<StoredCell>>;
}

/// A full stored cell.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCell {
    pub pos: CellPos,
    pub color: Vec<u8>,
    pub meta: CellMeta,
}

impl fmt::Debug for StoredCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCell")
            .field("pos", &self.pos)
            .field("color", &format_args!("<{} bytes>", self.color.len()))
            .field("meta", &self.meta)
            .finish()
    }
}

/// A cell returned by a region scan: position and encoded color block.
#[derive(Clone, PartialEq, Eq)]
pub struct ScannedCell {
    pub x: i32,
    pub z: i32,
    pub color: Vec<u8>,
}

impl fmt::Debug for ScannedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannedCell")
            .field("x", &self.x)
            .field("z", &self.z)
            .field("color", &format_args!("<{} bytes>", self.color.len()))
            .finish()
    }
}

/// Finite sequence of scanned cells taken from one read snapshot.
#[derive(Debug, Default)]
pub struct CellScan {
    cells: std::vec::IntoIter<ScannedCell>,
}

impl CellScan {
    /// Wrap already-collected cells.
    pub fn from_cells(cells: Vec<ScannedCell>) -> Self {
        Self {
            cells: cells.into_iter(),
        }
    }
}

impl Iterator for CellScan {
    type Item = ScannedCell;

    fn next(&mut self) -> Option<Self::Item> {
        self.cells.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cells.size_hint()
    }
}

impl ExactSizeIterator for CellScan {}

/// On-disk value of a cell.
#[derive(Serialize, Deserialize)]
struct CellRecord<'a> {
    color: Cow<'a, [u8]>,
    meta: Cow<'a, str>,
}

type CellKey = (u64, i32, i32, i32);

const fn cell_key(namespace: NamespaceId, pos: CellPos) -> CellKey {
    (namespace.0, pos.y, pos.x, pos.z)
}

// Keys of one x column of the region, restricted to `[z0, z_end)`.
fn column_bounds(namespace: NamespaceId, region: &Region, x: i32) -> (Bound<CellKey>, Bound<CellKey>) {
    let start = Bound::Included((namespace.0, region.y, x, region.z0));
    let end = match i32::try_from(region.z_end()) {
        Ok(z_end) => Bound::Excluded((namespace.0, region.y, x, z_end)),
        Err(_) => Bound::Included((namespace.0, region.y, x, i32::MAX)),
    };
    (start, end)
}

impl ChunkRepository for ChunkDb {
    fn upsert_cells(&self, namespace: NamespaceId, cells: &[CellWrite]) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            if txn.open_table(NAMESPACES)?.get(namespace.0)?.is_none() {
                return Err(StoreError::UnknownNamespace(namespace));
            }

            let mut table = txn.open_table(CELLS)?;
            let mut buf = Vec::new();
            for cell in cells {
                buf.clear();
                let record = CellRecord {
                    color: Cow::Borrowed(cell.color.as_slice()),
                    meta: Cow::Borrowed(cell.meta.as_str()),
                };
                bincode::serialize_into(&mut buf, &record)?;
                table.insert(cell_key(namespace, cell.pos), buf.as_slice())?;
            }
        }
        txn.commit()?;

        debug!(%namespace, cells = cells.len(), "upserted cells");
        Ok(())
    }

    fn scan_range(&self, namespace: NamespaceId, region: &Region) -> Result<CellScan> {
        let txn = self.db.begin_read()?;
        if txn.open_table(NAMESPACES)?.get(namespace.0)?.is_none() {
            return Err(StoreError::UnknownNamespace(namespace));
        }
        if region.is_empty() {
            return Ok(CellScan::default());
        }

        let table = txn.open_table(CELLS)?;
        let mut cells = Vec::new();
        // one key range per column, bounded in z
        let x_last = i32::try_from(region.x_end() - 1).unwrap_or(i32::MAX);
        for column in region.x0..=x_last {
            for entry in table.range(column_bounds(namespace, region, column))? {
                let (key, value) = entry?;
                let (_, _, x, z) = key.value();
                let record: CellRecord<'_> = bincode::deserialize(value.value())?;
                cells.push(ScannedCell {
                    x,
                    z,
                    color: record.color.into_owned(),
                });
            }
        }

        debug!(%namespace, ?region, cells = cells.len(), "scanned region");
        Ok(CellScan::from_cells(cells))
    }

    fn get_cell(&self, namespace: NamespaceId, pos: CellPos) -> Result<Option<StoredCell>> {
        let txn = self.db.begin_read()?;
        if txn.open_table(NAMESPACES)?.get(namespace.0)?.is_none() {
            return Err(StoreError::UnknownNamespace(namespace));
        }

        let table = txn.open_table(CELLS)?;
        let Some(value) = table.get(cell_key(namespace, pos))? else {
            return Ok(None);
        };
        let record: CellRecord<'_> = bincode::deserialize(value.value())?;
        Ok(Some(StoredCell {
            pos,
            color: record.color.into_owned(),
            meta: CellMeta(record.meta.into_owned()),
        }))
    }
}
