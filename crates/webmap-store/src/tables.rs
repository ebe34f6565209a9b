//! redb table definitions for the chunk store.

use redb::TableDefinition;

/// Dimension registry keyed by `{server}/{dimension}`, valued by namespace id.
///
/// Key uniqueness is what makes concurrent first-writers converge.
pub const DIMENSIONS: TableDefinition<&str, u64> = TableDefinition::new("dimensions");

/// Provisioned namespaces. Presence of a key is the whole record.
pub const NAMESPACES: TableDefinition<u64, ()> = TableDefinition::new("namespaces");

/// Monotonic counters keyed by name.
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Chunk cells keyed by `(namespace, y, x, z)`, valued by a bincode `CellRecord`.
///
/// `y` precedes `x` so one layer of a namespace is a contiguous key range.
pub const CELLS: TableDefinition<(u64, i32, i32, i32), &[u8]> = TableDefinition::new("cells");

/// Counter holding the next namespace id to hand out.
pub const NEXT_NAMESPACE: &str = "next_namespace";

/// Registry key for a dimension of a server.
pub fn dimension_key(server: u64, dimension: &str) -> String {
    format!("{server}/{dimension}")
}

/// Half-open key range covering every dimension of a server.
///
/// `'0'` is the byte after `'/'`, so the range stops exactly at the prefix end.
pub fn server_key_range(server: u64) -> (String, String) {
    (format!("{server}/"), format!("{server}0"))
}
