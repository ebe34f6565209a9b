//! In-process memo of resolved namespaces.

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use webmap_core::{NamespaceId, ServerId};

/// Remembers dimension mappings and provisioned namespaces.
///
/// Mappings are immutable once committed, so entries are never invalidated.
#[derive(Default)]
pub(crate) struct NamespaceMemo {
    dimensions: RwLock<HashMap<ServerId, HashMap<String, NamespaceId>>>,
    provisioned: RwLock<HashSet<NamespaceId>>,
}

impl NamespaceMemo {
    pub fn namespace(&self, server: ServerId, dimension: &str) -> Option<NamespaceId> {
        self.dimensions
            .read()
            .get(&server)
            .and_then(|dims| dims.get(dimension))
            .copied()
    }

    pub fn remember_namespace(&self, server: ServerId, dimension: &str, namespace: NamespaceId) {
        self.dimensions
            .write()
            .entry(server)
            .or_default()
            .insert(dimension.to_owned(), namespace);
    }

    pub fn is_provisioned(&self, namespace: NamespaceId) -> bool {
        self.provisioned.read().contains(&namespace)
    }

    pub fn remember_provisioned(&self, namespace: NamespaceId) {
        self.provisioned.write().insert(namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_per_server() {
        let memo = NamespaceMemo::default();
        memo.remember_namespace(ServerId(1), "overworld", NamespaceId(3));

        assert_eq!(memo.namespace(ServerId(1), "overworld"), Some(NamespaceId(3)));
        assert_eq!(memo.namespace(ServerId(2), "overworld"), None);
        assert_eq!(memo.namespace(ServerId(1), "nether"), None);
    }

    #[test]
    fn provisioned_set() {
        let memo = NamespaceMemo::default();
        assert!(!memo.is_provisioned(NamespaceId(1)));
        memo.remember_provisioned(NamespaceId(1));
        assert!(memo.is_provisioned(NamespaceId(1)));
    }
}
