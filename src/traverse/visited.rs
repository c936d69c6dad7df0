// src/traverse/visited.rs
// =============================================================================
// This module holds the set of nodes the traversal has already discovered.
//
// Every worker of a level shares one VisitedSet. The only mutation it offers
// is an atomic "insert if absent" (try_insert), which is the single point
// where discoveries are deduplicated across the whole run.
//
// Rust concepts:
// - Arc: Shared ownership across tasks
// - DashSet: A concurrent set split into shards, each behind its own lock,
//   so workers inserting different ids rarely wait on each other
// =============================================================================

use dashmap::DashSet;
use std::sync::Arc;

use super::NodeId;

/// Shared, monotonically growing set of discovered node ids.
///
/// Cloning a `VisitedSet` clones the handle, not the contents: all clones see
/// the same underlying set.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<DashSet<NodeId>>,
}

impl VisitedSet {
    /// Creates a set that already contains the seed node.
    pub fn seeded(seed: &str) -> Self {
        let set = Self::default();
        set.try_insert(seed);
        set
    }

    /// Inserts `node` if it is not present yet.
    ///
    /// Returns true iff this call inserted it. DashSet checks and inserts
    /// while holding the shard's write lock, so two concurrent callers racing
    /// on the same id can never both see `true`.
    pub fn try_insert(&self, node: &str) -> bool {
        self.inner.insert(node.to_owned())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}
