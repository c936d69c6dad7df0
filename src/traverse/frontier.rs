// src/traverse/frontier.rs
// =============================================================================
// Frontiers: the nodes first reached at one depth of the traversal.
//
// - Frontier: an immutable, ordered list of node ids for a finished level
// - NextFrontier: the shared accumulator workers append to while a level runs
//
// Order inside a frontier only decides where the partition boundaries fall.
// Duplicates are never filtered here; VisitedSet is the only dedup point.
// =============================================================================

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

use super::NodeId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Frontier(Vec<NodeId>);

impl Frontier {
    /// The depth-0 frontier: just the start node.
    pub fn seed(start: &str) -> Self {
        Self(vec![start.to_owned()])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.0.iter()
    }
}

impl From<Vec<NodeId>> for Frontier {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self(nodes)
    }
}

/// Collects the next level's discoveries from all workers of a level.
///
/// Workers append their whole local batch in one call, so the lock is taken
/// once per worker rather than once per node.
#[derive(Debug, Clone, Default)]
pub struct NextFrontier {
    inner: Arc<Mutex<Vec<NodeId>>>,
}

impl NextFrontier {
    pub fn append(&self, mut batch: Vec<NodeId>) {
        if batch.is_empty() {
            return;
        }
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(&mut batch);
    }

    /// Takes everything accumulated so far. Only call this after the level's
    /// workers have all been joined.
    pub fn take(&self) -> Frontier {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Frontier(std::mem::take(&mut *guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_frontier() {
        let frontier = Frontier::seed("A");
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.as_slice(), ["A".to_string()]);
    }

    #[test]
    fn test_next_frontier_keeps_batches_whole() {
        let next = NextFrontier::default();
        let worker_a = next.clone();
        let worker_b = next.clone();

        worker_a.append(vec!["B".into(), "C".into()]);
        worker_b.append(Vec::new());
        worker_b.append(vec!["D".into()]);

        let frontier = next.take();
        assert_eq!(frontier, Frontier::from(vec!["B".into(), "C".into(), "D".into()]));
        assert!(next.take().is_empty());
    }
}
