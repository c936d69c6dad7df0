// src/traverse/worker.rs
// =============================================================================
// A FrontierWorker processes one chunk of the current frontier.
//
// How it works:
// 1. Acquire its own resolver from the factory
// 2. For each node of the chunk, in order, look up the neighbors
// 3. Keep each neighbor that VisitedSet reports as newly inserted
// 4. Append the whole local batch to the shared NextFrontier once
// 5. Drop the resolver
//
// A failed lookup counts as "no neighbors" for that node. It is logged and
// counted, and the worker moves on to the next node.
// =============================================================================

use log::{debug, warn};
use std::ops::Range;
use std::sync::Arc;

use super::frontier::{Frontier, NextFrontier};
use super::visited::VisitedSet;
use super::NodeId;
use crate::resolver::{NeighborResolver, ResolverFactory};

/// What one worker did during a level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub processed: usize,
    pub discovered: usize,
    pub failed_lookups: usize,
}

pub struct FrontierWorker {
    id: usize,
    frontier: Arc<Frontier>,
    chunk: Range<usize>,
    visited: VisitedSet,
    next: NextFrontier,
}

impl FrontierWorker {
    pub fn new(
        id: usize,
        frontier: Arc<Frontier>,
        chunk: Range<usize>,
        visited: VisitedSet,
        next: NextFrontier,
    ) -> Self {
        Self {
            id,
            frontier,
            chunk,
            visited,
            next,
        }
    }

    pub async fn run<F: ResolverFactory>(self, factory: &F) -> WorkerReport {
        // Our slice of the level; nothing outside `chunk` is ever touched
        let nodes = &self.frontier.as_slice()[self.chunk.clone()];

        // Each worker owns its resolver (and its connections) for its lifetime
        let mut resolver = match factory.connect() {
            Ok(resolver) => resolver,
            Err(e) => {
                warn!("worker {}: {}; skipping {} node(s)", self.id, e, nodes.len());
                return WorkerReport {
                    processed: 0,
                    discovered: 0,
                    failed_lookups: nodes.len(),
                };
            }
        };

        let mut report = WorkerReport::default();

        // Private list of discoveries; no lock needed while we fill it
        let mut local_new = Vec::new();

        for node in nodes {
            // A failed lookup comes back as an empty list (and is counted)
            let neighbors = resolve_or_empty(&mut resolver, node, &mut report.failed_lookups).await;
            report.processed += 1;

            // try_insert is the only shared operation per neighbor: whoever
            // inserts first owns the discovery
            for neighbor in neighbors {
                if self.visited.try_insert(&neighbor) {
                    local_new.push(neighbor);
                }
            }
        }

        // Release the transport before touching shared state
        drop(resolver);

        report.discovered = local_new.len();
        debug!(
            "worker {}: {} node(s) [{}..{}) -> {} new",
            self.id, report.processed, self.chunk.start, self.chunk.end, report.discovered
        );
        // One lock acquisition for the whole batch
        self.next.append(local_new);

        report
    }
}

/// Looks up `node`, turning any failure into an empty neighbor list.
pub(super) async fn resolve_or_empty<R: NeighborResolver>(
    resolver: &mut R,
    node: &str,
    failed_lookups: &mut usize,
) -> Vec<NodeId> {
    match resolver.resolve(node).await {
        Ok(neighbors) => neighbors,
        Err(e) => {
            warn!("{}", e);
            *failed_lookups += 1;
            Vec::new()
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does run() take `self` and not `&self`?
//    - The worker is moved into its task and used up there
//    - Nothing else needs it after the chunk is done
//
// 2. Why collect into local_new first?
//    - Appending one node at a time would lock NextFrontier per node
//    - A single batch append keeps the shared lock short and rare
//
// 3. What does drop(resolver) do?
//    - Runs the resolver's destructor right now, closing its connections
//    - Without it, the resolver would live until the end of the function
// -----------------------------------------------------------------------------
