// src/resolver/graph_file.rs
// =============================================================================
// An offline resolver backed by an adjacency map.
//
// File format (JSON):
//   {
//     "A": ["B", "C"],
//     "B": ["D"]
//   }
//
// Nodes that are not keys of the map simply have no neighbors. Lookups never
// fail, so this is handy for trying the crawler without the remote service.
// =============================================================================

use log::debug;
use std::collections::HashMap;
use std::future::{self, Future};
use std::path::Path;
use std::sync::Arc;

use super::{NeighborResolver, ResolveError, ResolverFactory};
use crate::traverse::NodeId;

type Adjacency = HashMap<NodeId, Vec<NodeId>>;

/// Factory for resolvers that read from one shared, immutable adjacency map.
#[derive(Debug, Clone)]
pub struct GraphFileResolverFactory {
    graph: Arc<Adjacency>,
}

impl GraphFileResolverFactory {
    /// Reads and parses an adjacency map from `path`.
    pub fn load(path: &Path) -> Result<Self, ResolveError> {
        // Read the whole file, then parse it as a map of node -> neighbors
        let contents = std::fs::read_to_string(path).map_err(|e| ResolveError::GraphFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let graph: Adjacency =
            serde_json::from_str(&contents).map_err(|e| ResolveError::GraphFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!("loaded {} adjacency entries from {}", graph.len(), path.display());
        Ok(Self::from_map(graph))
    }

    pub fn from_map(graph: Adjacency) -> Self {
        Self {
            graph: Arc::new(graph),
        }
    }
}

impl ResolverFactory for GraphFileResolverFactory {
    type Resolver = GraphFileResolver;

    fn connect(&self) -> Result<Self::Resolver, ResolveError> {
        Ok(GraphFileResolver {
            graph: Arc::clone(&self.graph),
        })
    }
}

#[derive(Debug)]
pub struct GraphFileResolver {
    graph: Arc<Adjacency>,
}

impl NeighborResolver for GraphFileResolver {
    fn resolve(
        &mut self,
        node: &str,
    ) -> impl Future<Output = Result<Vec<NodeId>, ResolveError>> + Send {
        // No I/O here, so the future is ready immediately.
        // Unknown nodes get an empty list (unwrap_or_default)
        future::ready(Ok(self.graph.get(node).cloned().unwrap_or_default()))
    }
}
