// src/resolver/mod.rs
// =============================================================================
// This module answers one question for the traversal: "what are the
// neighbors of this node?"
//
// Submodules:
// - http: Asks the remote neighbors service over HTTP
// - graph_file: Reads an adjacency map from a local JSON file
//
// The traversal never talks to a transport directly. It gets a
// ResolverFactory, and every worker calls connect() once to get its own
// NeighborResolver. The resolver is dropped when the worker finishes, which
// releases whatever connection state it held.
//
// Rust concepts:
// - Traits: The seam between the traversal and the transport
// - Associated types: Each factory says which resolver it produces
// - impl Future in traits: Async methods without boxing
// =============================================================================

mod graph_file;
mod http;

use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

use crate::traverse::NodeId;

pub use graph_file::GraphFileResolverFactory;
pub use http::{HttpResolverFactory, DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT};

/// Why a neighbor lookup (or resolver setup) failed.
///
/// Lookup failures never stop a traversal: the worker logs them and treats
/// the node as having no neighbors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Connection failure, reset, redirect loop, body read error...
    #[error("request for '{node}' failed: {source}")]
    Transport {
        node: NodeId,
        #[source]
        source: reqwest::Error,
    },

    /// The per-call timeout elapsed.
    #[error("request for '{node}' timed out")]
    Timeout { node: NodeId },

    /// The service answered with a non-2xx status.
    #[error("service returned HTTP {status} for '{node}'")]
    Status { node: NodeId, status: u16 },

    /// The body was not a JSON object with a `neighbors` array.
    #[error("malformed neighbors payload for '{node}': {reason}")]
    Malformed { node: NodeId, reason: String },

    /// The resolver could not be constructed at all.
    #[error("could not initialize resolver: {0}")]
    Init(String),

    #[error("could not load graph file {}: {reason}", .path.display())]
    GraphFile { path: PathBuf, reason: String },
}

/// A per-worker handle that looks up neighbors one node at a time.
pub trait NeighborResolver: Send + 'static {
    /// Returns the neighbor ids of `node`, in the order the source lists them.
    fn resolve(
        &mut self,
        node: &str,
    ) -> impl Future<Output = Result<Vec<NodeId>, ResolveError>> + Send;
}

/// Hands out independent resolvers, one per worker.
pub trait ResolverFactory: Send + Sync + 'static {
    type Resolver: NeighborResolver;

    /// Acquires a fresh resolver. Nothing it holds is shared with other
    /// resolvers from the same factory.
    fn connect(&self) -> Result<Self::Resolver, ResolveError>;
}
