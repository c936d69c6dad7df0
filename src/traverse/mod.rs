// src/traverse/mod.rs
// =============================================================================
// This module contains the level-by-level traversal engine.
//
// Submodules:
// - visited: The shared set of already-discovered nodes
// - partition: Splits a frontier into balanced chunks for workers
// - frontier: Per-level node lists and the next-level accumulator
// - worker: Processes one chunk of a frontier
// - engine: Runs the levels, one fork-join barrier per level
//
// Rust concepts:
// - Modules: Organize code into namespaces
// - pub use: Re-export items to simplify imports for users of this module
// =============================================================================

mod engine;
mod frontier;
mod partition;
mod visited;
mod worker;

/// Node identifiers are compared and hashed by exact value.
pub type NodeId = String;

pub use engine::{
    EngineState, LevelStats, Mode, TraversalConfig, TraversalEngine, TraversalRun,
    DEFAULT_MAX_WORKERS,
};
