// src/traverse/engine.rs
// =============================================================================
// This module drives the level-synchronized breadth-first traversal.
//
// How it works:
// 1. levels[0] = [start], VisitedSet = {start}
// 2. For each depth d in 0..depth:
//    a. Split levels[d] into chunks (one per worker)
//    b. Spawn one FrontierWorker per chunk into a JoinSet
//    c. Wait for every worker to finish (the barrier)
//    d. The accumulated discoveries become levels[d + 1]
// 3. Record the total elapsed time
//
// An empty level spawns no workers and yields an empty next level, so once a
// level is empty every later level is empty too. Levels never overlap: level
// d + 1 is not partitioned until all of level d's workers are joined.
//
// run_sequential does the same walk with one resolver and no workers.
//
// Rust concepts:
// - JoinSet: A group of spawned tasks that we can wait on together
// - Arc: Lets every worker read the current frontier without copying it
// - Generics: The engine works with any ResolverFactory
// =============================================================================

use log::{debug, info};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};

use super::frontier::{Frontier, NextFrontier};
use super::partition::partition;
use super::visited::VisitedSet;
use super::worker::{resolve_or_empty, FrontierWorker};
use crate::resolver::{ResolveError, ResolverFactory};

/// Default worker budget per level.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Errors that stop a traversal before it produces a result.
///
/// Per-node lookup failures are not in here: they only ever make a node look
/// like it has no neighbors.
#[derive(Debug, Error)]
pub enum TraversalError {
    #[error("could not acquire a neighbor resolver: {0}")]
    ResourceInit(#[source] ResolveError),

    #[error("a level {depth} worker did not complete: {source}")]
    Worker {
        depth: usize,
        #[source]
        source: JoinError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    /// Expanding `levels[d]` into `levels[d + 1]`.
    Running(usize),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Parallel,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalConfig {
    /// Number of expansion steps. Depth 0 only reports the seed.
    pub depth: usize,
    /// Upper bound on workers per level. 0 behaves like 1.
    pub max_workers: usize,
}

/// Diagnostics for one expansion step `levels[depth] -> levels[depth + 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelStats {
    pub depth: usize,
    /// Size of the frontier this step produced.
    pub size: usize,
    /// Workers spawned for the step (0 for an empty input frontier).
    pub workers: usize,
    /// Lookups that failed and were treated as "no neighbors".
    pub failed_lookups: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

/// Outcome of one expansion step.
#[derive(Debug, Clone)]
pub struct LevelResult {
    pub frontier: Frontier,
    pub stats: LevelStats,
}

/// Everything a finished traversal reports.
#[derive(Debug, Clone)]
pub struct TraversalRun {
    pub start: String,
    pub mode: Mode,
    pub max_workers: usize,
    /// `levels[d]` holds the nodes first reached at depth `d`.
    pub levels: Vec<Frontier>,
    pub steps: Vec<LevelStats>,
    /// Size of the VisitedSet at the end of the run.
    pub visited: usize,
    pub elapsed: Duration,
}

impl TraversalRun {
    /// Node count per level, starting with the seed level.
    pub fn counts(&self) -> Vec<usize> {
        self.levels.iter().map(Frontier::len).collect()
    }

    pub fn failed_lookups(&self) -> usize {
        self.steps.iter().map(|s| s.failed_lookups).sum()
    }
}

pub struct TraversalEngine<F> {
    factory: Arc<F>,
    config: TraversalConfig,
    state: EngineState,
}

impl<F: ResolverFactory> TraversalEngine<F> {
    pub fn new(factory: F, config: TraversalConfig) -> Self {
        Self {
            factory: Arc::new(factory),
            config,
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Runs the parallel traversal from `start`.
    ///
    /// One resolver is acquired and released up front so a broken transport
    /// is reported before any level starts.
    pub async fn run(&mut self, start: &str) -> Result<TraversalRun, TraversalError> {
        // Preflight: make sure we can build a resolver at all, then let it go
        // (each worker acquires its own later)
        drop(self.factory.connect().map_err(TraversalError::ResourceInit)?);

        // Depth 0 is just the start node, which counts as visited
        let visited = VisitedSet::seeded(start);
        let mut levels = vec![Arc::new(Frontier::seed(start))];
        let mut steps = Vec::with_capacity(self.config.depth);
        let started = Instant::now();

        // One iteration per level; expand() only returns after its barrier,
        // so level d + 1 never overlaps level d
        for depth in 0..self.config.depth {
            self.state = EngineState::Running(depth);

            // Cheap pointer copy; workers read the frontier through the Arc
            let current = Arc::clone(&levels[depth]);

            let LevelResult { frontier, stats } = self.expand(depth, current, &visited).await?;
            info!(
                "level {} -> {} node(s) ({} worker(s), {:.3}s)",
                depth + 1,
                stats.size,
                stats.workers,
                stats.elapsed.as_secs_f64()
            );
            levels.push(Arc::new(frontier));
            steps.push(stats);
        }

        let elapsed = started.elapsed();
        self.state = EngineState::Done;

        // Every worker has been joined, so each Arc is unique again
        let levels = levels
            .into_iter()
            .map(|level| Arc::try_unwrap(level).unwrap_or_else(|shared| (*shared).clone()))
            .collect();

        Ok(TraversalRun {
            start: start.to_owned(),
            mode: Mode::Parallel,
            max_workers: self.config.max_workers,
            levels,
            steps,
            visited: visited.len(),
            elapsed,
        })
    }

    /// One fork-join step: partition, spawn, join all, merge.
    async fn expand(
        &self,
        depth: usize,
        current: Arc<Frontier>,
        visited: &VisitedSet,
    ) -> Result<LevelResult, TraversalError> {
        let started = Instant::now();

        // One range of indices per worker; none at all for an empty level
        let chunks = partition(current.len(), self.config.max_workers);

        if chunks.is_empty() {
            debug!("level {} is empty, no workers spawned", depth);
            return Ok(LevelResult {
                frontier: Frontier::default(),
                stats: LevelStats {
                    depth,
                    size: 0,
                    workers: 0,
                    failed_lookups: 0,
                    elapsed: started.elapsed(),
                },
            });
        }

        // Fresh accumulator for this level only
        let next = NextFrontier::default();
        let workers = chunks.len();
        let mut tasks = JoinSet::new();

        // Fork: every worker gets handles to the shared state (Arc clones,
        // not copies of the data) and is spawned as its own task
        for (id, chunk) in chunks.into_iter().enumerate() {
            let worker = FrontierWorker::new(
                id,
                Arc::clone(&current),
                chunk,
                visited.clone(),
                next.clone(),
            );
            let factory = Arc::clone(&self.factory);
            tasks.spawn(async move { worker.run(factory.as_ref()).await });
        }

        // Barrier: nothing of the next level starts before this drains
        let mut failed_lookups = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                // Normal case: the worker finished its chunk
                Ok(report) => failed_lookups += report.failed_lookups,
                // A panicking worker may have marked nodes visited without
                // merging them, so carry the panic on instead of continuing
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(source) => return Err(TraversalError::Worker { depth, source }),
            }
        }

        // All workers are joined, so nobody else touches `next` any more
        let frontier = next.take();
        Ok(LevelResult {
            stats: LevelStats {
                depth,
                size: frontier.len(),
                workers,
                failed_lookups,
                elapsed: started.elapsed(),
            },
            frontier,
        })
    }

    /// Same traversal with a single resolver on the calling task.
    pub async fn run_sequential(&mut self, start: &str) -> Result<TraversalRun, TraversalError> {
        // A single resolver serves the whole run; failing to get one is fatal
        let mut resolver = self.factory.connect().map_err(TraversalError::ResourceInit)?;

        let visited = VisitedSet::seeded(start);
        let mut levels = vec![Frontier::seed(start)];
        let mut steps = Vec::with_capacity(self.config.depth);
        let started = Instant::now();

        for depth in 0..self.config.depth {
            self.state = EngineState::Running(depth);
            let step_started = Instant::now();
            let mut failed_lookups = 0;
            let mut next = Vec::new();

            // Look up every node of the level in order, keeping only
            // neighbors nobody has seen yet
            for node in levels[depth].iter() {
                for neighbor in resolve_or_empty(&mut resolver, node, &mut failed_lookups).await {
                    if visited.try_insert(&neighbor) {
                        next.push(neighbor);
                    }
                }
            }

            let stats = LevelStats {
                depth,
                size: next.len(),
                workers: usize::from(!levels[depth].is_empty()),
                failed_lookups,
                elapsed: step_started.elapsed(),
            };
            info!(
                "level {} -> {} node(s) ({:.3}s)",
                depth + 1,
                stats.size,
                stats.elapsed.as_secs_f64()
            );
            levels.push(Frontier::from(next));
            steps.push(stats);
        }

        let elapsed = started.elapsed();
        self.state = EngineState::Done;

        Ok(TraversalRun {
            start: start.to_owned(),
            mode: Mode::Sequential,
            max_workers: 1,
            levels,
            steps,
            visited: visited.len(),
            elapsed,
        })
    }
}

// Serializes a Duration as fractional seconds (e.g. 0.42) for --json
fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is a JoinSet?
//    - A collection of spawned tokio tasks
//    - join_next() waits for whichever task finishes next
//    - Looping until it returns None means "wait for all of them"
//    - That loop is our barrier between levels
//
// 2. Why Arc<Frontier> instead of cloning the Vec?
//    - Spawned tasks must own what they use ('static)
//    - Arc gives each task shared ownership of one frontier
//    - Cloning an Arc just bumps a counter
//
// 3. Why is the engine generic over F: ResolverFactory?
//    - The real program talks HTTP, tests use an in-memory graph
//    - The engine doesn't care, it only calls connect() and resolve()
//
// 4. What does `?` do on self.expand(...).await?
//    - If a level fails (a worker was cancelled), run() returns the error
//    - Lookup failures never get here; workers absorb them
// -----------------------------------------------------------------------------
