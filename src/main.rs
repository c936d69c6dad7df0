// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (env_logger, to stderr)
// 3. Build the neighbor resolver (HTTP service or local graph file)
// 4. Run the traversal and print per-level counts and timing
// 5. Exit with proper code (0 = success, 1 = bad arguments or setup failure)
//
// Lookup failures during the crawl are logged, not fatal: the node is just
// treated as having no neighbors.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;       // src/cli.rs - command-line parsing
mod resolver;  // src/resolver/ - neighbor lookups (HTTP, graph file)
mod traverse;  // src/traverse/ - the level-by-level engine

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, warn};
use serde::Serialize;
use std::time::Duration;

use cli::Cli;
use resolver::{GraphFileResolverFactory, HttpResolverFactory, ResolverFactory};
use traverse::{EngineState, LevelStats, Mode, TraversalConfig, TraversalEngine, TraversalRun};

#[tokio::main]
async fn main() {
    // Parse arguments ourselves instead of Cli::parse(), which would exit
    // with clap's code 2 on bad arguments
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(exit_code(&e));
        }
    };

    init_logging(cli.verbose);

    let exit_code = match run(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

// Maps a clap parse error to our exit code:
//   --help / --version -> 0 (they print to stdout and are not failures)
//   anything else      -> 1 (wrong argument count, bad number, ...)
fn exit_code(error: &clap::Error) -> i32 {
    if error.use_stderr() {
        1
    } else {
        0
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let config = TraversalConfig {
        depth: cli.depth,
        max_workers: cli.max_workers(),
    };

    // Pick the resolver: local graph file if given, otherwise the HTTP service.
    // The two factories are different types, so each branch runs its own crawl
    let run = match &cli.graph_file {
        Some(path) => {
            let factory = GraphFileResolverFactory::load(path)?;
            crawl(factory, config, cli).await?
        }
        None => {
            let factory =
                HttpResolverFactory::new(&cli.service_url, Duration::from_secs(cli.timeout_secs))
                    .context("invalid --service-url")?;
            crawl(factory, config, cli).await?
        }
    };

    // Failures don't change the counts, but the user should know about them
    let failed = run.failed_lookups();
    if failed > 0 {
        warn!("{} lookup(s) failed and were counted as having no neighbors", failed);
    }

    print_results(&run, cli.json)
}

// Runs the traversal with whichever resolver the user picked
async fn crawl<F: ResolverFactory>(
    factory: F,
    config: TraversalConfig,
    cli: &Cli,
) -> Result<TraversalRun> {
    let mut engine = TraversalEngine::new(factory, config);

    let run = if cli.sequential {
        engine.run_sequential(&cli.start_node).await
    } else {
        engine.run(&cli.start_node).await
    };
    // Still "running" after returning means a level was cut short
    if let EngineState::Running(depth) = engine.state() {
        error!("traversal stopped while expanding level {}", depth);
    }

    run.context("traversal failed")
}

/// Machine-readable form of a run (--json).
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    start: &'a str,
    mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_threads: Option<usize>,
    counts: Vec<usize>,
    visited: usize,
    failed_lookups: usize,
    elapsed_secs: f64,
    steps: &'a [LevelStats],
}

impl<'a> From<&'a TraversalRun> for JsonReport<'a> {
    fn from(run: &'a TraversalRun) -> Self {
        Self {
            start: &run.start,
            mode: run.mode,
            max_threads: (run.mode == Mode::Parallel).then_some(run.max_workers),
            counts: run.counts(),
            visited: run.visited,
            failed_lookups: run.failed_lookups(),
            elapsed_secs: run.elapsed.as_secs_f64(),
            steps: &run.steps,
        }
    }
}

fn print_results(run: &TraversalRun, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(&JsonReport::from(run))?;
        println!("{}", json_output);
    } else {
        for line in report_lines(run) {
            println!("{}", line);
        }
    }
    Ok(())
}

// Plain report:
//   Level 0 count: 1
//   Level 1 count: 2
//   Time to crawl (parallel): 0.42s
//   Max threads: 8
fn report_lines(run: &TraversalRun) -> Vec<String> {
    let mut lines: Vec<String> = run
        .counts()
        .iter()
        .enumerate()
        .map(|(depth, count)| format!("Level {} count: {}", depth, count))
        .collect();

    let label = match run.mode {
        Mode::Parallel => "parallel",
        Mode::Sequential => "sequential",
    };
    lines.push(format!(
        "Time to crawl ({}): {}s",
        label,
        run.elapsed.as_secs_f64()
    ));

    if run.mode == Mode::Parallel {
        lines.push(format!("Max threads: {}", run.max_workers));
    }

    lines
}
