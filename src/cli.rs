// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Usage:
//   frontier-crawl <start_node> <depth> [max_threads] [options]
//
// We use the "derive" API which lets us define the CLI structure using a
// Rust struct and attributes (the #[...] things).
// =============================================================================

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::resolver::{DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT};
use crate::traverse::DEFAULT_MAX_WORKERS;

#[derive(Parser, Debug)]
#[command(
    name = "frontier-crawl",
    version = "0.1.0",
    about = "Breadth-first crawl of a remote neighbors service, level by level",
    long_about = "frontier-crawl starts from one node and expands it level by level. \
                  Every node of a level is looked up on the neighbors service by a pool of \
                  parallel workers, and the count of newly discovered nodes is reported per level."
)]
pub struct Cli {
    /// Node to start from (e.g. "Tom Hanks")
    pub start_node: String,

    /// Number of levels to expand beyond the start node
    ///
    /// Depth 0 = just the start node
    /// Depth 1 = start node + its neighbors
    /// etc.
    pub depth: usize,

    /// Maximum number of parallel workers per level (default: 8)
    ///
    /// Zero or negative values fall back to the default
    #[arg(allow_negative_numbers = true)]
    pub max_threads: Option<i64>,

    /// Use a single resolver and no workers
    #[arg(long)]
    pub sequential: bool,

    /// Base URL of the neighbors service; the node id is appended as a path segment
    #[arg(long, default_value = DEFAULT_SERVICE_URL)]
    pub service_url: String,

    /// Per-request timeout in seconds (at least 1)
    ///
    /// A zero timeout would fail every lookup, so it is rejected
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Read neighbors from a local JSON adjacency map instead of the service
    ///
    /// Format: {"A": ["B", "C"], "B": ["D"]}
    #[arg(long, conflicts_with = "service_url")]
    pub graph_file: Option<PathBuf>,

    /// Output results in JSON format instead of plain lines
    #[arg(long)]
    pub json: bool,

    /// More log output (-v = info, -vv = debug). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The worker budget, with non-positive or missing values mapped to the default.
    pub fn max_workers(&self) -> usize {
        match self.max_threads {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(DEFAULT_MAX_WORKERS),
            _ => DEFAULT_MAX_WORKERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("frontier-crawl").chain(args.iter().copied()))
    }

    #[test]
    fn test_positional_arguments() {
        let cli = parse(&["Tom Hanks", "3", "4"]).unwrap();
        assert_eq!(cli.start_node, "Tom Hanks");
        assert_eq!(cli.depth, 3);
        assert_eq!(cli.max_workers(), 4);
        assert!(!cli.sequential);
        assert_eq!(cli.service_url, DEFAULT_SERVICE_URL);
    }

    #[test]
    fn test_max_threads_defaults() {
        assert_eq!(parse(&["A", "2"]).unwrap().max_workers(), 8);
        assert_eq!(parse(&["A", "2", "0"]).unwrap().max_workers(), 8);
        assert_eq!(parse(&["A", "2", "-3"]).unwrap().max_workers(), 8);
    }

    #[test]
    fn test_wrong_argument_count() {
        assert!(parse(&["A"]).is_err());
        assert!(parse(&["A", "2", "4", "extra"]).is_err());
    }

    #[test]
    fn test_non_numeric_depth() {
        assert!(parse(&["A", "deep"]).is_err());
        assert!(parse(&["A", "-1"]).is_err());
    }

    #[test]
    fn test_timeout_must_be_positive() {
        assert!(parse(&["A", "2", "--timeout-secs", "0"]).is_err());
        assert_eq!(parse(&["A", "2", "--timeout-secs", "1"]).unwrap().timeout_secs, 1);
        assert_eq!(parse(&["A", "2"]).unwrap().timeout_secs, 15);
    }

    #[test]
    fn test_graph_file_conflicts_with_service_url() {
        let result = parse(&[
            "A",
            "2",
            "--graph-file",
            "g.json",
            "--service-url",
            "http://localhost/neighbors/",
        ]);
        assert!(result.is_err());
    }
}
