// src/traverse/partition.rs
// =============================================================================
// This module splits a frontier into chunks, one per worker.
//
// How it works:
// - n nodes, k workers requested
// - actual_k = min(k, n), but at least 1 when there is any work
// - every chunk gets n / actual_k nodes, the first n % actual_k chunks get
//   one extra
//
// So chunk sizes never differ by more than one and no worker sits idle.
// =============================================================================

use std::ops::Range;

/// Number of workers a level of `len` nodes actually gets for a budget.
///
/// A budget of 0 is clamped to 1 so a non-empty frontier always makes progress.
pub fn worker_count(len: usize, budget: usize) -> usize {
    if len == 0 {
        return 0;
    }
    budget.clamp(1, len)
}

/// Splits `0..len` into contiguous, non-overlapping, near-equal ranges.
///
/// Returns an empty vector for `len == 0`.
pub fn partition(len: usize, budget: usize) -> Vec<Range<usize>> {
    let workers = worker_count(len, budget);
    if workers == 0 {
        return Vec::new();
    }

    // e.g. len = 10, workers = 4 -> base = 2, remainder = 2
    let base = len / workers;
    let remainder = len % workers;

    let mut chunks = Vec::with_capacity(workers);
    let mut start = 0;
    for index in 0..workers {
        // The first `remainder` chunks take one extra node: 3, 3, 2, 2
        let size = base + usize::from(index < remainder);
        chunks.push(start..start + size);
        start += size;
    }
    chunks
}
