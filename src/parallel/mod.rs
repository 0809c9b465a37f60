//! Generic worker-pool execution
//!
//! This module owns **system resource management** and **execution strategy**
//! and nothing else. It knows how many cores the host has, how to fan jobs out
//! to a fixed set of crossbeam-backed worker threads, and how to fan results
//! back in. It does not know what a job is; the scanner supplies both the jobs
//! and the processor.
//!
//! ```text
//!   producer ──▶ job queue (cap = workers) ──▶ worker 0..N ──▶ result queue (cap = jobs) ──▶ drain
//!                                                   │
//!                                                   └──▶ failure queue (diagnostics)
//! ```
//!
//! # Example
//!
//! ```rust
//! use logtally::parallel::ExecutionStrategy;
//!
//! let workers = ExecutionStrategy::calculate_optimal_workers(0, 100);
//! let strategy = ExecutionStrategy::auto(10, 2, workers);
//! let outcome = strategy.execute(vec![1u32, 2, 3], |n| Ok(n * 10)).unwrap();
//!
//! let mut results = outcome.results;
//! results.sort();
//! assert_eq!(results, vec![10, 20, 30]);
//! ```

pub mod core;

pub use self::core::{
    ExecutionOutcome, ExecutionStrategy, JobFailure, MAX_WORKERS, ParallelExecutor, SequentialExecutor,
};
