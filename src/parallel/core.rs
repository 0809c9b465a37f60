use anyhow::Result;
use crossbeam::channel::{Receiver, Sender, bounded, unbounded};
use std::fmt::Display;

/// Largest worker pool a single run may spawn
pub const MAX_WORKERS: usize = 1024;

/// A job the processor rejected, kept so callers can report what was dropped
#[derive(Debug)]
pub struct JobFailure<T> {
    pub job: T,
    pub error: anyhow::Error,
}

/// Everything a pool run produced
///
/// `results` arrive in completion order, which is unspecified. Consumers must
/// not depend on it.
#[derive(Debug)]
pub struct ExecutionOutcome<T, R> {
    pub results: Vec<R>,
    pub failures: Vec<JobFailure<T>>,
    pub workers: usize,
}

impl<T, R> ExecutionOutcome<T, R> {
    fn empty(workers: usize) -> Self {
        Self {
            results: Vec::new(),
            failures: Vec::new(),
            workers,
        }
    }
}

/// Bounded worker pool fed by a job queue and drained through a result queue
pub struct ParallelExecutor<T, R> {
    workers: usize,
    _phantom: std::marker::PhantomData<(T, R)>,
}

/// Channel ends owned by one worker thread
struct WorkerContext<T, R> {
    worker_id: usize,
    job_rx: Receiver<T>,
    result_tx: Sender<R>,
    failure_tx: Sender<JobFailure<T>>,
}

impl<T, R> ParallelExecutor<T, R>
where
    T: Display + Send,
    R: Send,
{
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_WORKERS),
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `processor` once per job on exactly `workers` threads
    ///
    /// The job queue holds one slot per worker; the result queue holds one slot
    /// per job, so workers never block handing results back. Every worker owns
    /// a clone of the result sender, which makes the queue close exactly when
    /// the last worker exits and lets the drain loop below terminate.
    pub fn execute<F>(&self, jobs: Vec<T>, processor: F) -> Result<ExecutionOutcome<T, R>>
    where
        F: Fn(&T) -> Result<R> + Sync,
    {
        if jobs.is_empty() {
            return Ok(ExecutionOutcome::empty(self.workers));
        }

        let job_count = jobs.len();
        let (job_tx, job_rx): (Sender<T>, Receiver<T>) = bounded(self.workers);
        let (result_tx, result_rx): (Sender<R>, Receiver<R>) = bounded(job_count);
        let (failure_tx, failure_rx) = unbounded();
        let processor = &processor;

        crossbeam::thread::scope(|s| {
            for worker_id in 0..self.workers {
                let ctx = WorkerContext {
                    worker_id,
                    job_rx: job_rx.clone(),
                    result_tx: result_tx.clone(),
                    failure_tx: failure_tx.clone(),
                };

                s.spawn(move |_| Self::worker_thread(ctx, processor));
            }

            // Only workers may hold channel ends from here on
            drop(job_rx);
            drop(result_tx);
            drop(failure_tx);

            for job in jobs {
                if job_tx.send(job).is_err() {
                    break; // Every worker is gone
                }
            }
            drop(job_tx);

            let results: Vec<R> = result_rx.iter().collect();
            let failures: Vec<JobFailure<T>> = failure_rx.iter().collect();

            tracing::debug!(
                "Pool drained: {} results, {} failures from {} jobs",
                results.len(),
                failures.len(),
                job_count
            );

            ExecutionOutcome {
                results,
                failures,
                workers: self.workers,
            }
        })
        .map_err(|_| anyhow::anyhow!("Thread panic occurred during parallel execution"))
    }

    fn worker_thread<F>(ctx: WorkerContext<T, R>, processor: &F)
    where
        F: Fn(&T) -> Result<R>,
    {
        let mut handled = 0usize;

        while let Ok(job) = ctx.job_rx.recv() {
            handled += 1;
            match processor(&job) {
                Ok(result) => {
                    if ctx.result_tx.send(result).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(error) => {
                    tracing::warn!("[worker-{}] Error processing {}: {:#}", ctx.worker_id, job, error);
                    if ctx.failure_tx.send(JobFailure { job, error }).is_err() {
                        break; // Receiver dropped
                    }
                }
            }
        }

        tracing::trace!("[worker-{}] Exiting after {} jobs", ctx.worker_id, handled);
    }
}

/// Runs every job on the calling thread, for tiny workloads or debugging
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn execute<T, R, F>(jobs: Vec<T>, processor: F) -> ExecutionOutcome<T, R>
    where
        T: Display,
        F: Fn(&T) -> Result<R>,
    {
        let mut outcome = ExecutionOutcome::empty(1);
        outcome.results.reserve(jobs.len());

        for job in jobs {
            match processor(&job) {
                Ok(result) => outcome.results.push(result),
                Err(error) => {
                    tracing::warn!("Error processing {}: {:#}", job, error);
                    outcome.failures.push(JobFailure { job, error });
                }
            }
        }

        outcome
    }
}

/// Execution strategy enum for choosing between parallel and sequential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    pub fn execute<T, R, F>(&self, jobs: Vec<T>, processor: F) -> Result<ExecutionOutcome<T, R>>
    where
        T: Display + Send,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync,
    {
        match self {
            ExecutionStrategy::Sequential => Ok(SequentialExecutor::execute(jobs, processor)),
            ExecutionStrategy::Parallel { workers } => {
                ParallelExecutor::new(*workers).execute(jobs, processor)
            }
        }
    }

    /// Parallel once `job_count` reaches `min_jobs_for_parallel`, sequential below it
    pub fn auto(job_count: usize, min_jobs_for_parallel: usize, workers: usize) -> Self {
        if job_count >= min_jobs_for_parallel {
            ExecutionStrategy::Parallel { workers }
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Worker count from the host's cores and the configured limits
    ///
    /// A non-zero `max_threads` is taken as the exact pool size. Otherwise
    /// `thread_percentage` scales the core count (100 = one worker per core).
    /// Never returns less than 1.
    pub fn calculate_optimal_workers(max_threads: usize, thread_percentage: u8) -> usize {
        if max_threads > 0 {
            return max_threads.min(MAX_WORKERS);
        }

        let available_cores = num_cpus::get();
        std::cmp::max(1, (available_cores * thread_percentage as usize) / 100)
    }

    pub fn workers(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel { workers } => (*workers).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_sequential_executor() {
        let outcome = SequentialExecutor::execute(vec![1, 2, 3, 4, 5], |x| Ok(x * 2));
        assert_eq!(outcome.results, vec![2, 4, 6, 8, 10]);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.workers, 1);
    }

    #[test]
    fn test_parallel_executor() {
        let executor = ParallelExecutor::new(2);
        let outcome = executor.execute(vec![1, 2, 3, 4, 5], |x| Ok(x * 2)).unwrap();

        // Completion order is unspecified
        let mut results = outcome.results;
        results.sort();
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
        assert_eq!(outcome.workers, 2);
    }

    #[test]
    fn test_parallel_executor_isolates_failures() {
        let executor = ParallelExecutor::new(3);
        let outcome = executor
            .execute((1..=10).collect(), |x: &i32| {
                if x % 4 == 0 {
                    Err(anyhow::anyhow!("cannot handle {}", x))
                } else {
                    Ok(*x)
                }
            })
            .unwrap();

        let mut results = outcome.results;
        results.sort();
        assert_eq!(results, vec![1, 2, 3, 5, 6, 7, 9, 10]);

        let mut failed: Vec<i32> = outcome.failures.iter().map(|f| f.job).collect();
        failed.sort();
        assert_eq!(failed, vec![4, 8]);
        assert!(outcome.failures[0].error.to_string().starts_with("cannot handle"));
    }

    #[test]
    fn test_every_job_runs_exactly_once() {
        let calls = AtomicUsize::new(0);
        let executor = ParallelExecutor::new(8);
        let outcome = executor
            .execute((0..500).collect(), |x: &usize| {
                calls.fetch_add(1, Ordering::Relaxed);
                Ok(*x)
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 500);
        let mut results = outcome.results;
        results.sort();
        assert_eq!(results, (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn test_more_workers_than_jobs() {
        let outcome = ParallelExecutor::new(16).execute(vec![7], |x| Ok(x + 1)).unwrap();
        assert_eq!(outcome.results, vec![8]);
    }

    #[test]
    fn test_empty_work() {
        let outcome = ParallelExecutor::<u32, u32>::new(4)
            .execute(Vec::new(), |x| Ok(*x))
            .unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_zero_workers_clamped_to_one() {
        let executor = ParallelExecutor::<u8, u8>::new(0);
        assert_eq!(executor.workers(), 1);
        assert_eq!(ExecutionStrategy::Parallel { workers: 0 }.workers(), 1);
    }

    #[test]
    fn test_execution_strategy() {
        let sequential = ExecutionStrategy::Sequential;
        let seq = sequential.execute(vec![1, 2, 3], |x| Ok(x * 3)).unwrap();
        assert_eq!(seq.results, vec![3, 6, 9]);

        let parallel = ExecutionStrategy::Parallel { workers: 2 };
        let mut par = parallel.execute(vec![1, 2, 3], |x| Ok(x * 3)).unwrap().results;
        par.sort();
        assert_eq!(par, vec![3, 6, 9]);
    }

    #[test]
    fn test_auto_strategy() {
        let strategy = ExecutionStrategy::auto(1, 2, 8);
        assert_eq!(strategy, ExecutionStrategy::Sequential);

        let strategy = ExecutionStrategy::auto(50, 2, 8);
        assert_eq!(strategy, ExecutionStrategy::Parallel { workers: 8 });
    }

    #[test]
    fn test_worker_stops_when_failure_receiver_is_gone() {
        let (job_tx, job_rx) = bounded::<u32>(2);
        let (result_tx, _result_rx) = bounded::<u32>(2);
        let (failure_tx, failure_rx) = unbounded();
        drop(failure_rx);

        job_tx.send(1).unwrap();
        job_tx.send(2).unwrap();
        drop(job_tx);

        let ctx = WorkerContext {
            worker_id: 0,
            job_rx: job_rx.clone(),
            result_tx,
            failure_tx,
        };
        ParallelExecutor::<u32, u32>::worker_thread(ctx, &|_: &u32| -> Result<u32> {
            anyhow::bail!("rejected")
        });

        // The second job was never pulled
        assert_eq!(job_rx.try_recv(), Ok(2));
    }

    #[test]
    fn test_calculate_optimal_workers() {
        let all_cores = ExecutionStrategy::calculate_optimal_workers(0, 100);
        assert_eq!(all_cores, num_cpus::get().max(1));

        assert_eq!(ExecutionStrategy::calculate_optimal_workers(2, 100), 2);
        assert_eq!(ExecutionStrategy::calculate_optimal_workers(64, 10), 64);
        assert_eq!(
            ExecutionStrategy::calculate_optimal_workers(1_000_000, 100),
            MAX_WORKERS
        );
        assert_eq!(ParallelExecutor::<u32, u32>::new(1_000_000).workers(), MAX_WORKERS);
        assert!(ExecutionStrategy::calculate_optimal_workers(0, 1) >= 1);
    }
}
