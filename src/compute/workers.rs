//! Bounded worker pool with a fan-out/fan-in join barrier.

use std::sync::mpsc;

/// Fixed-size rayon pool used for every parallel phase of a generation.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Create a pool with `threads` workers, or one per core when `None`.
    pub fn new(threads: Option<usize>) -> Result<Self, WorkerPoolError> {
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("evolve-{i}"));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        Ok(Self {
            pool: builder.build()?,
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `job` once per input on the pool and block until every result is in.
    ///
    /// Each task sends exactly one result tagged with its input slot, so
    /// completion order does not matter; the output is in input order. A
    /// panicking task is re-raised here once the others have finished.
    pub fn scatter_gather<T, R, F>(&self, inputs: Vec<T>, job: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let expected = inputs.len();
        let (tx, rx) = mpsc::channel();
        let job = &job;

        self.pool.scope(|scope| {
            for (slot, input) in inputs.into_iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // rx outlives the scope, so the send cannot fail
                    let _ = tx.send((slot, job(input)));
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<R>> = (0..expected).map(|_| None).collect();
        for (slot, result) in rx {
            slots[slot] = Some(result);
        }

        let results: Vec<R> = slots.into_iter().flatten().collect();
        debug_assert_eq!(results.len(), expected);
        results
    }
}

/// Worker pool construction errors.
#[derive(Debug, thiserror::Error)]
#[error("Failed to build worker pool: {0}")]
pub struct WorkerPoolError(#[from] rayon::ThreadPoolBuildError);
