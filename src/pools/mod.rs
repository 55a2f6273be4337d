use std::any::Any;
use std::thread;

use once_cell::sync::Lazy;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Oversubscription beyond the processor count has no measurable benefit;
/// past this many workers the partitioner stops splitting anyway.
pub(crate) const MAX_THREADS: usize = 64;

static DEFAULT_POOL: Lazy<ResamplePool> = Lazy::new(|| {
    debug!("Initializing default resampling pool");
    ResamplePool::new(0)
});

fn handle_panic(e: Box<dyn Any + Send>) {
    error!("Unexpected panic in thread {}: {e:?}", thread::current().name().unwrap_or("unnamed"));
}

/// A persistent set of resampling workers.
///
/// Workers are spawned once and sleep between jobs, so a pool can be reused
/// across the frames of a zoom-pan animation without respawn cost. The
/// process-wide default pool (used when no explicit pool is passed) is built
/// lazily on first use and is not reentrant: a resampling job must not itself
/// call [`zoom_resample_parallel`](crate::zoom_resample_parallel) against the
/// default pool. Callers running concurrent resamples should create one pool
/// each.
pub struct ResamplePool {
    pool: ThreadPool,
}

impl std::fmt::Debug for ResamplePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[ResamplePool {} threads]", self.threads())
    }
}

impl Default for ResamplePool {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ResamplePool {
    /// Builds a pool of `min(max_threads, 64)` workers; 0 means one per
    /// processor.
    pub fn new(max_threads: usize) -> Self {
        let threads =
            if max_threads == 0 { num_cpus::get() } else { max_threads }.clamp(1, MAX_THREADS);

        let pool = ThreadPoolBuilder::new()
            .thread_name(|u| format!("resample-{u}"))
            .panic_handler(handle_panic)
            .num_threads(threads)
            .build()
            .expect("Error creating resampling threadpool");

        Self { pool }
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Shuts the pool down, joining all workers. Dropping the pool does the
    /// same; this only exists to make the teardown point explicit.
    pub fn finalize(self) {}

    pub(crate) fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }
}

pub(crate) fn default_pool() -> &'static ResamplePool {
    &DEFAULT_POOL
}
