use std::env;
use std::fmt::Display;
use std::panic;
use std::str::FromStr;

use log::warn;
use once_cell::sync::{Lazy, OnceCell};

/// Slices of up to this length get sorted using insertion sort.
pub const DEFAULT_SMALL_SORT_THRESHOLD: usize = 20;

/// Pivot selection samples positions around `len / 4`, it needs at least this many elements.
pub const MIN_SMALL_SORT_THRESHOLD: usize = 8;

/// If the slice being split is at most this long, both halves are sorted in the current task. The
/// number is as small as possible but so that the overhead of task scheduling stays negligible.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Limit the depth of partition-and-recurse levels to `factor * floor(log2(len))`.
pub const DEFAULT_DEPTH_LIMIT_FACTOR: u32 = 2;

const ENV_SMALL_SORT: &str = "PARSORT_SMALL_SORT";
const ENV_PARALLEL_THRESHOLD: &str = "PARSORT_PARALLEL_THRESHOLD";
const ENV_PARALLEL_BUDGET: &str = "PARSORT_PARALLEL_BUDGET";
const ENV_THREADS: &str = "PARSORT_THREADS";

/// Tunables of the sort.
///
/// None of these influence the result of a sort, only how the work is split up. The default
/// values are the conventional ones of the introsort family and should be re-measured before
/// being changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortConfig {
    small_sort_threshold: usize,
    parallel_threshold: usize,
    depth_limit_factor: u32,
    parallel_budget: Option<u32>,
    num_threads: Option<usize>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            small_sort_threshold: DEFAULT_SMALL_SORT_THRESHOLD,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            depth_limit_factor: DEFAULT_DEPTH_LIMIT_FACTOR,
            parallel_budget: None,
            num_threads: None,
        }
    }
}

impl SortConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with overrides taken from the environment.
    ///
    /// Reads `PARSORT_SMALL_SORT`, `PARSORT_PARALLEL_THRESHOLD`, `PARSORT_PARALLEL_BUDGET` and
    /// `PARSORT_THREADS`. Values that fail to parse are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(threshold) = env_override(ENV_SMALL_SORT) {
            config = config.with_small_sort_threshold(threshold);
        }
        if let Some(threshold) = env_override(ENV_PARALLEL_THRESHOLD) {
            config = config.with_parallel_threshold(threshold);
        }
        if let Some(budget) = env_override(ENV_PARALLEL_BUDGET) {
            config = config.with_parallel_budget(budget);
        }
        if let Some(threads) = env_override(ENV_THREADS) {
            config = config.with_num_threads(threads);
        }

        config
    }

    /// The configuration used by the free functions of this crate, read from the environment
    /// once per process.
    pub fn global() -> &'static SortConfig {
        static GLOBAL_CONFIG: Lazy<SortConfig> = Lazy::new(SortConfig::from_env);

        &GLOBAL_CONFIG
    }

    /// Values below [`MIN_SMALL_SORT_THRESHOLD`] are raised to it.
    pub fn with_small_sort_threshold(mut self, threshold: usize) -> Self {
        self.small_sort_threshold = threshold.max(MIN_SMALL_SORT_THRESHOLD);
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// A factor of zero switches every slice above the small-sort threshold straight to heapsort.
    pub fn with_depth_limit_factor(mut self, factor: u32) -> Self {
        self.depth_limit_factor = factor;
        self
    }

    /// Fixes the number of recursion levels that may fork, instead of deriving it from the
    /// number of threads. A budget of zero sorts sequentially.
    pub fn with_parallel_budget(mut self, budget: u32) -> Self {
        self.parallel_budget = Some(budget);
        self
    }

    /// Runs the sort on a dedicated pool of `threads` threads instead of the global rayon pool.
    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    pub fn small_sort_threshold(&self) -> usize {
        self.small_sort_threshold
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub fn depth_limit_factor(&self) -> u32 {
        self.depth_limit_factor
    }

    pub fn parallel_budget(&self) -> Option<u32> {
        self.parallel_budget
    }

    pub fn num_threads(&self) -> Option<usize> {
        self.num_threads
    }

    /// Number of partition-and-recurse levels allowed before falling back to heapsort.
    ///
    /// The binary OR by one is used to eliminate the zero-check in the logarithm. Saturates for
    /// huge factors.
    pub fn depth_limit(&self, len: usize) -> u32 {
        self.depth_limit_factor.saturating_mul((len | 1).ilog2())
    }
}

/// Number of threads of the rayon pool that runs a sort started on the calling thread.
///
/// On a worker thread, which includes the inside of `ThreadPool::install`, that is the worker's
/// own pool, otherwise the global pool. Returns `None` if the global pool would be used but can't
/// be built.
pub fn current_pool_threads() -> Option<usize> {
    if rayon::current_thread_index().is_none() && !global_pool_available() {
        return None;
    }

    Some(rayon::current_num_threads().max(1))
}

/// Rayon builds the global pool on first use and panics if that fails. The outcome is checked
/// once per process, from outside any pool.
fn global_pool_available() -> bool {
    static GLOBAL_POOL_AVAILABLE: OnceCell<bool> = OnceCell::new();

    *GLOBAL_POOL_AVAILABLE.get_or_init(|| match panic::catch_unwind(rayon::current_num_threads) {
        Ok(_) => true,
        Err(_) => {
            warn!("Failed to build the global rayon pool, sorting sequentially");
            false
        }
    })
}

/// `floor(log2(threads))`, so that at most `2^budget` tasks, roughly one per thread, are live.
pub fn parallel_budget_for(threads: usize) -> u32 {
    threads.max(1).ilog2()
}

fn env_override<V>(name: &str) -> Option<V>
where
    V: FromStr,
    V::Err: Display,
{
    let raw = env::var(name).ok()?;

    match raw.trim().parse() {
        Ok(val) => Some(val),
        Err(err) => {
            warn!("Ignoring {name}={raw:?}: {err}");
            None
        }
    }
}
