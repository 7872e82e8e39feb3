use std::cmp::Ordering;
use std::error::Error;
use std::ops::Range;

use log::{debug, trace, warn};
use once_cell::sync::OnceCell;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{current_pool_threads, parallel_budget_for, SortConfig};
use crate::error::SortError;
use crate::quicksort::{self, SortParams};
use crate::stats::SortStats;

/// A configured parallel sort.
///
/// Holds the configuration, the pool sorts run on and the statistics of every sort run through
/// [`Sorter::sort`] and friends. Cheap to share, all methods take `&self`.
#[derive(Debug)]
pub struct Sorter {
    config: SortConfig,
    executor: Executor,
    stats: SortStats,
}

/// Where the forked halves of a sort run.
#[derive(Debug)]
enum Executor {
    /// The pool of the calling thread, the global pool outside of any pool.
    Current,
    Dedicated(ThreadPool),
    /// The requested dedicated pool could not be built.
    Sequential,
}

impl Default for Sorter {
    fn default() -> Self {
        Self::new(SortConfig::default())
    }
}

impl Sorter {
    /// Builds a sorter. If the configuration asks for a dedicated thread pool and the pool can't
    /// be built, the sorter still works but runs every sort sequentially.
    pub fn new(config: SortConfig) -> Self {
        let executor = match config.num_threads() {
            None => Executor::Current,
            Some(num_threads) => match ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .thread_name(|i| format!("parsort-{i}"))
                .build()
            {
                Ok(pool) => Executor::Dedicated(pool),
                Err(err) => {
                    warn!(
                        "Failed to build a pool with {num_threads} threads, sorting sequentially: \
                         {err}"
                    );
                    Executor::Sequential
                }
            },
        };

        debug!("New sorter: {config:?}, executor: {executor:?}");

        Self {
            config,
            executor,
            stats: SortStats::new(),
        }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Number of recursion levels that may fork, at the root of a sort started on the calling
    /// thread.
    ///
    /// Unless fixed by the configuration this is `floor(log2(threads))` of the pool the sort runs
    /// on, so it can differ between calls made inside and outside of a `ThreadPool::install`. It
    /// is 0 if no pool is available.
    pub fn parallel_budget(&self) -> u32 {
        let threads = match &self.executor {
            Executor::Sequential => return 0,
            Executor::Dedicated(pool) => pool.current_num_threads(),
            Executor::Current => match current_pool_threads() {
                Some(threads) => threads,
                None => return 0,
            },
        };

        self.config
            .parallel_budget()
            .unwrap_or_else(|| parallel_budget_for(threads))
    }

    /// Accumulated statistics of every sort run on this sorter.
    pub fn stats(&self) -> &SortStats {
        &self.stats
    }

    /// Upper bound of the recursion depth a sort of `len` elements started on the calling thread
    /// can reach.
    pub fn depth_bound(&self, len: usize) -> u32 {
        self.config
            .depth_limit(len)
            .saturating_add(self.parallel_budget())
    }

    /// Sorts `v` in parallel according to the strict weak ordering `is_less`.
    ///
    /// Returns once the whole slice is sorted and every forked task has joined. The order of
    /// equal elements is unspecified. If `is_less` panics, the panic is propagated after all
    /// forked work finished, `v` then holds its original elements in unspecified order.
    pub fn sort<T, F>(&self, v: &mut [T], is_less: F)
    where
        T: Send,
        F: Fn(&T, &T) -> bool + Sync,
    {
        self.sort_with_stats(v, is_less, &self.stats);
    }

    /// Like [`Sorter::sort`], but records into `stats` instead of the sorter's own statistics.
    pub fn sort_with_stats<T, F>(&self, v: &mut [T], is_less: F, stats: &SortStats)
    where
        T: Send,
        F: Fn(&T, &T) -> bool + Sync,
    {
        let len = v.len();
        let depth_limit = self.config.depth_limit(len);
        let params = SortParams {
            small_sort_threshold: self.config.small_sort_threshold(),
            parallel_threshold: self.config.parallel_threshold(),
            stats,
        };

        let parallel_budget = self.parallel_budget();

        debug!(
            "Sorting {len} elements, depth limit {depth_limit}, parallel budget {parallel_budget}"
        );

        match &self.executor {
            Executor::Dedicated(pool) => pool.install(|| {
                quicksort::sort(v, &is_less, &params, depth_limit, parallel_budget)
            }),
            Executor::Current | Executor::Sequential => {
                quicksort::sort(v, &is_less, &params, depth_limit, parallel_budget)
            }
        }

        trace!("Sorted {len} elements: {:?}", stats.snapshot());
    }

    /// Sorts `v` with a comparator function.
    pub fn sort_by<T, F>(&self, v: &mut [T], compare: F)
    where
        T: Send,
        F: Fn(&T, &T) -> Ordering + Sync,
    {
        self.sort(v, |a, b| compare(a, b) == Ordering::Less);
    }

    /// Sorts the sub-slice `v[range]`, leaving the rest of `v` untouched.
    ///
    /// Malformed ranges are rejected before any element is touched.
    pub fn sort_range<T, F>(
        &self,
        v: &mut [T],
        range: Range<usize>,
        is_less: F,
    ) -> Result<(), SortError>
    where
        T: Send,
        F: Fn(&T, &T) -> bool + Sync,
    {
        let Range { start, end } = range;

        if start > end {
            return Err(SortError::InvalidRange { start, end });
        }
        if end > v.len() {
            return Err(SortError::OutOfBounds { end, len: v.len() });
        }

        self.sort(&mut v[start..end], is_less);
        Ok(())
    }

    /// Sorts `v` with a comparator that can fail.
    ///
    /// The first error is kept, all later comparisons evaluate to "not less" so the remaining
    /// work finishes quickly. Every task still runs to completion before the error is returned.
    pub fn try_sort<T, F, E>(&self, v: &mut [T], is_less: F) -> Result<(), SortError>
    where
        T: Send,
        F: Fn(&T, &T) -> Result<bool, E> + Sync,
        E: Error + Send + Sync + 'static,
    {
        let fault: OnceCell<E> = OnceCell::new();

        self.sort(v, |a, b| {
            if fault.get().is_some() {
                return false;
            }

            match is_less(a, b) {
                Ok(is_lt) => is_lt,
                Err(err) => {
                    // Only the first error is kept, concurrent ones are dropped.
                    let _ = fault.set(err);
                    false
                }
            }
        });

        match fault.into_inner() {
            Some(err) => Err(SortError::Comparator(Box::new(err))),
            None => Ok(()),
        }
    }
}
