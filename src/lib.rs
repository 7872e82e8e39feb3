//! Parallel unstable sorting of slices.
//!
//! The sort is a depth-bounded hybrid quicksort. Sub-slices at or below a small cutoff are
//! insertion sorted, every other sub-slice is partitioned around a median-of-three pivot and
//! both halves are sorted recursively. A branch that partitions more than `2 * log2(len)` levels
//! deep is heapsorted, which bounds the worst case to *O*(*n* \* log(*n*)) for any input order.
//!
//! The two halves of a partition step are disjoint mutable sub-slices, so they can be sorted in
//! parallel without any synchronization on the data. Halves are handed to `rayon::join` only for
//! the first `floor(log2(threads))` levels of the recursion, which keeps the number of live tasks
//! close to the number of threads no matter how deep the recursion gets. `threads` is the size of
//! the pool the sort runs on: the pool of the calling thread inside `ThreadPool::install`, the
//! global rayon pool otherwise, or the dedicated pool of a [`Sorter`] configured with
//! [`SortConfig::with_num_threads`]. If that pool can't be built a warning is logged and the sort
//! runs sequentially on the calling thread.
//!
//! The comparator must implement a strict weak ordering and is invoked concurrently from multiple
//! threads, hence the `Sync` bound. If it does not implement a strict weak ordering, or panics,
//! the resulting order is unspecified but the slice still holds exactly its original elements.

mod config;
mod error;
mod fork_join;
mod heapsort;
mod partition;
mod quicksort;
mod smallsort;
mod sorter;
mod stats;

use std::cmp::Ordering;
use std::error::Error;
use std::ops::Range;

use once_cell::sync::Lazy;

pub use config::{
    current_pool_threads, parallel_budget_for, SortConfig, DEFAULT_DEPTH_LIMIT_FACTOR,
    DEFAULT_PARALLEL_THRESHOLD, DEFAULT_SMALL_SORT_THRESHOLD, MIN_SMALL_SORT_THRESHOLD,
};
pub use error::SortError;
pub use sorter::Sorter;
pub use stats::{SortStats, StatsSnapshot};

/// Sorter used by the free functions, configured by [`SortConfig::global`].
///
/// Its own statistics are never written, every free function call records into a fresh or a
/// caller provided [`SortStats`].
fn default_sorter() -> &'static Sorter {
    static DEFAULT_SORTER: Lazy<Sorter> =
        Lazy::new(|| Sorter::new(SortConfig::global().clone()));

    &DEFAULT_SORTER
}

/// Sorts the slice in parallel according to the strict weak ordering `is_less`, but might not
/// preserve the order of equal elements.
///
/// Blocks until the slice is sorted. Afterwards, for every adjacent pair `(a, b)`, `is_less(b, a)`
/// is false.
#[inline]
pub fn parallel_sort<T, F>(v: &mut [T], is_less: F)
where
    T: Send,
    F: Fn(&T, &T) -> bool + Sync,
{
    parallel_sort_with_stats(v, is_less, &SortStats::new());
}

/// Like [`parallel_sort`], recording the recursion depth and other diagnostics into `stats`.
pub fn parallel_sort_with_stats<T, F>(v: &mut [T], is_less: F, stats: &SortStats)
where
    T: Send,
    F: Fn(&T, &T) -> bool + Sync,
{
    default_sorter().sort_with_stats(v, is_less, stats);
}

/// Sorts `v[range]` in parallel.
///
/// Returns [`SortError::InvalidRange`] if the range starts after it ends and
/// [`SortError::OutOfBounds`] if it ends past `v.len()`, in both cases without touching `v`.
pub fn parallel_sort_range<T, F>(
    v: &mut [T],
    range: Range<usize>,
    is_less: F,
) -> Result<(), SortError>
where
    T: Send,
    F: Fn(&T, &T) -> bool + Sync,
{
    default_sorter().sort_range(v, range, is_less)
}

/// Sorts the slice in parallel with a comparator that can fail.
///
/// On the first comparator error the sort winds down, waits for all tasks, and returns the error
/// as [`SortError::Comparator`]. The slice then holds its original elements in unspecified order.
pub fn try_parallel_sort<T, F, E>(v: &mut [T], is_less: F) -> Result<(), SortError>
where
    T: Send,
    F: Fn(&T, &T) -> Result<bool, E> + Sync,
    E: Error + Send + Sync + 'static,
{
    default_sorter().try_sort(v, is_less)
}

/// Sorts the slice in parallel, but might not preserve the order of equal elements.
///
/// This sort is unstable (i.e., may reorder equal elements), in-place
/// (i.e., does not allocate), and *O*(*n* \* log(*n*)) worst-case.
#[inline]
pub fn par_sort<T>(v: &mut [T])
where
    T: Ord + Send,
{
    parallel_sort(v, |a, b| a.lt(b));
}

/// Sorts the slice in parallel with a comparator function, but might not preserve the order of
/// equal elements.
///
/// The comparator function must define a total ordering for the elements in the slice. If
/// the ordering is not total, the order of the elements is unspecified.
#[inline]
pub fn par_sort_by<T, F>(v: &mut [T], compare: F)
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    parallel_sort(v, |a, b| compare(a, b) == Ordering::Less);
}

/// Sorts the slice in parallel with a key extraction function, but might not preserve the order
/// of equal elements.
///
/// The key function is called twice per comparison.
#[inline]
pub fn par_sort_by_key<T, K, F>(v: &mut [T], f: F)
where
    T: Send,
    K: Ord,
    F: Fn(&T) -> K + Sync,
{
    parallel_sort(v, |a, b| f(a).lt(&f(b)));
}
