use core::mem;

use crate::fork_join;
use crate::heapsort::heapsort;
use crate::partition::{choose_pivot, partition, partition_equal};
use crate::smallsort::insertion_sort;
use crate::stats::SortStats;

/// Per call tree state, copied into every recursive call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecursionContext {
    /// Number of partition steps between the root and the current sub-slice.
    pub depth: u32,
    /// Depth at which the current sub-slice is handed to heapsort instead of being partitioned.
    /// Fixed for the whole call tree.
    pub depth_limit: u32,
    /// Remaining number of recursion levels that may fork.
    pub parallel_budget: u32,
}

impl RecursionContext {
    pub(crate) fn root(depth_limit: u32, parallel_budget: u32) -> Self {
        Self {
            depth: 0,
            depth_limit,
            parallel_budget,
        }
    }

    #[must_use]
    fn descend(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    #[must_use]
    pub(crate) fn spend_parallel_budget(self) -> Self {
        Self {
            parallel_budget: self.parallel_budget.saturating_sub(1),
            ..self
        }
    }
}

/// Thresholds and statistics shared read-only by every task of one sort.
pub(crate) struct SortParams<'s> {
    pub small_sort_threshold: usize,
    pub parallel_threshold: usize,
    pub stats: &'s SortStats,
}

/// Sorts `v` with the hybrid quicksort, forking at most `parallel_budget` levels deep.
///
/// `depth_limit` is the number of partition levels allowed before switching to `heapsort`,
/// computed by the caller from the length of the whole input.
pub(crate) fn sort<T, F>(
    v: &mut [T],
    is_less: &F,
    params: &SortParams<'_>,
    depth_limit: u32,
    parallel_budget: u32,
) where
    T: Send,
    F: Fn(&T, &T) -> bool + Sync,
{
    // Sorting has no meaningful behavior on zero-sized types.
    if mem::size_of::<T>() == 0 {
        return;
    }

    if v.len() < 2 {
        return;
    }

    let ctx = RecursionContext::root(depth_limit, parallel_budget);
    recurse(v, is_less, None, ctx, params);
}

/// Sorts `v` recursively.
///
/// If the slice had a predecessor in the original array, it is specified as `ancestor_pivot`. It
/// is passed as a mutable reference, which keeps the closures handed to the scheduler `Send`
/// without requiring `T: Sync`.
fn recurse<'a, T, F>(
    mut v: &'a mut [T],
    is_less: &F,
    mut ancestor_pivot: Option<&'a mut T>,
    mut ctx: RecursionContext,
    params: &SortParams<'_>,
) where
    T: Send,
    F: Fn(&T, &T) -> bool + Sync,
{
    loop {
        params.stats.record_depth(ctx.depth);

        if v.len() <= params.small_sort_threshold {
            insertion_sort(v, is_less);
            return;
        }

        // If the depth budget is exhausted, simply fall back to heapsort in order to guarantee
        // `O(n * log(n))` worst-case.
        if ctx.depth >= ctx.depth_limit {
            params.stats.record_fallback();
            heapsort(v, is_less);
            return;
        }

        let pivot_pos = choose_pivot(v, is_less);

        // If the chosen pivot is equal to the predecessor, then it's the smallest element in the
        // slice. Partition the slice into elements equal to and elements greater than the pivot.
        // This case is usually hit when the slice contains many duplicate elements.
        if let Some(p) = ancestor_pivot.as_deref() {
            if !is_less(p, &v[pivot_pos]) {
                let mid = partition_equal(v, pivot_pos, is_less);

                // Continue sorting elements greater than the pivot. We know that mid contains the
                // pivot. So we can continue after mid.
                v = &mut v[(mid + 1)..];
                ancestor_pivot = None;
                ctx = ctx.descend();
                continue;
            }
        }

        let len = v.len();
        let mid = partition(v, pivot_pos, is_less);

        // Split the slice into `left`, `pivot`, and `right`. From here on the type system
        // guarantees that the two halves are disjoint.
        let (left, right) = v.split_at_mut(mid);
        let (pivot, right) = right.split_at_mut(1);
        let pivot = &mut pivot[0];

        fork_join::fork(
            ctx.descend(),
            len,
            params.parallel_threshold,
            params.stats,
            move |ctx| recurse(left, is_less, ancestor_pivot, ctx, params),
            move |ctx| recurse(right, is_less, Some(pivot), ctx, params),
        );
        return;
    }
}
