use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Observational statistics of one or more sort invocations.
///
/// Owned by the caller and shared by reference with every task of a sort. All updates are single
/// atomic read-modify-write operations, no lock sits on the sorting path. Values only ever
/// increase until [`SortStats::reset`] is called explicitly. Nothing here influences the sort.
#[derive(Debug, Default)]
pub struct SortStats {
    max_depth: AtomicU32,
    forks: AtomicUsize,
    fallbacks: AtomicUsize,
}

/// Point-in-time copy of [`SortStats`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Deepest recursion level any sort invocation reached.
    pub max_depth: u32,
    /// Number of partition steps that sorted their halves in parallel.
    pub forks: usize,
    /// Number of sub-slices that exhausted the depth budget and were heapsorted.
    pub fallbacks: usize,
}

impl SortStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the maximum depth to `depth` if it is larger than the current value.
    #[inline]
    pub fn record_depth(&self, depth: u32) {
        self.max_depth.fetch_max(depth, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fork(&self) {
        self.forks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth.load(Ordering::Relaxed)
    }

    pub fn forks(&self) -> usize {
        self.forks.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            max_depth: self.max_depth(),
            forks: self.forks(),
            fallbacks: self.fallbacks(),
        }
    }

    pub fn reset(&self) {
        self.max_depth.store(0, Ordering::Relaxed);
        self.forks.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
    }
}
