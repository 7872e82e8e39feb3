//! Test and benchmark tooling shared by the sort implementations of this workspace.

use std::cmp::Ordering;

/// A sort implementation that can be run through the shared test battery.
///
/// The bounds are those of a parallel sort: elements move between threads and the comparison
/// function is called from several threads at once.
pub trait Sort {
    fn name() -> String;

    fn sort<T>(arr: &mut [T])
    where
        T: Ord + Send;

    fn sort_by<T, F>(arr: &mut [T], compare: F)
    where
        T: Send,
        F: Fn(&T, &T) -> Ordering + Sync;
}

pub mod patterns;
pub mod verify;
