use std::cmp::Ordering;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{self, AtomicBool, AtomicUsize};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use rand::prelude::*;

use parsort::{SortConfig, SortError, SortStats, Sorter};
use sort_test_tools::{instantiate_sort_tests, patterns, verify, Sort};

struct SortImpl {}

impl Sort for SortImpl {
    fn name() -> String {
        "parsort_parallel_unstable".into()
    }

    fn sort<T>(arr: &mut [T])
    where
        T: Ord + Send,
    {
        parsort::par_sort(arr);
    }

    fn sort_by<T, F>(arr: &mut [T], compare: F)
    where
        T: Send,
        F: Fn(&T, &T) -> Ordering + Sync,
    {
        parsort::par_sort_by(arr, compare);
    }
}

instantiate_sort_tests!(SortImpl);

// Forks as early and as often as possible, so that even the small inputs of the shared tests run
// through `rayon::join`.
mod eager_fork {
    use super::*;

    static EAGER_SORTER: Lazy<Sorter> = Lazy::new(|| {
        Sorter::new(
            SortConfig::new()
                .with_num_threads(4)
                .with_parallel_budget(6)
                .with_parallel_threshold(0)
                .with_small_sort_threshold(8),
        )
    });

    pub struct EagerForkSortImpl {}

    impl Sort for EagerForkSortImpl {
        fn name() -> String {
            "parsort_eager_fork_unstable".into()
        }

        fn sort<T>(arr: &mut [T])
        where
            T: Ord + Send,
        {
            EAGER_SORTER.sort(arr, |a, b| a.lt(b));
        }

        fn sort_by<T, F>(arr: &mut [T], compare: F)
        where
            T: Send,
            F: Fn(&T, &T) -> Ordering + Sync,
        {
            EAGER_SORTER.sort_by(arr, compare);
        }
    }

    instantiate_sort_tests!(EagerForkSortImpl);
}

// A parallel budget of zero must give a plain sequential hybrid sort.
mod sequential {
    use super::*;

    static SEQUENTIAL_SORTER: Lazy<Sorter> =
        Lazy::new(|| Sorter::new(SortConfig::new().with_parallel_budget(0)));

    pub struct SequentialSortImpl {}

    impl Sort for SequentialSortImpl {
        fn name() -> String {
            "parsort_sequential_unstable".into()
        }

        fn sort<T>(arr: &mut [T])
        where
            T: Ord + Send,
        {
            SEQUENTIAL_SORTER.sort(arr, |a, b| a.lt(b));
        }

        fn sort_by<T, F>(arr: &mut [T], compare: F)
        where
            T: Send,
            F: Fn(&T, &T) -> Ordering + Sync,
        {
            SEQUENTIAL_SORTER.sort_by(arr, compare);
        }
    }

    instantiate_sort_tests!(SequentialSortImpl);
}

fn lt<T: Ord>(a: &T, b: &T) -> bool {
    a.lt(b)
}

#[test]
fn empty_leaves_stats_untouched() {
    let stats = SortStats::new();
    let mut v: Vec<u64> = Vec::new();
    parsort::parallel_sort_with_stats(&mut v, lt, &stats);

    assert!(v.is_empty());
    assert_eq!(stats.snapshot(), Default::default());
}

#[test]
fn single_element_does_not_recurse() {
    let stats = SortStats::new();
    let mut v = vec![42i64];
    parsort::parallel_sort_with_stats(&mut v, lt, &stats);

    assert_eq!(v, [42]);
    assert_eq!(stats.max_depth(), 0);
    assert_eq!(stats.forks(), 0);
}

#[test]
fn ascending_stays_unchanged() {
    let expected = (1..=10_000).collect::<Vec<i64>>();
    let mut v = expected.clone();
    parsort::parallel_sort(&mut v, lt);

    assert_eq!(v, expected);
}

#[test]
fn descending_becomes_ascending() {
    let mut v = (1..=10_000).rev().collect::<Vec<i64>>();
    parsort::parallel_sort(&mut v, lt);

    assert_eq!(v, (1..=10_000).collect::<Vec<i64>>());
}

#[test]
fn all_equal_terminates_quickly() {
    let stats = SortStats::new();
    let mut v = vec![7i64; 2_000_000];

    let start = Instant::now();
    parsort::parallel_sort_with_stats(&mut v, lt, &stats);
    let elapsed = start.elapsed();

    assert!(v.iter().all(|x| *x == 7));
    assert_eq!(v.len(), 2_000_000);
    // Each level removes every element equal to the pivot, there is nothing left to recurse on.
    assert!(stats.max_depth() <= 2, "max depth: {}", stats.max_depth());
    assert_eq!(stats.fallbacks(), 0);
    assert!(elapsed < Duration::from_secs(10), "took {elapsed:?}");
}

#[test]
fn equal_runs_terminate_for_every_len() {
    for len in 0..200 {
        let mut v = vec![1u8; len];
        parsort::parallel_sort(&mut v, lt);
        assert_eq!(v, vec![1u8; len]);
    }
}

#[test]
fn large_random_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(patterns::random_init_seed());
    let mut v = (0..10_000_000).map(|_| rng.gen::<i64>()).collect::<Vec<_>>();

    let mut expected = v.clone();
    expected.sort_unstable();

    let stats = SortStats::new();
    parsort::parallel_sort_with_stats(&mut v, lt, &stats);

    assert_eq!(verify::first_unsorted_position(&v, lt), None);
    assert_eq!(v, expected);
}

#[test]
fn depth_stays_within_bound() {
    let sorter = Sorter::new(SortConfig::new().with_parallel_budget(3).with_parallel_threshold(512));

    for shape in patterns::Shape::ALL {
        for len in [0, 1, 100, 5_000, 200_000] {
            sorter.stats().reset();

            let mut v = shape.generate(len);
            sorter.sort(&mut v, lt);

            assert!(verify::is_sorted(&v), "{}", shape.name());
            assert!(
                sorter.stats().max_depth() <= sorter.depth_bound(len),
                "{} {len}: {} > {}",
                shape.name(),
                sorter.stats().max_depth(),
                sorter.depth_bound(len)
            );
            assert!(sorter.stats().forks() < (1 << 3));
        }
    }
}

#[test]
fn free_functions_use_the_calling_pool() {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(2)
        .build()
        .unwrap();

    let mut v = patterns::random_i64(100_000);
    let mut expected = v.clone();
    expected.sort_unstable();

    // A two thread pool allows a single fork.
    let stats = SortStats::new();
    pool.install(|| parsort::parallel_sort_with_stats(&mut v, lt, &stats));
    assert_eq!(v, expected);
    assert!(stats.forks() <= 1, "forks: {}", stats.forks());

    let outside_budget = parsort::parallel_budget_for(rayon::current_num_threads());
    assert_eq!(
        parsort::current_pool_threads(),
        Some(rayon::current_num_threads())
    );

    let mut v = patterns::random_i64(100_000);
    let stats = SortStats::new();
    parsort::parallel_sort_with_stats(&mut v, lt, &stats);
    assert!(verify::is_sorted(&v));
    assert!(stats.forks() < (1 << outside_budget), "forks: {}", stats.forks());
}

#[test]
fn low_depth_factor_still_sorts() {
    let sorter = Sorter::new(SortConfig::new().with_depth_limit_factor(1).with_parallel_budget(2));

    let len = 100_000;
    // Two interleaved ascending runs.
    let mut v = (0..len).map(|i| (i % 2) as u64 * len as u64 + i as u64).collect::<Vec<_>>();
    let mut expected = v.clone();
    expected.sort_unstable();

    sorter.sort(&mut v, lt);
    assert_eq!(v, expected);
    assert!(sorter.stats().max_depth() <= sorter.depth_bound(len));
}

#[test]
fn zero_depth_factor_heapsorts_everything() {
    let sorter = Sorter::new(SortConfig::new().with_depth_limit_factor(0));

    for shape in patterns::Shape::ALL {
        sorter.stats().reset();

        let mut v = shape.generate(50_000);
        let mut expected = v.clone();
        expected.sort_unstable();

        sorter.sort(&mut v, lt);
        assert_eq!(v, expected, "{}", shape.name());
        assert_eq!(sorter.stats().fallbacks(), 1);
        assert_eq!(sorter.stats().forks(), 0);
    }
}

#[test]
fn sort_range_sorts_only_the_range() {
    let mut v = vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0];
    parsort::parallel_sort_range(&mut v, 2..8, lt).unwrap();
    assert_eq!(v, [9, 8, 2, 3, 4, 5, 6, 7, 1, 0]);

    parsort::parallel_sort_range(&mut v, 4..4, lt).unwrap();
    parsort::parallel_sort_range(&mut v, 0..10, lt).unwrap();
    assert_eq!(v, (0..10).collect::<Vec<_>>());
}

#[test]
fn sort_range_rejects_malformed_ranges() {
    let original = vec![3, 1, 2];
    let mut v = original.clone();

    #[allow(clippy::reversed_empty_ranges)]
    let err = parsort::parallel_sort_range(&mut v, 2..1, lt).unwrap_err();
    assert!(matches!(err, SortError::InvalidRange { start: 2, end: 1 }));
    assert_eq!(err.to_string(), "invalid range: start 2 is past end 1");

    let err = parsort::parallel_sort_range(&mut v, 1..4, lt).unwrap_err();
    assert!(matches!(err, SortError::OutOfBounds { end: 4, len: 3 }));

    assert_eq!(v, original);
}

#[derive(Debug)]
struct Incomparable(i64);

impl fmt::Display for Incomparable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is incomparable", self.0)
    }
}

impl std::error::Error for Incomparable {}

#[test]
fn try_sort_without_fault() {
    let mut v = patterns::random_i64(50_000);
    let mut expected = v.clone();
    expected.sort_unstable();

    parsort::try_parallel_sort(&mut v, |a, b| Ok::<_, Incomparable>(a < b)).unwrap();
    assert_eq!(v, expected);
}

#[test]
fn try_sort_reports_comparator_fault() {
    let mut v = (0..100_000).rev().collect::<Vec<i64>>();
    let calls = AtomicUsize::new(0);

    let res = parsort::try_parallel_sort(&mut v, |a, b| {
        calls.fetch_add(1, atomic::Ordering::Relaxed);
        if *a == 31_337 || *b == 31_337 {
            Err(Incomparable(31_337))
        } else {
            Ok(a < b)
        }
    });

    let err = res.unwrap_err();
    assert!(matches!(err, SortError::Comparator(_)));
    assert_eq!(err.to_string(), "comparator failed: 31337 is incomparable");
    assert!(std::error::Error::source(&err).is_some());

    // Order is unspecified, but no element may be lost or duplicated.
    v.sort_unstable();
    assert_eq!(v, (0..100_000).collect::<Vec<i64>>());
    assert!(calls.load(atomic::Ordering::Relaxed) > 0);
}

#[test]
fn comparator_panic_propagates_after_join() {
    let sorter = Sorter::new(
        SortConfig::new()
            .with_num_threads(4)
            .with_parallel_budget(2)
            .with_parallel_threshold(1_000),
    );

    let mut v = patterns::random_i64(200_000);
    let mut expected = v.clone();
    expected.sort_unstable();
    let panicked = AtomicBool::new(false);

    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        sorter.sort(&mut v, |a, b| {
            if *a == expected[expected.len() / 3] && !panicked.swap(true, atomic::Ordering::SeqCst)
            {
                panic!("comparator fault");
            }
            a < b
        });
    }));

    assert!(res.is_err());
    assert!(panicked.load(atomic::Ordering::SeqCst));

    v.sort_unstable();
    assert_eq!(v, expected);
}

#[test]
fn sort_by_key_and_reverse() {
    let mut v = (0..20_000).map(|i| (i * 37) % 20_000).collect::<Vec<u32>>();

    parsort::par_sort_by_key(&mut v, |x| std::cmp::Reverse(*x));
    assert_eq!(v, (0..20_000).rev().collect::<Vec<u32>>());

    parsort::par_sort_by(&mut v, |a, b| a.cmp(b));
    assert_eq!(v, (0..20_000).collect::<Vec<u32>>());
}

#[test]
fn floats_with_partial_cmp() {
    let mut v = patterns::random(10_000)
        .into_iter()
        .map(|x| x as f64 / 7.0)
        .collect::<Vec<f64>>();

    parsort::parallel_sort(&mut v, |a, b| a < b);
    assert_eq!(verify::first_unsorted_position(&v, |a, b| a < b), None);
}

#[test]
fn non_sync_elements() {
    // `Cell` is `Send` but not `Sync`, the sort must not require more than `Send`.
    let mut v = (0..10_000)
        .rev()
        .map(std::cell::Cell::new)
        .collect::<Vec<_>>();

    parsort::parallel_sort(&mut v, |a, b| a.get() < b.get());
    assert!(v.iter().map(|c| c.get()).eq(0..10_000));
}
