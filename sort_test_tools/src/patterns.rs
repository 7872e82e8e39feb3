use std::env;
use std::str::FromStr;
use std::sync::Mutex;

use rand::prelude::*;

use zipf::ZipfDistribution;

/// Provides a set of input patterns useful for testing and benchmarking sorting algorithms,
/// including the pivot-adversarial ones.

// --- Public ---

/// The input shapes of a stress run. Each one stresses a different part of a quicksort: pivot
/// selection, the depth limit or duplicate handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Random,
    Ascending,
    Descending,
    ManyDuplicates,
    NearlySorted,
}

impl Shape {
    pub const ALL: [Shape; 5] = [
        Shape::Random,
        Shape::Ascending,
        Shape::Descending,
        Shape::ManyDuplicates,
        Shape::NearlySorted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Shape::Random => "random",
            Shape::Ascending => "ascending",
            Shape::Descending => "descending",
            Shape::ManyDuplicates => "many_duplicates",
            Shape::NearlySorted => "nearly_sorted",
        }
    }

    /// Generates `len` 64-bit values of this shape.
    pub fn generate(self, len: usize) -> Vec<i64> {
        match self {
            Shape::Random => random_i64(len),
            Shape::Ascending => (0..len as i64).collect(),
            Shape::Descending => (0..len as i64).rev().collect(),
            Shape::ManyDuplicates => {
                let distinct = ((len as f64).sqrt() as i64).max(1);
                random_i64(len).into_iter().map(|x| x.rem_euclid(distinct)).collect()
            }
            Shape::NearlySorted => {
                let mut v = (0..len as i64).collect::<Vec<_>>();
                let swaps = random_uniform((len / 100) * 2, 0..(len.max(1) as i32));
                for pair in swaps.chunks_exact(2) {
                    v.swap(pair[0] as usize, pair[1] as usize);
                }
                v
            }
        }
    }
}

pub fn random(len: usize) -> Vec<i32> {
    //     .
    // : . : :
    // :.:::.::

    let mut rng = new_seed();

    (0..len).map(|_| rng.gen::<i32>()).collect()
}

pub fn random_i64(len: usize) -> Vec<i64> {
    //     .
    // : . : :
    // :.:::.::

    let mut rng = new_seed();

    (0..len).map(|_| rng.gen::<i64>()).collect()
}

pub fn random_uniform<R>(len: usize, range: R) -> Vec<i32>
where
    R: Into<rand::distributions::Uniform<i32>>,
{
    // :.:.:.::
    let mut rng = new_seed();

    // Abstracting over ranges in Rust :(
    let dist: rand::distributions::Uniform<i32> = range.into();

    (0..len).map(|_| dist.sample(&mut rng)).collect()
}

pub fn random_zipf(len: usize, exponent: f64) -> Vec<i32> {
    // https://en.wikipedia.org/wiki/Zipf's_law
    let mut rng = new_seed();

    let dist = ZipfDistribution::new(len, exponent).unwrap();

    (0..len).map(|_| dist.sample(&mut rng) as i32).collect()
}

pub fn random_sorted(len: usize, sorted_percent: f64) -> Vec<i32> {
    //     .:
    //   .:::. :
    // .::::::.::
    // [----][--]
    //  ^      ^
    //  |      |
    // sorted  |
    //     unsorted

    let mut v = random(len);
    let sorted_len = ((len as f64) * (sorted_percent / 100.0)).round() as usize;

    v[0..sorted_len].sort_unstable();

    v
}

pub fn all_equal(len: usize) -> Vec<i32> {
    // ......
    // ::::::

    vec![66; len]
}

pub fn ascending(len: usize) -> Vec<i32> {
    //     .:
    //   .:::
    // .:::::

    (0..len as i32).collect()
}

pub fn descending(len: usize) -> Vec<i32> {
    // :.
    // :::.
    // :::::.

    (0..len as i32).rev().collect()
}

pub fn saw_mixed(len: usize, saw_count: usize) -> Vec<i32> {
    // :.  :.    .::.    .:
    // :::.:::..::::::..:::

    if len == 0 {
        return Vec::new();
    }

    let mut vals = random(len);
    let chunks_size = (len / saw_count.max(1)).max(1);
    let saw_directions = random_uniform((len / chunks_size) + 1, 0..=1);

    for (i, chunk) in vals.chunks_mut(chunks_size).enumerate() {
        if saw_directions[i] == 0 {
            chunk.sort_unstable();
        } else {
            chunk.sort_unstable_by_key(|&e| std::cmp::Reverse(e));
        }
    }

    vals
}

pub fn pipe_organ(len: usize) -> Vec<i32> {
    //   .:.
    // .:::::.

    let mut vals = random(len);

    let (first_half, second_half) = vals.split_at_mut(len / 2);
    first_half.sort_unstable();
    second_half.sort_unstable_by_key(|&e| std::cmp::Reverse(e));

    vals
}

/// Overwrites the default behavior so that each call to a random derived pattern yields new random
/// values.
///
/// By default `patterns::random(4)` will yield the same values per process invocation.
/// For benchmarks it's advised to call this function.
pub fn use_random_seed_each_time() {
    let (seed_type, _) = get_or_init_seed_type_and_value();
    if seed_type == SeedType::ExternalOverride {
        panic!("Using use_random_seed_each_time conflicts with the external seed override.");
    }

    *SEED_TYPE_AND_VALUE.lock().unwrap() = Some((SeedType::RandomEachTime, 0));
}

/// The seed random patterns are derived from. Set `OVERRIDE_SEED` to reproduce a run.
pub fn random_init_seed() -> u64 {
    get_or_init_seed_type_and_value().1
}

// --- Private ---

#[derive(Copy, Clone, PartialEq, Eq)]
enum SeedType {
    RandomEachTime,
    RandomOncePerProcess,
    ExternalOverride,
}

static SEED_TYPE_AND_VALUE: Mutex<Option<(SeedType, u64)>> = Mutex::new(None);

fn get_or_init_seed_type_and_value() -> (SeedType, u64) {
    let (seed_type, seed_val) = *SEED_TYPE_AND_VALUE.lock().unwrap().get_or_insert_with(|| {
        if let Some(override_seed) = env::var("OVERRIDE_SEED")
            .ok()
            .map(|seed| u64::from_str(&seed).unwrap())
        {
            (SeedType::ExternalOverride, override_seed)
        } else {
            let per_process_seed = thread_rng().gen();
            (SeedType::RandomOncePerProcess, per_process_seed)
        }
    });

    if seed_type == SeedType::RandomEachTime {
        (SeedType::RandomEachTime, thread_rng().gen())
    } else {
        (seed_type, seed_val)
    }
}

fn new_seed() -> StdRng {
    StdRng::seed_from_u64(random_init_seed())
}
