/// Chooses a pivot in `v` and returns its index.
///
/// Takes the median of the elements at `len / 4`, `len / 2` and `3 * len / 4`. Longer slices use
/// the median of the medians of the three neighbourhoods instead. Sorted, reverse sorted and pipe
/// organ inputs all yield a pivot close to the true median this way.
pub(crate) fn choose_pivot<T, F>(v: &[T], is_less: &F) -> usize
where
    F: Fn(&T, &T) -> bool,
{
    // Minimum length to choose the median-of-medians method.
    // Shorter slices use the simple median-of-three method.
    const SHORTEST_MEDIAN_OF_MEDIANS: usize = 50;

    let len = v.len();

    // It's a logic bug if this gets called on a slice that would be small-sorted.
    debug_assert!(len >= crate::config::MIN_SMALL_SORT_THRESHOLD);

    let len_div_4 = len / 4;
    let a = len_div_4;
    let b = len_div_4 * 2;
    let c = len_div_4 * 3;

    if len >= SHORTEST_MEDIAN_OF_MEDIANS {
        let a = median3(v, a - 1, a, a + 1, is_less);
        let b = median3(v, b - 1, b, b + 1, is_less);
        let c = median3(v, c - 1, c, c + 1, is_less);
        median3(v, a, b, c, is_less)
    } else {
        median3(v, a, b, c, is_less)
    }
}

/// Returns the index of the median of `v[a]`, `v[b]` and `v[c]`.
fn median3<T, F>(v: &[T], a: usize, b: usize, c: usize, is_less: &F) -> usize
where
    F: Fn(&T, &T) -> bool,
{
    let x = is_less(&v[a], &v[b]);
    let y = is_less(&v[a], &v[c]);
    if x == y {
        // If x=y=0 then b, c <= a. In this case we want to return max(b, c).
        // If x=y=1 then a < b, c. In this case we want to return min(b, c).
        let z = is_less(&v[b], &v[c]);
        if z ^ x {
            c
        } else {
            b
        }
    } else {
        // Either c <= a < b or b <= a < c, thus a is our median.
        a
    }
}

/// Takes the input slice `v` and re-arranges elements such that when the call returns normally
/// all elements that compare true for `is_less(elem, pivot)` where `pivot == v[pivot_pos]` are
/// on the left side of `v`, followed by the pivot itself, followed by the other elements,
/// notionally considered greater or equal to `pivot`.
///
/// Returns the number of elements that compared true for `is_less(elem, pivot)`, which is also
/// the final position of the pivot. Both sides excluding the pivot are strictly shorter than `v`.
///
/// If `is_less` does not implement a total order the resulting order and return value are
/// unspecified. All original elements will remain in `v`, the same is true if `is_less` panics.
pub(crate) fn partition<T, F>(v: &mut [T], pivot_pos: usize, is_less: &F) -> usize
where
    F: Fn(&T, &T) -> bool,
{
    let len = v.len();

    if len == 0 {
        return 0;
    }

    // Place the pivot at the beginning of slice.
    v.swap(0, pivot_pos);
    let (pivot, v_without_pivot) = v.split_at_mut(1);

    // The split guarantees that `pivot` and `v_without_pivot` can't alias, so the pivot can be
    // compared by reference without copying it onto the stack.
    let pivot = &pivot[0];

    let num_lt = hoare_partition(v_without_pivot, pivot, is_less);

    // Place the pivot between the two partitions.
    v.swap(0, num_lt);

    num_lt
}

/// Partitions `v` into elements equal to `v[pivot_pos]` followed by elements greater than
/// `v[pivot_pos]`, assuming no element is smaller than the pivot.
///
/// Returns the position of the pivot. Every element left of it is equal to the pivot, so the
/// caller only needs to continue on the right side.
pub(crate) fn partition_equal<T, F>(v: &mut [T], pivot_pos: usize, is_less: &F) -> usize
where
    F: Fn(&T, &T) -> bool,
{
    partition(v, pivot_pos, &|a: &T, b: &T| !is_less(b, a))
}

fn hoare_partition<T, F>(v: &mut [T], pivot: &T, is_less: &F) -> usize
where
    F: Fn(&T, &T) -> bool,
{
    let mut l = 0;
    let mut r = v.len();

    // Invariant: `v[..l]` is less than the pivot and `v[r..]` is not.
    loop {
        // Find the first element greater than or equal to the pivot.
        while l < r && is_less(&v[l], pivot) {
            l += 1;
        }

        // Find the last element smaller than the pivot.
        while l < r && !is_less(&v[r - 1], pivot) {
            r -= 1;
        }

        // Are we done?
        if l >= r {
            break;
        }

        // Swap the found pair of out-of-order elements.
        r -= 1;
        v.swap(l, r);
        l += 1;
    }

    l
}
