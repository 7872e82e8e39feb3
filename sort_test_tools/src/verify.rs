/// Returns the first position `i` where `is_less(v[i], v[i - 1])`, i.e. the first element that
/// breaks the sorted order, or `None` if `v` is sorted.
pub fn first_unsorted_position<T, F>(v: &[T], mut is_less: F) -> Option<usize>
where
    F: FnMut(&T, &T) -> bool,
{
    v.windows(2)
        .position(|w| is_less(&w[1], &w[0]))
        .map(|i| i + 1)
}

pub fn is_sorted_by<T, F>(v: &[T], is_less: F) -> bool
where
    F: FnMut(&T, &T) -> bool,
{
    first_unsorted_position(v, is_less).is_none()
}

pub fn is_sorted<T: Ord>(v: &[T]) -> bool {
    is_sorted_by(v, |a, b| a.lt(b))
}
