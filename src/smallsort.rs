use core::mem::ManuallyDrop;
use core::ptr;

/// Sorts `v` using insertion sort, which is *O*(*n*^2) worst-case.
///
/// Used for every sub-slice at or below the small-sort threshold, where it beats further
/// partitioning and needs none of the depth or parallelism bookkeeping.
pub(crate) fn insertion_sort<T, F>(v: &mut [T], is_less: &F)
where
    F: Fn(&T, &T) -> bool,
{
    // Shift each element of the unsorted region v[i..] as far left as is needed to make v sorted.
    for i in 1..v.len() {
        insert_tail(&mut v[..=i], is_less);
    }
}

/// Inserts `v[v.len() - 1]` into pre-sorted sequence `v[..v.len() - 1]` so that whole `v[..]`
/// becomes sorted.
fn insert_tail<T, F>(v: &mut [T], is_less: &F)
where
    F: Fn(&T, &T) -> bool,
{
    if v.len() < 2 {
        return;
    }

    let v_base = v.as_mut_ptr();
    let i = v.len() - 1;

    // SAFETY: We checked that `v.len()` is at least 2, so `i` and `i - 1` are in-bounds and every
    // `j` visited by the loop is below `i - 1`. `v` is exclusively borrowed for the whole call.
    unsafe {
        let v_i = v_base.add(i);

        // It's important that we use v_i here. If this check is positive and we continue,
        // we want to make sure that no other copy of the value was seen by is_less.
        if is_less(&*v_i, &*v_i.sub(1)) {
            // Intermediate state of the insertion process is always tracked by `gap`, which
            // serves two purposes:
            // 1. Protects integrity of `v` from panics in `is_less`.
            // 2. Fills the remaining gap in `v` in the end.
            //
            // If `is_less` panics at any point during the process, `gap` will get dropped and
            // fill the gap in `v` with the held value, thus ensuring that `v` still holds every
            // object it initially held exactly once.
            let mut gap = GapGuard {
                pos: v_i.sub(1),
                value: ManuallyDrop::new(ptr::read(v_i)),
            };
            ptr::copy_nonoverlapping(gap.pos, v_i, 1);

            for j in (0..(i - 1)).rev() {
                let v_j = v_base.add(j);
                if !is_less(&*gap.value, &*v_j) {
                    break;
                }

                ptr::copy_nonoverlapping(v_j, gap.pos, 1);
                gap.pos = v_j;
            }
            // `gap` gets dropped and thus copies the held value into the remaining gap in `v`.
        }
    }
}

struct GapGuard<T> {
    pos: *mut T,
    value: ManuallyDrop<T>,
}

impl<T> Drop for GapGuard<T> {
    fn drop(&mut self) {
        // SAFETY: `pos` always points at the single slot of the slice whose value was moved out,
        // and `value` is the only live copy of that value.
        unsafe {
            ptr::copy_nonoverlapping(&*self.value, self.pos, 1);
        }
    }
}
