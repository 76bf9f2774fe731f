//! Entry points: range checking, the small-slice fast path and the run/merge driver loop.

use std::cmp::Ordering;
use std::mem;

use log::debug;

use crate::error::{range_check, SortError};
use crate::merge::{MergeState, Run};
use crate::run::{binary_sort, count_run_and_make_ascending, min_run_length};
use crate::MIN_MERGE;

/// Sorts `v` in natural order. See [`sort_by`].
#[inline]
pub fn sort<T>(v: &mut [T]) -> Result<&mut [T], SortError>
where
    T: Ord,
{
    sort_by(v, |a, b| a.cmp(b))
}

/// Sorts `v` with a comparator function, in place and stable. Returns the same slice.
///
/// The comparator must implement a total order that stays consistent for the whole call. If the
/// merge machinery notices that it does not, [`SortError::ComparatorContractViolation`] is
/// returned. The slice then still contains every element exactly once, in unspecified order.
#[inline]
pub fn sort_by<T, F>(v: &mut [T], compare: F) -> Result<&mut [T], SortError>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = v.len();
    sort_range_by(v, 0, len, compare)
}

/// Sorts `v[lo..hi]` in natural order. See [`sort_range_by`].
#[inline]
pub fn sort_range<T>(v: &mut [T], lo: usize, hi: usize) -> Result<&mut [T], SortError>
where
    T: Ord,
{
    sort_range_by(v, lo, hi, |a, b| a.cmp(b))
}

/// Sorts `v[lo..hi]` with a comparator function, leaving the rest of `v` untouched.
///
/// Requires `lo <= hi <= v.len()`, otherwise returns [`SortError::Range`] before any element is
/// moved or compared.
pub fn sort_range_by<T, F>(
    v: &mut [T],
    lo: usize,
    hi: usize,
    mut compare: F,
) -> Result<&mut [T], SortError>
where
    F: FnMut(&T, &T) -> Ordering,
{
    range_check(v.len(), lo, hi)?;

    if mem::size_of::<T>() != 0 {
        // Sorting has no meaningful behavior on zero-sized types.
        merge_sort(&mut v[lo..hi], &mut |a, b| compare(a, b) == Ordering::Less)?;
    }

    Ok(v)
}

/// Sorts `v` by the key `f` extracts, calling `f` on every comparison. Prefer
/// [`sort_by_cached_key`] if computing the key is expensive.
#[inline]
pub fn sort_by_key<T, K, F>(v: &mut [T], mut f: F) -> Result<&mut [T], SortError>
where
    F: FnMut(&T) -> K,
    K: Ord,
{
    sort_by(v, |a, b| f(a).cmp(&f(b)))
}

/// Sorts `v` by the key `f` extracts, calling `f` exactly once per element.
///
/// The keys are sorted alongside the original positions, then the permutation is applied to
/// `v`. If sorting the keys fails `v` is left untouched.
pub fn sort_by_cached_key<T, K, F>(v: &mut [T], f: F) -> Result<&mut [T], SortError>
where
    F: FnMut(&T) -> K,
    K: Ord,
{
    let len = v.len();
    if len < 2 {
        return Ok(v);
    }

    let mut indices: Vec<(K, usize)> = v.iter().map(f).enumerate().map(|(i, k)| (k, i)).collect();

    // The sort is stable, so equal keys keep their original index order without comparing the
    // indices.
    sort_by(&mut indices, |a, b| a.0.cmp(&b.0))?;

    for i in 0..len {
        let mut index = indices[i].1;
        while index < i {
            index = indices[index].1;
        }
        indices[i].1 = index;
        v.swap(i, index);
    }

    Ok(v)
}

/// Sorts `v` with the full run detection and merge machinery, falling back to a single binary
/// insertion sort for short slices.
#[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
pub(crate) fn merge_sort<T, F>(v: &mut [T], is_less: &mut F) -> Result<(), SortError>
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();

    if len < 2 {
        // These inputs are always sorted.
        return Ok(());
    }

    // Small slices get a "mini sort" without any merges.
    if len < MIN_MERGE {
        let init_run_len = count_run_and_make_ascending(v, is_less);
        binary_sort(v, init_run_len, is_less);
        return Ok(());
    }

    let min_run = min_run_length(len);
    debug!("merge_sort: len {len}, min run {min_run}");

    let mut state = MergeState::new(len);
    let mut lo = 0;
    let mut remaining = len;

    // March over the slice once, left to right, finding natural runs, extending short natural
    // runs to min_run elements and merging runs to maintain the stack invariant.
    while remaining != 0 {
        let mut run_len = count_run_and_make_ascending(&mut v[lo..], is_less);

        if run_len < min_run {
            let force = remaining.min(min_run);
            binary_sort(&mut v[lo..lo + force], run_len, is_less);
            run_len = force;
        }

        state.push_run(Run {
            base: lo,
            len: run_len,
        });
        state.merge_collapse(v, is_less)?;

        lo += run_len;
        remaining -= run_len;
    }

    state.merge_force_collapse(v, is_less)?;

    // Finally, exactly one run must remain in the stack.
    debug_assert!(state.runs() == &[Run { base: 0, len }]);
    debug!("merge_sort: done, final min gallop {}", state.min_gallop());

    Ok(())
}
