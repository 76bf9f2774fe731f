//! Run detection and the binary insertion sort used to extend short runs.

use crate::MIN_MERGE;

/// Returns the length of the run at the start of `v`, reversing it if it is descending, so that
/// after this call `v[..len]` is non-decreasing.
///
/// A run is either non-decreasing (`v[0] <= v[1] <= ...`) or strictly descending
/// (`v[0] > v[1] > ...`). The strictness for descending runs is what makes the reversal stable,
/// there are no equal neighbours that could swap their relative order.
///
/// `v` must not be empty. The returned length is at least 1.
#[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
pub fn count_run_and_make_ascending<T, F>(v: &mut [T], is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    debug_assert!(len > 0);

    if len < 2 {
        return len;
    }

    let mut end = 2;

    if is_less(&v[1], &v[0]) {
        while end < len && is_less(&v[end], &v[end - 1]) {
            end += 1;
        }
        v[..end].reverse();
    } else {
        while end < len && !is_less(&v[end], &v[end - 1]) {
            end += 1;
        }
    }

    end
}

/// Sorts `v` with binary insertion sort, assuming `v[..start]` is already sorted.
///
/// Each element of `v[start..]` is placed after all elements it is not less than, which keeps
/// equal elements in their original order. Uses O(n log n) comparisons but O(n^2) moves, so it is
/// only used on short slices.
#[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
pub fn binary_sort<T, F>(v: &mut [T], start: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    debug_assert!(start <= len);

    let start = start.max(1);

    for i in start..len {
        // Invariants: v[i] >= all in v[..left], v[i] < all in v[right..i].
        let mut left = 0;
        let mut right = i;
        while left < right {
            let mid = left + (right - left) / 2;
            if is_less(&v[i], &v[mid]) {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        // The comparator has returned for the last time for this element, so the shift can no
        // longer be interrupted by a panic. `rotate_right` handles the overlapping move.
        v[left..=i].rotate_right(1);
    }
}

/// Returns the minimum run length for a slice of length `n`. Natural runs shorter than this get
/// extended with [`binary_sort`].
///
/// If `n < MIN_MERGE` this is `n`. If `n` is an exact power of two it is `MIN_MERGE / 2`.
/// Otherwise it is some `k` with `MIN_MERGE / 2 <= k <= MIN_MERGE` such that `n / k` is close to,
/// but strictly less than, a power of two. That keeps the final merges balanced.
pub fn min_run_length(mut n: usize) -> usize {
    // Becomes 1 if any 1 bits are shifted off.
    let mut r = 0;
    while n >= MIN_MERGE {
        r |= n & 1;
        n >>= 1;
    }

    n + r
}
