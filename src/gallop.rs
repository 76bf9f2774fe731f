//! Exponential-then-binary searches for insertion points in a sorted run.
//!
//! Both searches start at `hint` and probe at offsets 1, 3, 7, 15, ... away from it until the key
//! is bracketed, then binary search the bracket. The cost is O(log d) where d is the distance
//! between `hint` and the answer, not O(log len). The merge procedures pass hints close to the
//! expected answer, that is where the adaptivity on partially ordered input comes from.

/// Returns `k` such that `v[..k] < key <= v[k..]`, the leftmost position `key` can be inserted at.
///
/// `v` must be sorted and non-empty, `hint < v.len()`.
#[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
pub fn gallop_left<T, F>(key: &T, v: &[T], hint: usize, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    debug_assert!(len > 0 && hint < len);

    let mut last_ofs = 0;
    let mut ofs = 1;

    // The answer lies in lo..=hi, with v[lo - 1] < key <= v[hi] treating v[-1] as minus infinity
    // and v[len] as infinity.
    let (mut lo, mut hi) = if is_less(&v[hint], key) {
        // Gallop right until v[hint + last_ofs] < key <= v[hint + ofs].
        let max_ofs = len - hint;
        while ofs < max_ofs && is_less(&v[hint + ofs], key) {
            last_ofs = ofs;
            ofs = next_ofs(ofs);
        }
        ofs = ofs.min(max_ofs);

        (hint + last_ofs + 1, hint + ofs)
    } else {
        // Gallop left until v[hint - ofs] < key <= v[hint - last_ofs].
        let max_ofs = hint + 1;
        while ofs < max_ofs && !is_less(&v[hint - ofs], key) {
            last_ofs = ofs;
            ofs = next_ofs(ofs);
        }
        ofs = ofs.min(max_ofs);

        (hint + 1 - ofs, hint - last_ofs)
    };

    debug_assert!(lo <= hi && hi <= len);

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if is_less(&v[mid], key) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    hi
}

/// Like [`gallop_left`], except that if `v` contains elements equal to `key`, the returned
/// position is after the rightmost of them: `v[..k] <= key < v[k..]`.
///
/// `v` must be sorted and non-empty, `hint < v.len()`.
#[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
pub fn gallop_right<T, F>(key: &T, v: &[T], hint: usize, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    debug_assert!(len > 0 && hint < len);

    let mut last_ofs = 0;
    let mut ofs = 1;

    // The answer lies in lo..=hi, with v[lo - 1] <= key < v[hi].
    let (mut lo, mut hi) = if is_less(key, &v[hint]) {
        // Gallop left until v[hint - ofs] <= key < v[hint - last_ofs].
        let max_ofs = hint + 1;
        while ofs < max_ofs && is_less(key, &v[hint - ofs]) {
            last_ofs = ofs;
            ofs = next_ofs(ofs);
        }
        ofs = ofs.min(max_ofs);

        (hint + 1 - ofs, hint - last_ofs)
    } else {
        // Gallop right until v[hint + last_ofs] <= key < v[hint + ofs].
        let max_ofs = len - hint;
        while ofs < max_ofs && !is_less(key, &v[hint + ofs]) {
            last_ofs = ofs;
            ofs = next_ofs(ofs);
        }
        ofs = ofs.min(max_ofs);

        (hint + last_ofs + 1, hint + ofs)
    };

    debug_assert!(lo <= hi && hi <= len);

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if is_less(key, &v[mid]) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    hi
}

#[inline]
fn next_ofs(ofs: usize) -> usize {
    // Saturates instead of wrapping, the caller clamps to max_ofs anyway.
    ofs.saturating_mul(2).saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_less_i32(a: &i32, b: &i32) -> bool {
        a < b
    }

    const V: [i32; 12] = [1, 2, 2, 2, 4, 5, 7, 7, 8, 10, 11, 11];

    fn expected_left(key: i32) -> usize {
        V.partition_point(|x| *x < key)
    }

    fn expected_right(key: i32) -> usize {
        V.partition_point(|x| *x <= key)
    }

    #[test]
    fn gallop_left_matches_partition_point_for_every_hint() {
        for key in 0..13 {
            for hint in 0..V.len() {
                assert_eq!(
                    gallop_left(&key, &V, hint, &mut is_less_i32),
                    expected_left(key),
                    "key: {key} hint: {hint}"
                );
            }
        }
    }

    #[test]
    fn gallop_right_matches_partition_point_for_every_hint() {
        for key in 0..13 {
            for hint in 0..V.len() {
                assert_eq!(
                    gallop_right(&key, &V, hint, &mut is_less_i32),
                    expected_right(key),
                    "key: {key} hint: {hint}"
                );
            }
        }
    }

    #[test]
    fn gallop_near_hint_is_cheap() {
        let v: Vec<i32> = (0..100_000).collect();
        let mut comps = 0;
        let k = gallop_left(&50_003, &v, 50_000, &mut |a: &i32, b: &i32| {
            comps += 1;
            a < b
        });

        assert_eq!(k, 50_003);
        assert!(comps <= 8, "comps: {comps}");
    }

    #[test]
    fn gallop_single_element() {
        let v = [5];
        assert_eq!(gallop_left(&5, &v, 0, &mut is_less_i32), 0);
        assert_eq!(gallop_right(&5, &v, 0, &mut is_less_i32), 1);
        assert_eq!(gallop_left(&6, &v, 0, &mut is_less_i32), 1);
        assert_eq!(gallop_right(&4, &v, 0, &mut is_less_i32), 0);
    }
}
