//! The pending-run stack and the galloping merge procedures.

use std::ptr;
use std::slice;

use log::{trace, warn};

use crate::error::SortError;
use crate::gallop::{gallop_left, gallop_right};
use crate::{INITIAL_TMP_STORAGE_LENGTH, MIN_GALLOP};

/// Upper bound on the number of pending runs. With the stack invariant in place run lengths
/// grow at least as fast as the Fibonacci numbers from the top of the stack down, which keeps the
/// depth far below this for any slice that fits in memory.
const MAX_MERGE_PENDING: usize = 85;

/// A sorted run `v[base..base + len]` waiting to be merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    pub base: usize,
    pub len: usize,
}

/// The mutable state of one merging sort call. Created fresh for each call and dropped at its
/// end, so independent calls never share anything.
pub struct MergeState<T> {
    /// Length of the whole slice being sorted, caps the scratch buffer at `len / 2`.
    len: usize,

    /// Controls when we get *into* galloping mode. Starts at `MIN_GALLOP`, `merge_lo` and
    /// `merge_hi` nudge it higher for random data and lower for highly structured data.
    min_gallop: usize,

    /// Pending runs, always adjacent: `runs[i].base + runs[i].len == runs[i + 1].base`.
    runs: Vec<Run>,

    /// Scratch storage for the shorter run of a merge. Its length is always 0, only the
    /// capacity is used.
    buf: Vec<T>,
}

impl<T> MergeState<T> {
    pub fn new(len: usize) -> Self {
        let tmp_len = if len < 2 * INITIAL_TMP_STORAGE_LENGTH {
            len / 2
        } else {
            INITIAL_TMP_STORAGE_LENGTH
        };

        Self {
            len,
            min_gallop: MIN_GALLOP,
            runs: Vec::new(),
            buf: Vec::with_capacity(tmp_len),
        }
    }

    pub fn min_gallop(&self) -> usize {
        self.min_gallop
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Pushes a run onto the pending-run stack.
    pub fn push_run(&mut self, run: Run) {
        debug_assert!(self
            .runs
            .last()
            .map_or(true, |last| last.base + last.len == run.base));
        debug_assert!(self.runs.len() < MAX_MERGE_PENDING);

        self.runs.push(run);
    }

    /// Merges adjacent runs until the stack invariants are re-established:
    ///
    /// 1. `runs[i - 3].len > runs[i - 2].len + runs[i - 1].len`
    /// 2. `runs[i - 2].len > runs[i - 1].len`
    ///
    /// Called after every push. Checking only the top three runs is not enough for the
    /// invariants to hold on the whole stack, so the fourth run from the top is checked as well.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    pub fn merge_collapse<F>(&mut self, v: &mut [T], is_less: &mut F) -> Result<(), SortError>
    where
        F: FnMut(&T, &T) -> bool,
    {
        while self.runs.len() > 1 {
            let runs = &self.runs;
            let n = runs.len();
            let mut i = n - 2;

            if (n >= 3 && runs[n - 3].len <= runs[n - 2].len + runs[n - 1].len)
                || (n >= 4 && runs[n - 4].len <= runs[n - 3].len + runs[n - 2].len)
            {
                if runs[n - 3].len < runs[n - 1].len {
                    i = n - 3;
                }
            } else if runs[n - 2].len > runs[n - 1].len {
                // Invariant is established.
                break;
            }

            self.merge_at(i, v, is_less)?;
        }

        Ok(())
    }

    /// Merges all runs on the stack until only one remains. Called once, to complete the sort.
    pub fn merge_force_collapse<F>(&mut self, v: &mut [T], is_less: &mut F) -> Result<(), SortError>
    where
        F: FnMut(&T, &T) -> bool,
    {
        while self.runs.len() > 1 {
            let n = self.runs.len();
            let mut i = n - 2;
            if n >= 3 && self.runs[n - 3].len < self.runs[n - 1].len {
                i = n - 3;
            }

            self.merge_at(i, v, is_less)?;
        }

        Ok(())
    }

    /// Merges the runs at stack indices `i` and `i + 1`. `i` must be the second or third run from
    /// the top of the stack.
    fn merge_at<F>(&mut self, i: usize, v: &mut [T], is_less: &mut F) -> Result<(), SortError>
    where
        F: FnMut(&T, &T) -> bool,
    {
        let n = self.runs.len();
        debug_assert!(n >= 2 && (i == n - 2 || i == n - 3));

        let Run { base: base1, len: len1 } = self.runs[i];
        let Run { base: base2, len: len2 } = self.runs[i + 1];
        debug_assert!(len1 > 0 && len2 > 0 && base1 + len1 == base2);

        // Record the length of the combined runs. If i is the 3rd-last run, the last run slides
        // over. The run at i + 1 goes away in any case.
        self.runs[i].len = len1 + len2;
        self.runs.remove(i + 1);

        trace!("merge_at: [{base1}, +{len1}) with [{base2}, +{len2})");

        // Find where the first element of run2 goes in run1. Prior elements in run1 are already
        // in place.
        let k = gallop_right(&v[base2], &v[base1..base2], 0, is_less);
        let base1 = base1 + k;
        let len1 = len1 - k;
        if len1 == 0 {
            return Ok(());
        }

        // Find where the last element of run1 goes in run2. Subsequent elements in run2 are
        // already in place.
        let len2 = gallop_left(
            &v[base1 + len1 - 1],
            &v[base2..base2 + len2],
            len2 - 1,
            is_less,
        );
        if len2 == 0 {
            return Ok(());
        }

        let merge_slice = &mut v[base1..base2 + len2];
        if len1 <= len2 {
            trace!("merge_lo: {len1} + {len2} after trimming");
            self.merge_lo(merge_slice, len1, is_less)
        } else {
            trace!("merge_hi: {len1} + {len2} after trimming");
            self.merge_hi(merge_slice, len1, is_less)
        }
    }

    /// Merges `v[..len1]` and `v[len1..]` left to right, copying the first run into the scratch
    /// buffer.
    ///
    /// For a consistent comparator, `v[len1] < v[0]` and `v[len1 - 1]` is greater than every
    /// element of the second run. Should be called only if `len1 <= v.len() - len1`.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    fn merge_lo<F>(&mut self, v: &mut [T], len1: usize, is_less: &mut F) -> Result<(), SortError>
    where
        F: FnMut(&T, &T) -> bool,
    {
        let mut len1 = len1;
        let mut len2 = v.len() - len1;
        debug_assert!(len1 > 0 && len2 > 0);

        let arr = v.as_mut_ptr();
        let tmp = self.ensure_capacity(len1);
        let mut min_gallop = self.min_gallop;

        // SAFETY: `tmp` has room for `len1` elements and does not overlap `v`. All reads and
        // writes below stay within `v[..len1 + len2]` and `tmp[..len1]`, tracked by `len1`,
        // `len2` and `cursor2`. `hole` always describes the part of `tmp` that is not yet moved
        // back, and the equally sized gap in `v` directly before `cursor2`.
        unsafe {
            ptr::copy_nonoverlapping(arr, tmp, len1);

            // Intermediate state of the merge is always tracked by `hole`, which serves two
            // purposes:
            // 1. Protects integrity of `v` from panics in `is_less`.
            // 2. Fills the remaining gap in `v` once the merge is done.
            //
            // If `is_less` panics at any point, `hole` gets dropped and fills the gap with the
            // unconsumed part of `tmp`, so `v` still holds every element exactly once.
            let mut hole = MergeHole {
                start: tmp,
                end: tmp.add(len1),
                dest: arr,
            };
            let mut cursor2 = len1;

            // Move first element of second run and deal with degenerate cases.
            ptr::copy_nonoverlapping(arr.add(cursor2), hole.dest, 1);
            hole.dest = hole.dest.add(1);
            cursor2 += 1;
            len2 -= 1;
            if len2 == 0 {
                return Ok(());
            }
            if len1 == 1 {
                ptr::copy(arr.add(cursor2), hole.dest, len2);
                hole.dest = hole.dest.add(len2);
                return Ok(());
            }

            'outer: loop {
                // Number of times in a row that the first (second) run won.
                let mut count1 = 0;
                let mut count2 = 0;

                // Do the straightforward thing until (if ever) one run starts winning
                // consistently.
                loop {
                    if is_less(&*arr.add(cursor2), &*hole.start) {
                        ptr::copy_nonoverlapping(arr.add(cursor2), hole.dest, 1);
                        hole.dest = hole.dest.add(1);
                        cursor2 += 1;
                        count2 += 1;
                        count1 = 0;
                        len2 -= 1;
                        if len2 == 0 {
                            break 'outer;
                        }
                    } else {
                        ptr::copy_nonoverlapping(hole.start, hole.dest, 1);
                        hole.dest = hole.dest.add(1);
                        hole.start = hole.start.add(1);
                        count1 += 1;
                        count2 = 0;
                        len1 -= 1;
                        if len1 == 1 {
                            break 'outer;
                        }
                    }

                    if (count1 | count2) >= min_gallop {
                        break;
                    }
                }

                // One run is winning so consistently that galloping may be a huge win. So try
                // that, and continue galloping until (if ever) neither run appears to be winning
                // consistently anymore.
                loop {
                    count1 = gallop_right(
                        &*arr.add(cursor2),
                        slice::from_raw_parts(hole.start, len1),
                        0,
                        is_less,
                    );
                    if count1 != 0 {
                        ptr::copy_nonoverlapping(hole.start, hole.dest, count1);
                        hole.dest = hole.dest.add(count1);
                        hole.start = hole.start.add(count1);
                        len1 -= count1;
                        if len1 <= 1 {
                            break 'outer;
                        }
                    }
                    ptr::copy_nonoverlapping(arr.add(cursor2), hole.dest, 1);
                    hole.dest = hole.dest.add(1);
                    cursor2 += 1;
                    len2 -= 1;
                    if len2 == 0 {
                        break 'outer;
                    }

                    count2 = gallop_left(
                        &*hole.start,
                        slice::from_raw_parts(arr.add(cursor2), len2),
                        0,
                        is_less,
                    );
                    if count2 != 0 {
                        // The gap is smaller than the block, source and destination may overlap.
                        ptr::copy(arr.add(cursor2), hole.dest, count2);
                        hole.dest = hole.dest.add(count2);
                        cursor2 += count2;
                        len2 -= count2;
                        if len2 == 0 {
                            break 'outer;
                        }
                    }
                    ptr::copy_nonoverlapping(hole.start, hole.dest, 1);
                    hole.dest = hole.dest.add(1);
                    hole.start = hole.start.add(1);
                    len1 -= 1;
                    if len1 == 1 {
                        break 'outer;
                    }

                    min_gallop = min_gallop.saturating_sub(1);
                    if count1 < MIN_GALLOP && count2 < MIN_GALLOP {
                        break;
                    }
                }

                // Penalize for leaving gallop mode.
                min_gallop += 2;
            }

            self.min_gallop = min_gallop.max(1);

            if len1 == 1 {
                // The last element of run1 belongs at the very end of the merge.
                ptr::copy(arr.add(cursor2), hole.dest, len2);
                hole.dest = hole.dest.add(len2);
            } else if len1 == 0 {
                warn!("merge_lo: first run exhausted early, comparator is inconsistent");
                return Err(SortError::ComparatorContractViolation);
            }

            // `hole` gets dropped here and moves what is left of run1 into place.
            Ok(())
        }
    }

    /// Like [`Self::merge_lo`], except that it copies the second run into the scratch buffer and
    /// merges right to left. Should be called only if `len1 >= v.len() - len1`.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    fn merge_hi<F>(&mut self, v: &mut [T], len1: usize, is_less: &mut F) -> Result<(), SortError>
    where
        F: FnMut(&T, &T) -> bool,
    {
        let mut len1 = len1;
        let mut len2 = v.len() - len1;
        debug_assert!(len1 > 0 && len2 > 0);

        let arr = v.as_mut_ptr();
        let tmp = self.ensure_capacity(len2);
        let mut min_gallop = self.min_gallop;

        // SAFETY: `tmp` has room for `len2` elements and does not overlap `v`. The unconsumed
        // part of run1 is always `v[..len1]`, the unconsumed part of run2 is `tmp[..len2]` and
        // the gap in between is `v[len1..len1 + len2]`. The next output slot is the last element
        // of that gap, which `hole` keeps track of.
        unsafe {
            ptr::copy_nonoverlapping(arr.add(len1), tmp, len2);

            // See `merge_lo`, same purpose. Here the gap starts right after the unconsumed part
            // of run1.
            let mut hole = MergeHole {
                start: tmp,
                end: tmp.add(len2),
                dest: arr.add(len1),
            };

            // Move last element of first run and deal with degenerate cases.
            ptr::copy_nonoverlapping(arr.add(len1 - 1), arr.add(len1 + len2 - 1), 1);
            len1 -= 1;
            hole.dest = arr.add(len1);
            if len1 == 0 {
                return Ok(());
            }
            if len2 == 1 {
                ptr::copy(arr, arr.add(1), len1);
                hole.dest = arr;
                return Ok(());
            }

            'outer: loop {
                // Number of times in a row that the first (second) run won.
                let mut count1 = 0;
                let mut count2 = 0;

                // Do the straightforward thing until (if ever) one run appears to win
                // consistently.
                loop {
                    let out = arr.add(len1 + len2 - 1);
                    if is_less(&*tmp.add(len2 - 1), &*arr.add(len1 - 1)) {
                        ptr::copy_nonoverlapping(arr.add(len1 - 1), out, 1);
                        len1 -= 1;
                        hole.dest = arr.add(len1);
                        count1 += 1;
                        count2 = 0;
                        if len1 == 0 {
                            break 'outer;
                        }
                    } else {
                        ptr::copy_nonoverlapping(tmp.add(len2 - 1), out, 1);
                        len2 -= 1;
                        hole.end = tmp.add(len2);
                        count2 += 1;
                        count1 = 0;
                        if len2 == 1 {
                            break 'outer;
                        }
                    }

                    if (count1 | count2) >= min_gallop {
                        break;
                    }
                }

                // One run is winning so consistently that galloping may be a huge win. So try
                // that, and continue galloping until (if ever) neither run appears to be winning
                // consistently anymore.
                loop {
                    count1 = len1
                        - gallop_right(
                            &*tmp.add(len2 - 1),
                            slice::from_raw_parts(arr, len1),
                            len1 - 1,
                            is_less,
                        );
                    if count1 != 0 {
                        // Shifts the tail of run1 right by the gap size, may overlap.
                        ptr::copy(arr.add(len1 - count1), arr.add(len1 + len2 - count1), count1);
                        len1 -= count1;
                        hole.dest = arr.add(len1);
                        if len1 == 0 {
                            break 'outer;
                        }
                    }
                    ptr::copy_nonoverlapping(tmp.add(len2 - 1), arr.add(len1 + len2 - 1), 1);
                    len2 -= 1;
                    hole.end = tmp.add(len2);
                    if len2 == 1 {
                        break 'outer;
                    }

                    count2 = len2
                        - gallop_left(
                            &*arr.add(len1 - 1),
                            slice::from_raw_parts(tmp, len2),
                            len2 - 1,
                            is_less,
                        );
                    if count2 != 0 {
                        ptr::copy_nonoverlapping(
                            tmp.add(len2 - count2),
                            arr.add(len1 + len2 - count2),
                            count2,
                        );
                        len2 -= count2;
                        hole.end = tmp.add(len2);
                        if len2 <= 1 {
                            break 'outer;
                        }
                    }
                    ptr::copy_nonoverlapping(arr.add(len1 - 1), arr.add(len1 + len2 - 1), 1);
                    len1 -= 1;
                    hole.dest = arr.add(len1);
                    if len1 == 0 {
                        break 'outer;
                    }

                    min_gallop = min_gallop.saturating_sub(1);
                    if count1 < MIN_GALLOP && count2 < MIN_GALLOP {
                        break;
                    }
                }

                // Penalize for leaving gallop mode.
                min_gallop += 2;
            }

            self.min_gallop = min_gallop.max(1);

            if len2 == 1 {
                // The first element of run2 belongs at the very front of the merge.
                ptr::copy(arr, arr.add(1), len1);
                hole.dest = arr;
            } else if len2 == 0 {
                warn!("merge_hi: second run exhausted early, comparator is inconsistent");
                return Err(SortError::ComparatorContractViolation);
            }

            // `hole` gets dropped here and moves what is left of run2 into place.
            Ok(())
        }
    }

    /// Ensures the scratch buffer can hold at least `min_capacity` elements and returns a pointer
    /// to it. Grows to the next power of two, capped at half the slice length.
    fn ensure_capacity(&mut self, min_capacity: usize) -> *mut T {
        if self.buf.capacity() < min_capacity {
            let new_capacity = min_capacity
                .saturating_add(1)
                .checked_next_power_of_two()
                .map_or(min_capacity, |cap| cap.min(self.len / 2))
                .max(min_capacity);

            // The buffer never holds initialized elements, so it can be replaced without drops.
            self.buf = Vec::with_capacity(new_capacity);
        }

        self.buf.as_mut_ptr()
    }
}

// When dropped, copies the range `start..end` into `dest..`.
struct MergeHole<T> {
    start: *mut T,
    end: *mut T,
    dest: *mut T,
}

impl<T> Drop for MergeHole<T> {
    fn drop(&mut self) {
        // SAFETY: `start..end` is the unconsumed part of the scratch buffer and `dest` is the
        // start of an equally long gap in the slice being sorted. The two never overlap.
        unsafe {
            let len = self.end.offset_from(self.start) as usize;
            ptr::copy_nonoverlapping(self.start, self.dest, len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_less_i32(a: &i32, b: &i32) -> bool {
        a < b
    }

    fn merge_runs(v: &mut [i32], runs: &[usize]) -> Result<(), SortError> {
        let mut state = MergeState::new(v.len());
        let mut base = 0;
        for &len in runs {
            state.push_run(Run { base, len });
            base += len;
        }
        state.merge_force_collapse(v, &mut is_less_i32)?;

        assert_eq!(state.runs(), &[Run { base: 0, len: v.len() }]);
        Ok(())
    }

    #[test]
    fn merge_lo_and_hi_interleaved() {
        // Short first run, merge_lo.
        let mut v = vec![3, 5, 7, 0, 1, 2, 4, 6, 8, 9];
        merge_runs(&mut v, &[3, 7]).unwrap();
        assert_eq!(v, (0..10).collect::<Vec<_>>());

        // Short second run, merge_hi.
        let mut v = vec![0, 1, 2, 4, 6, 8, 9, 3, 5, 7];
        merge_runs(&mut v, &[7, 3]).unwrap();
        assert_eq!(v, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn merge_gallops_over_blocks() {
        // Long blocks that win many times in a row force galloping mode in both directions.
        let mut a: Vec<i32> = (0..200).map(|x| x * 2).collect();
        let mut b: Vec<i32> = (0..50).map(|x| x * 2 + 1).chain(400..700).collect();

        let mut v = a.clone();
        v.extend_from_slice(&b);
        let (split, len) = (a.len(), v.len());
        merge_runs(&mut v, &[split, len - split]).unwrap();
        let mut expected = v.clone();
        expected.sort();
        assert_eq!(v, expected);

        // Same data, but the long run first.
        std::mem::swap(&mut a, &mut b);
        let mut v: Vec<i32> = a.iter().map(|x| x - 1000).collect();
        v.extend(b.iter().map(|x| x * 3 - 700));
        let (split, len) = (a.len(), v.len());
        merge_runs(&mut v, &[split, len - split]).unwrap();
        let mut expected = v.clone();
        expected.sort();
        assert_eq!(v, expected);
    }

    fn merged_min_gallop(run1: &[i32], run2: &[i32]) -> usize {
        let mut v = run1.to_vec();
        v.extend_from_slice(run2);

        let mut state = MergeState::new(v.len());
        state.push_run(Run { base: 0, len: run1.len() });
        state.push_run(Run {
            base: run1.len(),
            len: run2.len(),
        });
        assert_eq!(state.min_gallop(), MIN_GALLOP);

        state.merge_force_collapse(&mut v, &mut is_less_i32).unwrap();
        assert!(v.windows(2).all(|w| w[0] <= w[1]));

        state.min_gallop()
    }

    #[test]
    fn min_gallop_drops_on_blocky_runs() {
        // Blocks of 50 alternate between the runs, so every gallop moves a whole block.
        let blocks = |parity: i32| -> Vec<i32> {
            (0..20)
                .filter(|b| b % 2 == parity)
                .flat_map(|b| b * 50..(b + 1) * 50)
                .collect()
        };

        let min_gallop = merged_min_gallop(&blocks(0), &blocks(1));
        assert!(min_gallop < MIN_GALLOP, "min_gallop: {min_gallop}");
        assert!(min_gallop >= 1);
    }

    #[test]
    fn min_gallop_stays_on_alternating_runs() {
        // Neither side ever wins twice in a row, galloping is never entered.
        let evens: Vec<i32> = (0..500).map(|x| x * 2).collect();
        let odds: Vec<i32> = (0..500).map(|x| x * 2 + 1).collect();

        assert!(merged_min_gallop(&evens, &odds) >= MIN_GALLOP);
        assert!(merged_min_gallop(&odds, &evens) >= MIN_GALLOP);
    }

    #[test]
    fn merge_preordered_runs_is_cheap() {
        let mut v: Vec<i32> = (0..1000).collect();
        let mut state = MergeState::new(v.len());
        state.push_run(Run { base: 0, len: 500 });
        state.push_run(Run { base: 500, len: 500 });

        let mut comps = 0;
        state
            .merge_force_collapse(&mut v, &mut |a: &i32, b: &i32| {
                comps += 1;
                a < b
            })
            .unwrap();

        assert_eq!(v, (0..1000).collect::<Vec<_>>());
        assert!(comps < 30, "comps: {comps}");
    }

    #[test]
    fn collapse_keeps_invariant() {
        let len = 10_000;
        let mut v: Vec<i32> = (0..len as i32).collect();
        let mut state = MergeState::new(len);

        let mut base = 0;
        let run_lens = [100, 40, 30, 20, 900, 16, 17, 18, 19, 500, 33, 33, 33];
        for &run_len in run_lens.iter().cycle() {
            if base + run_len > len {
                break;
            }
            state.push_run(Run { base, len: run_len });
            state.merge_collapse(&mut v, &mut is_less_i32).unwrap();
            base += run_len;

            let runs = state.runs();
            for i in 2..runs.len() {
                assert!(runs[i - 2].len > runs[i - 1].len + runs[i].len);
            }
            for i in 1..runs.len() {
                assert!(runs[i - 1].len > runs[i].len);
            }
        }
    }

    #[test]
    fn ensure_capacity_grows_to_power_of_two_capped() {
        let mut state = MergeState::<u64>::new(10_000);
        assert!(state.buf.capacity() >= INITIAL_TMP_STORAGE_LENGTH);

        state.ensure_capacity(300);
        assert!(state.buf.capacity() >= 512);

        state.ensure_capacity(4_999);
        assert!(state.buf.capacity() >= 4_999);
        assert!(state.buf.capacity() < 8_192);
    }
}
