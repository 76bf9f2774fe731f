//! A stable, adaptive, iterative merge sort that needs far fewer than n log n comparisons on
//! partially sorted input, while staying O(n log n) in the worst case.
//!
//! The slice is scanned once for natural runs. Descending runs are reversed, runs shorter than a
//! minimum length are extended with binary insertion sort, and runs are pushed onto a stack that
//! merges neighbours whenever their lengths get out of balance. Merges copy the shorter run into a
//! scratch buffer and switch to galloping (exponential search) when one side keeps winning.
//!
//! Every entry point returns a [`Result`]: invalid ranges are rejected before the slice is
//! touched, and a comparator that turns out not to be a total order is reported as
//! [`SortError::ComparatorContractViolation`] instead of silently producing garbage.

use std::cmp::Ordering;

pub mod comparator;
pub mod error;
pub mod gallop;
pub mod merge;
pub mod patterns;
pub mod reorder;
pub mod run;
mod sort;

pub use error::{ErrorKind, RangeError, SortError};
pub use reorder::{reorder_children, ChildContainer};
pub use sort::{sort, sort_by, sort_by_cached_key, sort_by_key, sort_range, sort_range_by};

/// The minimum sized sequence that will be merged. Shorter sequences are lengthened with binary
/// insertion sort, and if the whole slice is shorter than this no merges happen at all.
///
/// Must be a power of two for [`run::min_run_length`] to produce balanced merges.
pub const MIN_MERGE: usize = 32;

/// Once galloping mode is entered, it is kept until both runs win fewer than this many times in
/// a row. Also the starting value of the adaptive gallop threshold.
pub const MIN_GALLOP: usize = 7;

/// Maximum initial capacity of the merge scratch buffer. It grows on demand.
pub const INITIAL_TMP_STORAGE_LENGTH: usize = 256;

/// Common interface of sort implementations, used by the test and benchmark harnesses to run
/// the same checks against different implementations.
pub trait Sort {
    fn name() -> String;

    fn sort<T>(arr: &mut [T]) -> Result<(), SortError>
    where
        T: Ord;

    fn sort_by<T, F>(arr: &mut [T], compare: F) -> Result<(), SortError>
    where
        F: FnMut(&T, &T) -> Ordering;
}

/// This crate's sort, behind the [`Sort`] interface.
pub struct TimSort;

impl Sort for TimSort {
    fn name() -> String {
        "timsort_stable".into()
    }

    #[inline]
    fn sort<T>(arr: &mut [T]) -> Result<(), SortError>
    where
        T: Ord,
    {
        sort::sort(arr).map(|_| ())
    }

    #[inline]
    fn sort_by<T, F>(arr: &mut [T], compare: F) -> Result<(), SortError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        sort::sort_by(arr, compare).map(|_| ())
    }
}

/// The standard library's stable sort, as a reference point. Never fails.
pub struct StdStableSort;

impl Sort for StdStableSort {
    fn name() -> String {
        "rust_std_stable".into()
    }

    #[inline]
    fn sort<T>(arr: &mut [T]) -> Result<(), SortError>
    where
        T: Ord,
    {
        arr.sort();
        Ok(())
    }

    #[inline]
    fn sort_by<T, F>(arr: &mut [T], compare: F) -> Result<(), SortError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        arr.sort_by(compare);
        Ok(())
    }
}
