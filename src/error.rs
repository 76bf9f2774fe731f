use thiserror::Error;

/// Invalid `lo..hi` bounds passed to a range sort. Reported before the slice is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range start {lo} is greater than range end {hi}")]
    StartAfterEnd { lo: usize, hi: usize },

    #[error("range end {hi} is out of bounds for slice of length {len}")]
    EndOutOfBounds { hi: usize, len: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SortError {
    #[error(transparent)]
    Range(#[from] RangeError),

    /// A merge ran out of elements on the side a consistent comparator guarantees to be
    /// non-empty. The slice still holds every element exactly once, but in unspecified order.
    #[error("comparison method violates its general contract")]
    ComparatorContractViolation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Range,
    ComparatorContractViolation,
}

impl SortError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SortError::Range(_) => ErrorKind::Range,
            SortError::ComparatorContractViolation => ErrorKind::ComparatorContractViolation,
        }
    }
}

/// Checks that `lo..hi` is a valid range into a slice of length `len`.
pub fn range_check(len: usize, lo: usize, hi: usize) -> Result<(), RangeError> {
    if lo > hi {
        return Err(RangeError::StartAfterEnd { lo, hi });
    }

    if hi > len {
        return Err(RangeError::EndOutOfBounds { hi, len });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check_accepts_valid_bounds() {
        assert_eq!(range_check(0, 0, 0), Ok(()));
        assert_eq!(range_check(10, 3, 3), Ok(()));
        assert_eq!(range_check(10, 0, 10), Ok(()));
    }

    #[test]
    fn range_check_rejects_invalid_bounds() {
        assert_eq!(
            range_check(10, 4, 3),
            Err(RangeError::StartAfterEnd { lo: 4, hi: 3 })
        );
        assert_eq!(
            range_check(10, 0, 11),
            Err(RangeError::EndOutOfBounds { hi: 11, len: 10 })
        );
    }

    #[test]
    fn kind_distinguishes_errors() {
        let range: SortError = RangeError::StartAfterEnd { lo: 2, hi: 1 }.into();
        assert_eq!(range.kind(), ErrorKind::Range);
        assert_eq!(
            SortError::ComparatorContractViolation.kind(),
            ErrorKind::ComparatorContractViolation
        );
        assert_eq!(
            range.to_string(),
            "range start 2 is greater than range end 1"
        );
    }
}
