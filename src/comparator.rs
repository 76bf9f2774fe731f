//! Built-in comparators.
//!
//! Any `FnMut(&T, &T) -> Ordering` that implements a total order can be passed to the sort
//! functions. These cover the common cases: natural order, order of the textual rendering, and
//! order of the leading integer in the textual rendering.

use std::cmp::Ordering;
use std::fmt::Display;

/// Orders values by their [`Ord`] implementation.
///
/// Operands of different types cannot be compared at all, the type system rejects them instead
/// of coercing one side.
#[inline]
pub fn natural_order<T>(a: &T, b: &T) -> Ordering
where
    T: Ord + ?Sized,
{
    a.cmp(b)
}

/// Orders values by their [`Display`] rendering, compared as strings.
///
/// Both operands are rendered on every call. For more than a handful of elements, render once
/// with [`sort_by_cached_key`](crate::sort_by_cached_key) or
/// [`reorder_children`](crate::reorder_children) instead.
pub fn string_order<T>(a: &T, b: &T) -> Ordering
where
    T: Display + ?Sized,
{
    a.to_string().cmp(&b.to_string())
}

/// Orders values by the integer their [`Display`] rendering starts with, see [`parse_int`].
///
/// Values without a leading integer sort after all values that have one and are equal among
/// themselves, so this is still a total order.
///
/// Renders and parses both operands on every call. To pay that once per element, extract the
/// key with [`parse_int`] through [`sort_by_cached_key`](crate::sort_by_cached_key) or
/// [`reorder_children`](crate::reorder_children).
pub fn numeric_order<T>(a: &T, b: &T) -> Ordering
where
    T: Display + ?Sized,
{
    let a = parse_int(&a.to_string());
    let b = parse_int(&b.to_string());

    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parses the integer at the start of `s`, ignoring anything after it.
///
/// Leading whitespace is skipped and an optional `+` or `-` sign is accepted. A `0x` or `0X`
/// prefix switches to hexadecimal. Returns `None` if no digit follows. Values outside the `i64`
/// range saturate.
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim_start();

    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, s) = if s.starts_with("0x") || s.starts_with("0X") {
        (16, &s[2..])
    } else {
        (10, s)
    };

    let mut value: i128 = 0;
    let mut digits = 0;
    for digit in s.chars().map_while(|c| c.to_digit(radix)) {
        value = value
            .saturating_mul(radix as i128)
            .saturating_add(digit as i128);
        digits += 1;
    }

    if digits == 0 {
        return None;
    }

    if negative {
        value = -value;
    }

    Some(value.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_like_the_web_does() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("  -17px"), Some(-17));
        assert_eq!(parse_int("+8"), Some(8));
        assert_eq!(parse_int("0x1A"), Some(26));
        assert_eq!(parse_int("12.9"), Some(12));
        assert_eq!(parse_int("007"), Some(7));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("99999999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_int("-99999999999999999999999"), Some(i64::MIN));
    }

    #[test]
    fn numeric_order_puts_non_numbers_last() {
        let mut v = vec!["10", "n/a", "9", "-3", "", "100kB"];
        crate::sort_by(&mut v, |a, b| numeric_order(*a, *b)).unwrap();
        assert_eq!(v, ["-3", "9", "10", "100kB", "n/a", ""]);
    }

    #[test]
    fn string_order_is_lexicographic() {
        let mut v = vec![10, 9, 100, 1];
        crate::sort_by(&mut v, string_order).unwrap();
        assert_eq!(v, [1, 10, 100, 9]);
    }

    #[test]
    fn natural_order_on_unsized() {
        assert_eq!(natural_order("abc", "abd"), Ordering::Less);
        assert_eq!(natural_order(&3, &3), Ordering::Equal);
    }
}
