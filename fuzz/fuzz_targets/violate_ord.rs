#![no_main]

use std::cmp::Ordering;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((split, rest)) = data.split_first() else {
        return;
    };

    // The first half is the input, the second half drives the orderings the comparator returns.
    let (values, orderings) = rest.split_at((*split as usize).min(rest.len()));
    let mut v = values.to_vec();
    let mut i = 0;

    let res = timsort::sort_by(&mut v, |a, b| {
        let ordering = match orderings.get(i) {
            Some(x) if x % 3 == 0 => Ordering::Less,
            Some(x) if x % 3 == 1 => Ordering::Greater,
            Some(_) => Ordering::Equal,
            None => a.cmp(b),
        };
        i += 1;
        ordering
    });

    match res {
        Ok(_) | Err(timsort::SortError::ComparatorContractViolation) => {}
        Err(err) => panic!("unexpected error: {err}"),
    }

    let mut before = values.to_vec();
    before.sort();
    v.sort();
    assert_eq!(v, before);
});
