#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Sort by the high nibble only, the index records the original position.
    let mut v: Vec<(u8, usize)> = data.iter().copied().zip(0..).collect();
    let mut expected = v.clone();
    expected.sort_by_key(|e| e.0 >> 4);

    timsort::sort_by(&mut v, |a, b| (a.0 >> 4).cmp(&(b.0 >> 4))).unwrap();
    assert_eq!(v, expected);
});
