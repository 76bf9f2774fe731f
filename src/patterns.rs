//! Input patterns for testing and benchmarking the sort. Values are `i32`.
//!
//! All random patterns draw from a seed that is fixed for the whole process by default, so a
//! failing test can be reproduced from the seed the harness prints.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use rand::prelude::*;

// --- Public ---

pub fn random(size: usize) -> Vec<i32> {
    //     .
    // : . : :
    // :.:::.::

    let mut rng = new_seed();
    (0..size).map(|_| rng.gen::<i32>()).collect()
}

pub fn random_uniform<R>(size: usize, range: R) -> Vec<i32>
where
    R: Into<rand::distributions::Uniform<i32>>,
{
    // :.:.:.::

    let mut rng = new_seed();
    let dist: rand::distributions::Uniform<i32> = range.into();

    (0..size).map(|_| dist.sample(&mut rng)).collect()
}

pub fn all_equal(size: usize) -> Vec<i32> {
    // ......
    // ::::::

    vec![66; size]
}

pub fn ascending(size: usize) -> Vec<i32> {
    //     .:
    //   .:::
    // .:::::

    (0..size as i32).collect()
}

pub fn descending(size: usize) -> Vec<i32> {
    // :.
    // :::.
    // :::::.

    (0..size as i32).rev().collect()
}

pub fn saw_mixed(size: usize, saw_count: usize) -> Vec<i32> {
    // :.  :.    .::.    .:
    // :::.:::..::::::..:::

    if size == 0 {
        return Vec::new();
    }

    let mut vals = random(size);
    let chunk_size = (size / saw_count.max(1)).max(1);
    let saw_directions = random_uniform((size / chunk_size) + 1, 0..=1);

    for (chunk, direction) in vals.chunks_mut(chunk_size).zip(saw_directions) {
        if direction == 0 {
            chunk.sort_unstable();
        } else {
            chunk.sort_unstable_by_key(|&e| std::cmp::Reverse(e));
        }
    }

    vals
}

pub fn pipe_organ(size: usize) -> Vec<i32> {
    //   .:.
    // .:::::.

    let mut vals = random(size);

    let (first_half, second_half) = vals.split_at_mut(size / 2);
    first_half.sort_unstable();
    second_half.sort_unstable_by_key(|&e| std::cmp::Reverse(e));

    vals
}

pub fn ascending_with_noise(size: usize, noise_percent: f64) -> Vec<i32> {
    //      .:
    //  . .:::
    // .:::.::

    // Mostly ascending, with a few random elements sprinkled in. Long runs with short breaks are
    // where galloping pays off.

    let mut vals = ascending(size);
    let noise_count = ((size as f64 / 100.0) * noise_percent).round() as usize;
    let positions = random_uniform(noise_count, 0..(size.max(1) as i32));
    let noise = random(noise_count);

    for (pos, val) in positions.into_iter().zip(noise) {
        if let Some(slot) = vals.get_mut(pos as usize) {
            *slot = val;
        }
    }

    vals
}

static USE_FIXED_SEED: AtomicBool = AtomicBool::new(true);

/// Makes every random pattern draw a fresh seed. Benchmarks call this, tests should not.
pub fn disable_fixed_seed() {
    USE_FIXED_SEED.store(false, Ordering::Release);
}

pub fn random_init_seed() -> u64 {
    if USE_FIXED_SEED.load(Ordering::Acquire) {
        static SEED: OnceCell<u64> = OnceCell::new();
        *SEED.get_or_init(|| -> u64 { thread_rng().gen() })
    } else {
        thread_rng().gen()
    }
}

// --- Private ---

fn new_seed() -> StdRng {
    // Random seed, but the harness prints it for repeatability.
    StdRng::seed_from_u64(random_init_seed())
}
