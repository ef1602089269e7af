//! Deterministic per-invocation RNG (§4.A): a hash of
//! `(iteration, path_index, depth)` seeds a small PRNG so that re-seeding on
//! every shading step lets the scheduling model reorder samples freely
//! without affecting the result — the property §8.1 (determinism per seed)
//! depends on.

pub use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// Hash three 32-bit lanes into one 64-bit seed. A cheap, well-mixed
/// integer hash (splitmix64's finalizer) rather than anything
/// cryptographic — we only need good statistical spread per path.
fn hash_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    x
}

/// Seed a fresh RNG for one shading invocation. Called once per path per
/// depth, per §4.A — never carried across steps.
pub fn seeded_rng(iteration: u32, path_index: u32, depth: u32) -> SmallRng {
    let mixed = (iteration as u64) << 40 ^ (path_index as u64) << 12 ^ (depth as u64);
    let seed = hash_u64(mixed ^ 0x9E3779B97F4A7C15);
    SmallRng::seed_from_u64(seed)
}

pub fn next_f32(rng: &mut SmallRng) -> f32 {
    // 24 bits of mantissa is all an f32 in [0, 1) can use.
    (rng.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}

pub fn next_2d(rng: &mut SmallRng) -> (f32, f32) {
    (next_f32(rng), next_f32(rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_give_same_stream() {
        let mut a = seeded_rng(3, 17, 2);
        let mut b = seeded_rng(3, 17, 2);
        for _ in 0..8 {
            assert_eq!(next_f32(&mut a), next_f32(&mut b));
        }
    }

    #[test]
    fn different_depth_gives_different_stream() {
        let mut a = seeded_rng(3, 17, 2);
        let mut b = seeded_rng(3, 17, 3);
        assert!(next_f32(&mut a) != next_f32(&mut b));
    }
}
