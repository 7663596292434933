use std::time::{SystemTime, UNIX_EPOCH};

use log::trace;

const MULTIPLIER: u32 = 1_664_525;
const INCREMENT: u32 = 1_013_904_223;

const TWO_TO_32: f64 = 4_294_967_296.0;
const U32_MAX: f64 = u32::MAX as f64;

/// Seeded 32-bit linear-congruential generator.
///
/// Every draw advances `seed ← seed · 1664525 + 1013904223 (mod 2^32)` once, so
/// two generators built with the same seed produce the same values for the
/// same sequence of calls.
///
/// Draws need `&mut self`. Keep one generator per thread (or per call site), or
/// put it behind a `Mutex` if it really has to be shared.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KlRand {
    seed: i32,
}

impl KlRand {
    #[inline]
    pub const fn new(seed: i32) -> Self {
        KlRand { seed }
    }

    /// Seeds from the wall clock. Not reproducible from run to run.
    pub fn from_time() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let seed = (now.as_secs() as u32) ^ now.subsec_nanos();
        trace!("seeding KlRand from the clock: {seed}");
        KlRand::new(seed as i32)
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }

    #[inline]
    pub fn set_seed(&mut self, seed: i32) {
        self.seed = seed;
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let next = (self.seed as u32)
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT);
        self.seed = next as i32;
        next
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn uniform_semi_open_prob(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_TO_32
    }

    /// Uniform in `[0, 1]`.
    #[inline]
    pub fn uniform_closed_prob(&mut self) -> f64 {
        f64::from(self.next_u32()) / U32_MAX
    }

    /// 返回闭区间 `[min(lim1, lim2), max(lim1, lim2)]` 内的均匀整数，两个边界可以任意顺序给出。
    pub fn uniform_long(&mut self, lim1: i64, lim2: i64) -> i64 {
        let (min, max) = if lim1 <= lim2 { (lim1, lim2) } else { (lim2, lim1) };
        let width = i128::from(max) - i128::from(min) + 1;
        let offset = (width as f64 * self.uniform_semi_open_prob()) as i128;
        // 宽度很大时浮点乘法可能舍入到 width 本身
        let value = (i128::from(min) + offset).min(i128::from(max));
        value as i64
    }

    /// Unsigned counterpart of [`uniform_long`](Self::uniform_long).
    pub fn uniform_ulong(&mut self, lim1: u64, lim2: u64) -> u64 {
        let (min, max) = if lim1 <= lim2 { (lim1, lim2) } else { (lim2, lim1) };
        let width = u128::from(max) - u128::from(min) + 1;
        let offset = (width as f64 * self.uniform_semi_open_prob()) as u128;
        (u128::from(min) + offset).min(u128::from(max)) as u64
    }

    /// Uniform in the closed interval between the two limits, given in either
    /// order.
    ///
    /// The result is clamped back into `[min, max]`: the interpolation can round
    /// a hair past either limit.
    pub fn uniform_double(&mut self, lim1: f64, lim2: f64) -> f64 {
        let (min, max) = if lim1 <= lim2 { (lim1, lim2) } else { (lim2, lim1) };
        let p = self.uniform_closed_prob();
        let value = min * (1.0 - p) + max * p;
        value.clamp(min, max)
    }
}

impl Default for KlRand {
    fn default() -> Self {
        KlRand::from_time()
    }
}
