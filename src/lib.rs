//! 1-based index ranges, sparse index subsets and a seeded sampler.
//!
//! - [`IndexRange`]: a closed interval of indices that can also be "nothing"
//!   or a zero-length range anchored at an index.
//! - [`Subset`]: a sorted set of indices from the universe `1..=N`, with set
//!   algebra, unbiased random sampling and a fixed-length stream format.
//! - [`KlRand`]: a seeded 32-bit linear-congruential generator. All sampling
//!   in [`Subset`] draws from it, so a fixed seed reproduces every sample.
//!
//! ```
//! use index_ranges::{KlRand, Subset};
//!
//! let mut rows = Subset::new(20);
//! for i in (2..=20).step_by(2) {
//!     rows.add(i);
//! }
//! let mut rng = KlRand::new(7);
//! let splits = rows.random_disjoint_samples(&mut rng, &[3, 3, 4]).unwrap();
//! assert_eq!(splits.iter().map(Subset::len).sum::<usize>(), 10);
//! ```

mod error;
mod random;
mod range;
pub mod stream;
mod subset;

pub use crate::{
    error::{Error, Result},
    random::KlRand,
    range::IndexRange,
    subset::{Runs, Subset},
};
