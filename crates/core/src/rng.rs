//! The single random source threaded through a generation run, plus the
//! weighted catalog type every generator samples from.

use rand::{
    distr::{weighted::WeightedIndex, Distribution},
    rngs::SmallRng,
    Rng, SeedableRng,
};

use crate::err::Result;

/// Random source owned by one generation run.
///
/// Every generator borrows this mutably; draws happen in a fixed order, so the
/// same seed reproduces the same output byte for byte.
pub type Source = SmallRng;

pub fn seeded(seed: u64) -> Source {
    SmallRng::seed_from_u64(seed)
}

/// A fixed catalog of values with relative weights.
pub struct Weighted<T: 'static> {
    items: &'static [(T, u32)],
    index: WeightedIndex<u32>,
}

impl<T: Copy + 'static> Weighted<T> {
    pub fn new(items: &'static [(T, u32)]) -> Result<Self> {
        let index = WeightedIndex::new(items.iter().map(|(_, w)| *w))?;
        Ok(Self { items, index })
    }
}

impl<T: Copy + 'static> Distribution<T> for Weighted<T> {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.items[self.index.sample(rng)].0
    }
}
