/// Shared book handle
///
/// Wraps a [`PriceBook`] in `Arc<RwLock<_>>` so one writer and any number of
/// readers can use the same book from different threads. Writers hold the
/// lock for the whole propagation, so readers only ever see settled forests.
use std::sync::Arc;

use parking_lot::RwLock;

use super::book::{BookSnapshot, PriceBook};
use super::traits::{BookSummary, MappedLevels, PriceLevelIndex};
use crate::domain::error::PriceIndexError;
use crate::domain::price_index::{Direction, Side};

#[derive(Debug, Clone)]
pub struct SharedPriceBook {
    inner: Arc<RwLock<PriceBook>>,
}

impl SharedPriceBook {
    pub fn new(book: PriceBook) -> Self {
        Self {
            inner: Arc::new(RwLock::new(book)),
        }
    }

    /// Runs `f` under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&PriceBook) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut PriceBook) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn snapshot(&self) -> BookSnapshot {
        self.inner.read().snapshot()
    }
}

impl PriceLevelIndex for SharedPriceBook {
    fn insert_level(&mut self, side: Side, price: u64) -> Result<bool, PriceIndexError> {
        self.inner.write().insert_level(side, price)
    }

    fn remove_level(&mut self, side: Side, price: u64) -> Result<bool, PriceIndexError> {
        self.inner.write().remove_level(side, price)
    }

    fn highest(&self, side: Side) -> Option<u64> {
        self.inner.read().highest(side)
    }

    fn lowest(&self, side: Side) -> Option<u64> {
        self.inner.read().lowest(side)
    }

    fn nearest_price(
        &self,
        side: Side,
        price: u64,
        direction: Direction,
    ) -> Result<Option<u64>, PriceIndexError> {
        self.inner.read().nearest_price(side, price, direction)
    }

    fn active_levels(&self, side: Side) -> u32 {
        self.inner.read().active_levels(side)
    }

    // whole walk under one guard
    fn levels(&self, side: Side, limit: usize) -> MappedLevels {
        self.inner.read().levels(side, limit)
    }

    // both extremes under one guard
    fn summary(&self) -> BookSummary {
        self.inner.read().summary()
    }
}
