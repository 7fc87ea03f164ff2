/// Price Book - mapped two-sided price index
///
/// Owns one [`SideIndex`] per side and the [`BookConfig`] that maps external
/// prices onto the index domain. Bounds are checked before any side is
/// touched, so a rejected price never leaves a partial update behind.
use bincode::{config, Decode, Encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::mapping::BookConfig;
use super::traits::{MappedLevels, PriceLevelIndex};
use crate::domain::error::{ConfigError, PriceIndexError};
use crate::domain::price_index::{Direction, PriceSlots, Side, SideIndex, SideSnapshot};

#[derive(Debug, Clone)]
pub struct PriceBook {
    config: BookConfig,
    bids: SideIndex,
    asks: SideIndex,
}

impl PriceBook {
    /// Creates an empty book after validating `config`
    pub fn new(config: BookConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            base_price = config.base_price,
            decimal_scale = config.decimal_scale,
            "price book created"
        );
        Ok(Self {
            config,
            bids: SideIndex::new(Side::Bid),
            asks: SideIndex::new(Side::Ask),
        })
    }

    #[inline]
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    #[inline]
    pub fn side(&self, side: Side) -> &SideIndex {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    #[inline]
    fn side_mut(&mut self, side: Side) -> &mut SideIndex {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    #[inline]
    pub fn to_internal(&self, mapped: u64) -> Result<u32, PriceIndexError> {
        self.config.to_internal(mapped)
    }

    #[inline]
    pub fn to_external(&self, internal: u32) -> u64 {
        self.config.to_external(internal)
    }

    pub fn format_price(&self, mapped: u64) -> String {
        self.config.format_price(mapped)
    }

    pub fn contains(&self, side: Side, price: u64) -> Result<bool, PriceIndexError> {
        self.side(side).contains(self.to_internal(price)?)
    }

    /// The three tier units addressed by a mapped price
    pub fn price_slots(&self, side: Side, price: u64) -> Result<PriceSlots, PriceIndexError> {
        self.side(side).slots(self.to_internal(price)?)
    }

    /// Deactivates every level on both sides
    pub fn clear(&mut self) {
        self.bids = SideIndex::new(Side::Bid);
        self.asks = SideIndex::new(Side::Ask);
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            config: self.config,
            bids: self.bids.snapshot(),
            asks: self.asks.snapshot(),
        }
    }

    pub fn restore(snapshot: &BookSnapshot) -> Result<Self, PriceIndexError> {
        snapshot
            .config
            .validate()
            .map_err(|e| PriceIndexError::CorruptSnapshot(e.to_string()))?;
        Ok(Self {
            config: snapshot.config,
            bids: SideIndex::restore(Side::Bid, &snapshot.bids)?,
            asks: SideIndex::restore(Side::Ask, &snapshot.asks)?,
        })
    }
}

impl PriceLevelIndex for PriceBook {
    fn insert_level(&mut self, side: Side, price: u64) -> Result<bool, PriceIndexError> {
        let internal = self.to_internal(price)?;
        self.side_mut(side).insert(internal)
    }

    fn remove_level(&mut self, side: Side, price: u64) -> Result<bool, PriceIndexError> {
        let internal = self.to_internal(price)?;
        self.side_mut(side).remove(internal)
    }

    #[inline]
    fn highest(&self, side: Side) -> Option<u64> {
        self.side(side).highest().map(|p| self.to_external(p))
    }

    #[inline]
    fn lowest(&self, side: Side) -> Option<u64> {
        self.side(side).lowest().map(|p| self.to_external(p))
    }

    fn nearest_price(
        &self,
        side: Side,
        price: u64,
        direction: Direction,
    ) -> Result<Option<u64>, PriceIndexError> {
        let internal = self.to_internal(price)?;
        let found = self.side(side).nearest_price(internal, direction)?;
        Ok(found.map(|p| self.to_external(p)))
    }

    #[inline]
    fn active_levels(&self, side: Side) -> u32 {
        self.side(side).active_levels()
    }

    fn levels(&self, side: Side, limit: usize) -> MappedLevels {
        self.side(side)
            .levels(limit)
            .iter()
            .map(|&p| self.to_external(p))
            .collect()
    }
}

/// Serialized form of a whole book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct BookSnapshot {
    pub config: BookConfig,
    pub bids: SideSnapshot,
    pub asks: SideSnapshot,
}

impl BookSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PriceIndexError> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PriceIndexError> {
        let (snapshot, read) = bincode::decode_from_slice(bytes, config::standard())?;
        if read != bytes.len() {
            return Err(PriceIndexError::CorruptSnapshot(format!(
                "{} trailing bytes after snapshot",
                bytes.len() - read
            )));
        }
        Ok(snapshot)
    }
}
