/// Per-side price index
///
/// Owns one [`TierForest`] and caches the side's highest and lowest active
/// prices so best-price reads never touch the forest.
use smallvec::SmallVec;
use tracing::debug;

use super::codec::{EncodedPrice, Price, MAX_PRICE};
use super::forest::{PriceSlots, TierForest};
use super::{Direction, Side};
use crate::domain::error::PriceIndexError;

/// Active prices collected by a depth walk
pub type LevelList = SmallVec<[Price; 16]>;

#[derive(Debug, Clone)]
pub struct SideIndex {
    side: Side,
    forest: TierForest,
    highest: Option<Price>,
    lowest: Option<Price>,
    active_levels: u32,
}

impl SideIndex {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            forest: TierForest::new(),
            highest: None,
            lowest: None,
            active_levels: 0,
        }
    }

    /// Reassembles a side from a validated forest
    pub(super) fn from_parts(
        side: Side,
        forest: TierForest,
        highest: Option<Price>,
        lowest: Option<Price>,
    ) -> Self {
        let active_levels = forest.active_count();
        Self {
            side,
            forest,
            highest,
            lowest,
            active_levels,
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn forest(&self) -> &TierForest {
        &self.forest
    }

    /// Activates a price level
    ///
    /// Returns `Ok(false)` when the price was already active; nothing changes.
    pub fn insert(&mut self, price: Price) -> Result<bool, PriceIndexError> {
        let encoded = EncodedPrice::encode(price)?;
        if !self.forest.insert(encoded) {
            return Ok(false);
        }

        self.active_levels += 1;
        self.highest = Some(self.highest.map_or(price, |h| h.max(price)));
        self.lowest = Some(self.lowest.map_or(price, |l| l.min(price)));

        debug!(
            side = self.side.as_str(),
            price,
            active = self.active_levels,
            "price level activated"
        );
        Ok(true)
    }

    /// Deactivates a price level
    ///
    /// Returns `Ok(false)` when the price was not active; nothing changes.
    pub fn remove(&mut self, price: Price) -> Result<bool, PriceIndexError> {
        let encoded = EncodedPrice::encode(price)?;
        if !self.forest.remove(encoded) {
            return Ok(false);
        }

        self.active_levels -= 1;
        if self.forest.is_empty() {
            self.highest = None;
            self.lowest = None;
        } else {
            if self.highest == Some(price) {
                let top = EncodedPrice::encode(MAX_PRICE)?;
                self.highest = self.forest.nearest(top, Direction::Below);
                debug!(side = self.side.as_str(), highest = ?self.highest, "highest recomputed");
            }
            if self.lowest == Some(price) {
                let bottom = EncodedPrice::encode(0)?;
                self.lowest = self.forest.nearest(bottom, Direction::Above);
                debug!(side = self.side.as_str(), lowest = ?self.lowest, "lowest recomputed");
            }
        }

        debug!(
            side = self.side.as_str(),
            price,
            active = self.active_levels,
            "price level deactivated"
        );
        Ok(true)
    }

    /// Nearest active price at or beyond `price` in `direction`
    pub fn nearest_price(
        &self,
        price: Price,
        direction: Direction,
    ) -> Result<Option<Price>, PriceIndexError> {
        let encoded = EncodedPrice::encode(price)?;
        Ok(self.forest.nearest(encoded, direction))
    }

    pub fn contains(&self, price: Price) -> Result<bool, PriceIndexError> {
        Ok(self.forest.contains(EncodedPrice::encode(price)?))
    }

    #[inline]
    pub fn highest(&self) -> Option<Price> {
        self.highest
    }

    #[inline]
    pub fn lowest(&self) -> Option<Price> {
        self.lowest
    }

    /// Best price of this side: highest bid or lowest ask
    #[inline]
    pub fn best(&self) -> Option<Price> {
        match self.side {
            Side::Bid => self.highest,
            Side::Ask => self.lowest,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active_levels == 0
    }

    #[inline]
    pub fn active_levels(&self) -> u32 {
        self.active_levels
    }

    /// The top, middle and bottom units addressed by `price`
    pub fn slots(&self, price: Price) -> Result<PriceSlots, PriceIndexError> {
        Ok(self.forest.slots(EncodedPrice::encode(price)?))
    }

    /// Walks up to `limit` active prices from the best price away from the
    /// spread (bids descending, asks ascending)
    pub fn levels(&self, limit: usize) -> LevelList {
        let direction = self.side.away_from_spread();
        let mut levels = LevelList::new();
        let mut cursor = self.best();

        while let Some(price) = cursor {
            if levels.len() >= limit {
                break;
            }
            levels.push(price);
            cursor = step(price, direction)
                .and_then(|next| EncodedPrice::encode(next).ok())
                .and_then(|next| self.forest.nearest(next, direction));
        }
        levels
    }
}

/// The next search start strictly beyond `price`, if still inside the domain
#[inline]
fn step(price: Price, direction: Direction) -> Option<Price> {
    match direction {
        Direction::Above if price < MAX_PRICE => Some(price + 1),
        Direction::Below if price > 0 => Some(price - 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_index::CompoundBucket;

    fn bid_with(prices: impl IntoIterator<Item = Price>) -> SideIndex {
        let mut index = SideIndex::new(Side::Bid);
        for price in prices {
            assert!(index.insert(price).unwrap());
        }
        index
    }

    #[test]
    fn test_empty_side() {
        let index = SideIndex::new(Side::Bid);
        assert!(index.is_empty());
        assert_eq!(index.highest(), None);
        assert_eq!(index.lowest(), None);
        assert_eq!(index.best(), None);
        for price in [0, 1, 15, 1_000_000, MAX_PRICE] {
            assert_eq!(index.nearest_price(price, Direction::Above).unwrap(), None);
            assert_eq!(index.nearest_price(price, Direction::Below).unwrap(), None);
        }
        assert!(index.levels(10).is_empty());
    }

    #[test]
    fn test_nearest_after_removing_gap() {
        let mut index = bid_with((5..=215).step_by(15));
        assert!(index.remove(20).unwrap());

        assert_eq!(index.nearest_price(20, Direction::Above).unwrap(), Some(35));
        assert_eq!(index.nearest_price(20, Direction::Below).unwrap(), Some(5));
        assert_eq!(index.highest(), Some(215));
        assert_eq!(index.lowest(), Some(5));
    }

    #[test]
    fn test_extrema_follow_insert_and_remove() {
        let mut index = bid_with([0, 15]);
        assert_eq!(index.lowest(), Some(0));
        assert_eq!(index.highest(), Some(15));

        index.remove(15).unwrap();
        assert_eq!(index.highest(), Some(0));
        assert_eq!(index.lowest(), Some(0));

        index.remove(0).unwrap();
        assert_eq!(index.highest(), None);
        assert_eq!(index.lowest(), None);
    }

    #[test]
    fn test_extrema_recomputed_across_tiers() {
        let mut index = bid_with([10, 500_000, MAX_PRICE]);
        index.remove(MAX_PRICE).unwrap();
        assert_eq!(index.highest(), Some(500_000));
        index.remove(10).unwrap();
        assert_eq!(index.lowest(), Some(500_000));
    }

    #[test]
    fn test_active_price_is_its_own_nearest() {
        for price in [0, 1, 14, 15, 224, 225, 3_374, 3_375, 7_777_025, MAX_PRICE] {
            let index = bid_with([price]);
            assert_eq!(index.nearest_price(price, Direction::Above).unwrap(), Some(price));
            assert_eq!(index.nearest_price(price, Direction::Below).unwrap(), Some(price));
            assert!(index.contains(price).unwrap());
        }
    }

    #[test]
    fn test_insert_remove_returns_to_zero() {
        let mut index = SideIndex::new(Side::Ask);
        index.insert(5_666_642).unwrap();
        index.remove(5_666_642).unwrap();

        let slots = index.slots(5_666_642).unwrap();
        assert_eq!(slots.top, CompoundBucket::EMPTY);
        assert_eq!(slots.middle, CompoundBucket::EMPTY);
        assert_eq!(slots.bottom, CompoundBucket::EMPTY);
        assert_eq!(index.active_levels(), 0);
    }

    #[test]
    fn test_duplicate_transitions_are_noops() {
        let mut index = bid_with([100]);
        assert!(!index.insert(100).unwrap());
        assert_eq!(index.active_levels(), 1);

        assert!(!index.remove(101).unwrap());
        assert_eq!(index.highest(), Some(100));
        assert_eq!(index.active_levels(), 1);
    }

    #[test]
    fn test_out_of_domain_rejected_without_mutation() {
        let mut index = bid_with([42]);
        assert!(index.insert(MAX_PRICE + 1).unwrap_err().is_out_of_domain());
        assert!(index.remove(MAX_PRICE + 1).unwrap_err().is_out_of_domain());
        assert!(index.nearest_price(u32::MAX, Direction::Below).is_err());
        assert_eq!(index.active_levels(), 1);
        assert_eq!(index.highest(), Some(42));
    }

    #[test]
    fn test_levels_walk_away_from_spread() {
        let bids = bid_with([100, 3_000, 225, 50_625, 7]);
        assert_eq!(bids.levels(3).as_slice(), &[50_625, 3_000, 225]);
        assert_eq!(bids.levels(10).as_slice(), &[50_625, 3_000, 225, 100, 7]);
        assert!(bids.levels(0).is_empty());

        let mut asks = SideIndex::new(Side::Ask);
        for price in [MAX_PRICE, 0, 9_000] {
            asks.insert(price).unwrap();
        }
        assert_eq!(asks.best(), Some(0));
        assert_eq!(asks.levels(5).as_slice(), &[0, 9_000, MAX_PRICE]);
    }
}
