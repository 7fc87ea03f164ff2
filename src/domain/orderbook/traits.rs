/// PriceLevelIndex Trait - Domain Layer Abstraction
///
/// The narrow interface a matching engine drives: activate/deactivate price
/// levels as their order count crosses zero, and ask for best, extreme and
/// nearest prices. Every price here is a mapped (external) price.
///
/// ## Implementations
/// - `PriceBook`: two radix-15 tier forests behind a price mapping
/// - `SharedPriceBook`: the same book behind a read/write lock
///
/// ## Example
/// ```rust
/// use price_index::domain::orderbook::{BookConfig, PriceBook, PriceLevelIndex};
/// use price_index::domain::price_index::Side;
///
/// let mut book = PriceBook::new(BookConfig::new(3_000_000, 2)).unwrap();
/// book.insert_level(Side::Bid, 3_000_150).unwrap();
/// book.insert_level(Side::Ask, 3_000_200).unwrap();
///
/// assert_eq!(book.best_bid(), Some(3_000_150));
/// assert_eq!(book.spread(), Some(50));
/// assert!(book.crosses_book(Side::Bid, 3_000_200));
/// ```
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::domain::error::PriceIndexError;
use crate::domain::price_index::{Direction, Side};

/// Mapped prices collected by a depth walk
pub type MappedLevels = SmallVec<[u64; 16]>;

/// Extremes and level counts of both sides, in mapped prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookSummary {
    pub max_bid: Option<u64>,
    pub min_bid: Option<u64>,
    pub max_ask: Option<u64>,
    pub min_ask: Option<u64>,
    pub bid_levels: u32,
    pub ask_levels: u32,
}

/// Core price-level index trait
pub trait PriceLevelIndex {
    /// Activates a price level on `side`
    ///
    /// Called when the level's order count goes from zero to non-zero.
    /// `Ok(false)` if the level was already active.
    fn insert_level(&mut self, side: Side, price: u64) -> Result<bool, PriceIndexError>;

    /// Deactivates a price level on `side`
    ///
    /// Called when the level's last order leaves. `Ok(false)` if the level
    /// was not active.
    fn remove_level(&mut self, side: Side, price: u64) -> Result<bool, PriceIndexError>;

    /// Highest active price on `side`
    fn highest(&self, side: Side) -> Option<u64>;

    /// Lowest active price on `side`
    fn lowest(&self, side: Side) -> Option<u64>;

    /// Nearest active price on `side` at or beyond `price` in `direction`
    fn nearest_price(
        &self,
        side: Side,
        price: u64,
        direction: Direction,
    ) -> Result<Option<u64>, PriceIndexError>;

    /// Number of active levels on `side`
    fn active_levels(&self, side: Side) -> u32;

    /// Up to `limit` active prices from the best price away from the spread
    /// (bids descending, asks ascending)
    fn levels(&self, side: Side, limit: usize) -> MappedLevels;

    /// Whether an incoming order on `side` at `price` would trade against
    /// the opposite side
    ///
    /// Equality crosses. Never crosses an empty opposite side.
    fn crosses_book(&self, side: Side, price: u64) -> bool {
        match side {
            Side::Bid => self.lowest(Side::Ask).is_some_and(|ask| price >= ask),
            Side::Ask => self.highest(Side::Bid).is_some_and(|bid| price <= bid),
        }
    }

    /// Best price of `side`: highest bid or lowest ask
    fn best(&self, side: Side) -> Option<u64> {
        match side {
            Side::Bid => self.highest(Side::Bid),
            Side::Ask => self.lowest(Side::Ask),
        }
    }

    fn best_bid(&self) -> Option<u64> {
        self.best(Side::Bid)
    }

    fn best_ask(&self) -> Option<u64> {
        self.best(Side::Ask)
    }

    /// Gets the current spread (best_ask - best_bid)
    ///
    /// `None` if either side is empty or the book is crossed/locked.
    fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    /// Gets the midpoint price ((best_bid + best_ask) / 2)
    fn mid_price(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(bid / 2 + ask / 2 + (bid % 2 + ask % 2) / 2),
            _ => None,
        }
    }

    fn summary(&self) -> BookSummary {
        BookSummary {
            max_bid: self.highest(Side::Bid),
            min_bid: self.lowest(Side::Bid),
            max_ask: self.highest(Side::Ask),
            min_ask: self.lowest(Side::Ask),
            bid_levels: self.active_levels(Side::Bid),
            ask_levels: self.active_levels(Side::Ask),
        }
    }
}
