/// Price Index - three-tier radix-15 bitmap forest
///
/// Tracks which of the 15^6 discrete price levels hold resting liquidity on
/// one side of a book, and answers nearest/best price queries touching at
/// most three tier units on the way up and three on the way down.
///
/// ## Layout
/// ```text
/// top     1 unit       digits (d5, d4)
/// middle  225 units    index 15·d5 + d4           digits (d3, d2)
/// bottom  50625 units  index 225·middle + 15·d3 + d2  digits (d1, d0)
/// ```
/// Each unit is a [`CompoundBucket`]: a group bitmap plus 15 child bitmaps,
/// covering two digit levels per read.
///
/// ## Modules
/// - `codec`: one-hot radix-15 price encoding and slot addressing
/// - `compound_bucket`: the tier unit
/// - `forest`: insert/remove propagation and nearest-price search
/// - `side`: per-side index with cached extrema
/// - `snapshot`: flat-word persistence of a side
use serde::{Deserialize, Serialize};

pub mod codec;
pub mod compound_bucket;
pub mod forest;
pub mod side;
pub mod snapshot;

pub use codec::{EncodedPrice, Price, SlotIndices, MAX_PRICE};
pub use compound_bucket::CompoundBucket;
pub use forest::{PriceSlots, Tier, TierForest};
pub use side::SideIndex;
pub use snapshot::{SideSnapshot, NULL_PRICE};

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Direction that walks away from the spread
    ///
    /// Bids deepen downward, asks upward.
    #[inline]
    pub fn away_from_spread(self) -> Direction {
        match self {
            Side::Bid => Direction::Below,
            Side::Ask => Direction::Above,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

/// Search direction for nearest-price queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }
}
