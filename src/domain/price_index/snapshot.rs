/// Flat-word persistence of one side
///
/// A side is stored as its three tiers of packed units plus the two cached
/// extrema, with `NULL_PRICE` standing in for an absent extremum. Restoring
/// trusts nothing: unit counts, every unit's propagation invariant, the
/// cross-tier links and both extrema are checked before a `SideIndex` is
/// handed back.
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::codec::{EncodedPrice, Price, BOTTOM_UNITS, MAX_PRICE, MIDDLE_UNITS};
use super::compound_bucket::{CompoundBucket, PackedBucket};
use super::forest::TierForest;
use super::side::SideIndex;
use super::{Direction, Side};
use crate::domain::error::PriceIndexError;

/// Stored in place of an absent extremum, 2^32 - 2
pub const NULL_PRICE: u32 = u32::MAX - 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct SideSnapshot {
    pub top: PackedBucket,
    pub middle: Vec<PackedBucket>,
    pub bottom: Vec<PackedBucket>,
    pub highest: u32,
    pub lowest: u32,
}

impl SideIndex {
    /// Captures the side as flat words
    pub fn snapshot(&self) -> SideSnapshot {
        let forest = self.forest();
        SideSnapshot {
            top: forest.top().pack(),
            middle: forest.middle_units().iter().map(CompoundBucket::pack).collect(),
            bottom: forest.bottom_units().iter().map(CompoundBucket::pack).collect(),
            highest: self.highest().unwrap_or(NULL_PRICE),
            lowest: self.lowest().unwrap_or(NULL_PRICE),
        }
    }

    /// Rebuilds a side from a snapshot, rejecting anything inconsistent
    pub fn restore(side: Side, snapshot: &SideSnapshot) -> Result<Self, PriceIndexError> {
        if snapshot.middle.len() != MIDDLE_UNITS || snapshot.bottom.len() != BOTTOM_UNITS {
            return Err(PriceIndexError::CorruptSnapshot(format!(
                "expected {}/{} middle/bottom units, found {}/{}",
                MIDDLE_UNITS,
                BOTTOM_UNITS,
                snapshot.middle.len(),
                snapshot.bottom.len()
            )));
        }

        let top = unpack_unit(&snapshot.top, "top", 0)?;
        let middle = unpack_tier(&snapshot.middle, "middle")?;
        let bottom = unpack_tier(&snapshot.bottom, "bottom")?;

        let forest = TierForest::from_units(top, middle, bottom);
        forest.validate().map_err(PriceIndexError::CorruptSnapshot)?;

        let highest = extremum(snapshot.highest, "highest")?;
        let lowest = extremum(snapshot.lowest, "lowest")?;
        let expected_highest = forest.nearest(EncodedPrice::encode(MAX_PRICE)?, Direction::Below);
        let expected_lowest = forest.nearest(EncodedPrice::encode(0)?, Direction::Above);
        if highest != expected_highest || lowest != expected_lowest {
            return Err(PriceIndexError::CorruptSnapshot(format!(
                "cached extrema {:?}/{:?} disagree with forest {:?}/{:?}",
                highest, lowest, expected_highest, expected_lowest
            )));
        }

        Ok(SideIndex::from_parts(side, forest, highest, lowest))
    }
}

fn unpack_unit(
    words: &PackedBucket,
    tier: &str,
    index: usize,
) -> Result<CompoundBucket, PriceIndexError> {
    CompoundBucket::unpack(words).ok_or_else(|| {
        PriceIndexError::CorruptSnapshot(format!(
            "{} unit {} has bits past the 240-bit layout",
            tier, index
        ))
    })
}

fn unpack_tier(words: &[PackedBucket], tier: &str) -> Result<Vec<CompoundBucket>, PriceIndexError> {
    words
        .iter()
        .enumerate()
        .map(|(index, unit)| unpack_unit(unit, tier, index))
        .collect()
}

fn extremum(raw: u32, name: &str) -> Result<Option<Price>, PriceIndexError> {
    match raw {
        NULL_PRICE => Ok(None),
        price if price <= MAX_PRICE => Ok(Some(price)),
        other => Err(PriceIndexError::CorruptSnapshot(format!(
            "{} price {} outside the index domain",
            name, other
        ))),
    }
}
