/// Three-tier compound bitmap forest
///
/// Storage for one side of a book: 1 top unit, 225 middle units and 50625
/// bottom units, all allocated zeroed up front. Emptiness is a bit state,
/// never an allocation event, so units stay in place once emptied.
///
/// ## Propagation
/// A price maps to exactly one slot per tier. Setting the bottom slot only
/// has to reach the tier above when the bottom unit goes from empty to
/// non-empty, and likewise for clearing. Both mutations walk the fixed
/// three-step path bottom → middle → top and stop at the first unit whose
/// emptiness did not change.
///
/// ## Search
/// `nearest` climbs at most three tiers looking for a live slot at or beyond
/// the target, then descends through the vacated tiers taking the extreme
/// slot in the search direction at each one.
use std::fmt;

use tracing::trace;

use super::codec::{price_from_slots, EncodedPrice, Price, BOTTOM_UNITS, MIDDLE_UNITS, RADIX};
use super::compound_bucket::{CompoundBucket, FAN_OUT};
use super::Direction;

/// Physical storage level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Top,
    Middle,
    Bottom,
}

/// The unit and digit pair one tier holds for a price
#[derive(Debug, Clone, Copy)]
struct PathStep {
    tier: Tier,
    unit: usize,
    group: u8,
    child: u8,
}

/// Copies of the three units addressed by one price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSlots {
    pub top: CompoundBucket,
    pub middle: CompoundBucket,
    pub bottom: CompoundBucket,
}

#[derive(Clone)]
pub struct TierForest {
    top: CompoundBucket,
    middle: Box<[CompoundBucket]>,
    bottom: Box<[CompoundBucket]>,
}

impl TierForest {
    /// Creates an empty forest
    pub fn new() -> Self {
        Self {
            top: CompoundBucket::EMPTY,
            middle: vec![CompoundBucket::EMPTY; MIDDLE_UNITS].into_boxed_slice(),
            bottom: vec![CompoundBucket::EMPTY; BOTTOM_UNITS].into_boxed_slice(),
        }
    }

    /// Builds a forest from raw units without checking them
    ///
    /// Callers validate with [`TierForest::validate`] before use.
    pub(crate) fn from_units(
        top: CompoundBucket,
        middle: Vec<CompoundBucket>,
        bottom: Vec<CompoundBucket>,
    ) -> Self {
        Self {
            top,
            middle: middle.into_boxed_slice(),
            bottom: bottom.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn top(&self) -> &CompoundBucket {
        &self.top
    }

    #[inline]
    pub fn middle_units(&self) -> &[CompoundBucket] {
        &self.middle
    }

    #[inline]
    pub fn bottom_units(&self) -> &[CompoundBucket] {
        &self.bottom
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }

    /// Number of active prices (bottom-tier population count)
    pub fn active_count(&self) -> u32 {
        self.bottom.iter().map(CompoundBucket::count).sum()
    }

    /// Bottom-to-top path of a price
    #[inline]
    fn path(price: EncodedPrice) -> [PathStep; 3] {
        let d = price.digits();
        let slots = price.slot_indices();
        [
            PathStep { tier: Tier::Bottom, unit: slots.bottom as usize, group: d[1], child: d[0] },
            PathStep { tier: Tier::Middle, unit: slots.middle as usize, group: d[3], child: d[2] },
            PathStep { tier: Tier::Top, unit: 0, group: d[5], child: d[4] },
        ]
    }

    #[inline]
    fn unit_mut(&mut self, tier: Tier, unit: usize) -> &mut CompoundBucket {
        match tier {
            Tier::Top => &mut self.top,
            Tier::Middle => &mut self.middle[unit],
            Tier::Bottom => &mut self.bottom[unit],
        }
    }

    /// Whether a price is active
    #[inline]
    pub fn contains(&self, price: EncodedPrice) -> bool {
        let bottom = price.slot_indices().bottom as usize;
        self.bottom[bottom].contains(price.digit(1), price.digit(0))
    }

    /// Activates a price; `false` if it was already active
    pub fn insert(&mut self, price: EncodedPrice) -> bool {
        if self.contains(price) {
            return false;
        }
        for step in Self::path(price) {
            // the tier above only changes when this unit was empty
            if !self.unit_mut(step.tier, step.unit).insert(step.group, step.child) {
                break;
            }
        }
        true
    }

    /// Deactivates a price; `false` if it was not active
    pub fn remove(&mut self, price: EncodedPrice) -> bool {
        if !self.contains(price) {
            return false;
        }
        for step in Self::path(price) {
            // the tier above only changes when this unit just emptied
            if !self.unit_mut(step.tier, step.unit).remove(step.group, step.child) {
                break;
            }
        }
        true
    }

    /// Nearest active price at or beyond `price` in `direction`
    pub fn nearest(&self, price: EncodedPrice, direction: Direction) -> Option<Price> {
        let d = price.digits();
        let slots = price.slot_indices();
        let (middle, bottom) = (slots.middle as usize, slots.bottom as usize);

        // bottom tier: same (d5..d2) group, target slot included
        if let Some((d1, d0)) = self.bottom[bottom].seek(direction, d[1], d[0]) {
            let found = price_from_slots(bottom as u16, d1, d0);
            trace!(target_price = price.decode(), found, tier = "bottom", "nearest price");
            return Some(found);
        }

        // middle tier: sibling bottom units under the same (d5, d4)
        if let Some((d3, d2)) = self.middle[middle].seek_beyond(direction, d[3], d[2]) {
            let found = self.descend_bottom(bottom_index(middle, d3, d2), direction);
            trace!(target_price = price.decode(), ?found, tier = "middle", "nearest price");
            return found;
        }

        // top tier: sibling middle units
        let found = self
            .top
            .seek_beyond(direction, d[5], d[4])
            .and_then(|(d5, d4)| self.descend_middle(middle_index(d5, d4), direction));
        trace!(target_price = price.decode(), ?found, tier = "top", "nearest price");
        found
    }

    fn descend_middle(&self, middle: usize, direction: Direction) -> Option<Price> {
        let (d3, d2) = self.middle[middle].extreme(direction)?;
        self.descend_bottom(bottom_index(middle, d3, d2), direction)
    }

    fn descend_bottom(&self, bottom: usize, direction: Direction) -> Option<Price> {
        let (d1, d0) = self.bottom[bottom].extreme(direction)?;
        Some(price_from_slots(bottom as u16, d1, d0))
    }

    /// Copies of the units addressed by `price`
    pub fn slots(&self, price: EncodedPrice) -> PriceSlots {
        let slots = price.slot_indices();
        PriceSlots {
            top: self.top,
            middle: self.middle[slots.middle as usize],
            bottom: self.bottom[slots.bottom as usize],
        }
    }

    /// Checks unit counts, every unit's propagation invariant, and that each
    /// upper-tier slot is set iff the unit it stands for is non-empty
    pub fn validate(&self) -> Result<(), String> {
        if self.middle.len() != MIDDLE_UNITS {
            return Err(format!("expected {} middle units, found {}", MIDDLE_UNITS, self.middle.len()));
        }
        if self.bottom.len() != BOTTOM_UNITS {
            return Err(format!("expected {} bottom units, found {}", BOTTOM_UNITS, self.bottom.len()));
        }

        if !self.top.invariant_holds() {
            return Err("top unit violates propagation invariant".to_string());
        }
        for (tier, units) in [(Tier::Middle, &self.middle), (Tier::Bottom, &self.bottom)] {
            if let Some(index) = units.iter().position(|unit| !unit.invariant_holds()) {
                return Err(format!("{:?} unit {} violates propagation invariant", tier, index));
            }
        }

        for (index, unit) in self.middle.iter().enumerate() {
            let (group, child) = split_index(index);
            if self.top.contains(group, child) == unit.is_empty() {
                return Err(format!("top slot ({}, {}) disagrees with middle unit {}", group, child, index));
            }
        }
        for (index, unit) in self.bottom.iter().enumerate() {
            let middle = index / FAN_OUT.pow(2);
            let (group, child) = split_index(index % FAN_OUT.pow(2));
            if self.middle[middle].contains(group, child) == unit.is_empty() {
                return Err(format!(
                    "middle unit {} slot ({}, {}) disagrees with bottom unit {}",
                    middle, group, child, index
                ));
            }
        }
        Ok(())
    }
}

impl Default for TierForest {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TierForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TierForest")
            .field("top", &self.top)
            .field("active", &self.active_count())
            .finish()
    }
}

#[inline]
fn middle_index(d5: u8, d4: u8) -> usize {
    d5 as usize * RADIX as usize + d4 as usize
}

#[inline]
fn bottom_index(middle: usize, d3: u8, d2: u8) -> usize {
    middle * (RADIX * RADIX) as usize + d3 as usize * RADIX as usize + d2 as usize
}

#[inline]
fn split_index(index: usize) -> (u8, u8) {
    ((index / FAN_OUT) as u8, (index % FAN_OUT) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_index::codec::MAX_PRICE;

    fn enc(price: Price) -> EncodedPrice {
        EncodedPrice::encode(price).unwrap()
    }

    fn unit(slots: &[(u8, u8)]) -> CompoundBucket {
        let mut bucket = CompoundBucket::EMPTY;
        for &(g, c) in slots {
            bucket.insert(g, c);
        }
        bucket
    }

    #[test]
    fn test_insert_single_price_sets_all_tiers() {
        let mut forest = TierForest::new();
        assert!(forest.insert(enc(7)));

        let slots = forest.slots(enc(7));
        assert_eq!(slots.top, unit(&[(0, 0)]));
        assert_eq!(slots.middle, unit(&[(0, 0)]));
        assert_eq!(slots.bottom, unit(&[(0, 7)]));
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_insert_price_15_and_210() {
        let mut forest = TierForest::new();
        forest.insert(enc(15));
        assert_eq!(forest.slots(enc(15)).bottom, unit(&[(1, 0)]));

        forest.insert(enc(210));
        assert_eq!(forest.slots(enc(210)).bottom, unit(&[(1, 0), (14, 0)]));
        assert_eq!(forest.slots(enc(210)).middle, unit(&[(0, 0)]));
    }

    #[test]
    fn test_insert_max_price() {
        let mut forest = TierForest::new();
        forest.insert(enc(MAX_PRICE));
        let slots = forest.slots(enc(MAX_PRICE));
        assert_eq!(slots.top, unit(&[(14, 14)]));
        assert_eq!(slots.middle, unit(&[(14, 14)]));
        assert_eq!(slots.bottom, unit(&[(14, 14)]));
    }

    #[test]
    fn test_duplicate_insert_and_absent_remove_are_noops() {
        let mut forest = TierForest::new();
        assert!(forest.insert(enc(1000)));
        assert!(!forest.insert(enc(1000)));
        assert_eq!(forest.active_count(), 1);

        assert!(!forest.remove(enc(1001)));
        assert!(forest.contains(enc(1000)));
        assert!(forest.remove(enc(1000)));
        assert!(!forest.remove(enc(1000)));
        assert!(forest.is_empty());
    }

    #[test]
    fn test_remove_collapses_only_emptied_units() {
        let mut forest = TierForest::new();
        for price in [0, 4, 8, 12] {
            forest.insert(enc(price));
        }

        forest.remove(enc(0));
        assert_eq!(forest.slots(enc(0)).bottom, unit(&[(0, 4), (0, 8), (0, 12)]));
        forest.remove(enc(8));
        assert_eq!(forest.slots(enc(0)).bottom, unit(&[(0, 4), (0, 12)]));
        assert_eq!(forest.slots(enc(0)).top, unit(&[(0, 0)]));
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_insert_remove_restores_zero_state() {
        let mut forest = TierForest::new();
        let price = enc(9_912_767);
        forest.insert(price);
        forest.remove(price);

        let slots = forest.slots(price);
        assert_eq!(slots.top, CompoundBucket::EMPTY);
        assert_eq!(slots.middle, CompoundBucket::EMPTY);
        assert_eq!(slots.bottom, CompoundBucket::EMPTY);
        assert!(forest.middle_units().iter().all(CompoundBucket::is_empty));
        assert!(forest.bottom_units().iter().all(CompoundBucket::is_empty));
    }

    #[test]
    fn test_nearest_on_empty_forest() {
        let forest = TierForest::new();
        for price in [0, 1, MAX_PRICE / 2, MAX_PRICE] {
            assert_eq!(forest.nearest(enc(price), Direction::Above), None);
            assert_eq!(forest.nearest(enc(price), Direction::Below), None);
        }
    }

    #[test]
    fn test_nearest_crosses_every_tier() {
        let mut forest = TierForest::new();
        // different top slots: (0,0) and (14,14)
        forest.insert(enc(3));
        forest.insert(enc(MAX_PRICE - 3));

        assert_eq!(forest.nearest(enc(4), Direction::Above), Some(MAX_PRICE - 3));
        assert_eq!(forest.nearest(enc(MAX_PRICE - 4), Direction::Below), Some(3));
        assert_eq!(forest.nearest(enc(2), Direction::Below), None);
        assert_eq!(forest.nearest(enc(MAX_PRICE - 2), Direction::Above), None);
    }

    #[test]
    fn test_nearest_within_middle_unit() {
        let mut forest = TierForest::new();
        // same middle unit, different bottom units
        forest.insert(enc(230));
        forest.insert(enc(5_000));

        assert_eq!(forest.nearest(enc(231), Direction::Above), Some(5_000));
        assert_eq!(forest.nearest(enc(4_999), Direction::Below), Some(230));
        assert_eq!(forest.nearest(enc(5_000), Direction::Below), Some(5_000));
    }

    #[test]
    fn test_nearest_descends_to_extreme_slots() {
        let mut forest = TierForest::new();
        for price in [50_700, 50_701, 50_999, 60_000] {
            forest.insert(enc(price));
        }
        assert_eq!(forest.nearest(enc(10), Direction::Above), Some(50_700));
        assert_eq!(forest.nearest(enc(MAX_PRICE), Direction::Below), Some(60_000));
        assert_eq!(forest.nearest(enc(59_999), Direction::Below), Some(50_999));
        assert_eq!(forest.nearest(enc(50_702), Direction::Above), Some(50_999));
    }

    #[test]
    fn test_validate_detects_cross_tier_mismatch() {
        let mut middle = vec![CompoundBucket::EMPTY; MIDDLE_UNITS];
        middle[0] = unit(&[(0, 0)]);
        let forest = TierForest::from_units(
            CompoundBucket::EMPTY,
            middle,
            vec![CompoundBucket::EMPTY; BOTTOM_UNITS],
        );
        assert!(forest.validate().is_err());

        let short = TierForest::from_units(CompoundBucket::EMPTY, vec![], vec![]);
        assert!(short.validate().unwrap_err().contains("middle units"));
    }
}
