/// Compound bucket - one tier unit of the price index
///
/// A unit covers two radix-15 digit levels in one fixed-size value:
/// - `group`: 15-bit bitmap, bit `g` set ⇔ child bitmap `g` is non-zero
/// - `children[g]`: 15-bit bitmap, bit `c` set ⇔ slot `(g, c)` is active
///
/// Every mutation keeps the propagation invariant
/// (`group` bit `g` ⇔ `children[g] != 0`) before returning, so a unit is
/// empty exactly when `group == 0`.
///
/// Packed form (`pack`/`unpack`) is the 240-bit layout used for snapshots:
/// group bits at 0..14, child `g` at `15 + 15·g`, stored little-endian in
/// four `u64` words.
use super::Direction;
use crate::shared::collections::bit_bucket::{
    is_set, largest_set_bit, nearest_set_bit_above, nearest_set_bit_below, smallest_set_bit,
    BUCKET_MASK, BUCKET_WIDTH,
};

/// Groups (and children per group) in one unit
pub const FAN_OUT: usize = BUCKET_WIDTH as usize;

/// Packed unit size in `u64` words
pub const PACKED_WORDS: usize = 4;

/// Packed unit, 240 significant bits
pub type PackedBucket = [u64; PACKED_WORDS];

const PACKED_BITS: usize = BUCKET_WIDTH as usize * (FAN_OUT + 1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompoundBucket {
    group: u16,
    children: [u16; FAN_OUT],
}

impl CompoundBucket {
    /// A unit with no active slot
    pub const EMPTY: CompoundBucket = CompoundBucket {
        group: 0,
        children: [0; FAN_OUT],
    };

    #[inline]
    pub fn group_bits(&self) -> u16 {
        self.group
    }

    #[inline]
    pub fn child(&self, group: u8) -> u16 {
        self.children[group as usize]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.group == 0
    }

    #[inline]
    pub fn contains(&self, group: u8, child: u8) -> bool {
        (group as usize) < FAN_OUT && is_set(self.children[group as usize], child)
    }

    /// Number of active slots
    pub fn count(&self) -> u32 {
        self.children.iter().map(|c| c.count_ones()).sum()
    }

    /// Marks `(group, child)` active
    ///
    /// Returns `true` if the unit was empty before the call, i.e. the tier
    /// above must now mark this unit present.
    #[inline]
    pub fn insert(&mut self, group: u8, child: u8) -> bool {
        debug_assert!((group as usize) < FAN_OUT && child < BUCKET_WIDTH);
        let was_empty = self.group == 0;
        self.children[group as usize] |= 1 << child;
        self.group |= 1 << group;
        was_empty
    }

    /// Marks `(group, child)` inactive
    ///
    /// Returns `true` if this emptied a previously non-empty unit, i.e. the
    /// tier above must now mark this unit absent.
    #[inline]
    pub fn remove(&mut self, group: u8, child: u8) -> bool {
        debug_assert!((group as usize) < FAN_OUT && child < BUCKET_WIDTH);
        if self.group == 0 {
            return false;
        }
        let slot = &mut self.children[group as usize];
        *slot &= !(1 << child);
        if *slot == 0 {
            self.group &= !(1 << group);
        }
        self.group == 0
    }

    /// Smallest active slot
    #[inline]
    pub fn first(&self) -> Option<(u8, u8)> {
        let group = smallest_set_bit(self.group)?;
        let child = smallest_set_bit(self.child(group))?;
        Some((group, child))
    }

    /// Largest active slot
    #[inline]
    pub fn last(&self) -> Option<(u8, u8)> {
        let group = largest_set_bit(self.group)?;
        let child = largest_set_bit(self.child(group))?;
        Some((group, child))
    }

    /// Extreme slot in a direction: smallest for `Above`, largest for `Below`
    #[inline]
    pub fn extreme(&self, direction: Direction) -> Option<(u8, u8)> {
        match direction {
            Direction::Above => self.first(),
            Direction::Below => self.last(),
        }
    }

    /// Nearest active slot at or beyond `(group, child)` in `direction`
    #[inline]
    pub fn seek(&self, direction: Direction, group: u8, child: u8) -> Option<(u8, u8)> {
        if self.contains(group, child) {
            return Some((group, child));
        }
        self.seek_beyond(direction, group, child)
    }

    /// Nearest active slot strictly beyond `(group, child)` in `direction`
    ///
    /// Looks inside child `group` first, then jumps to the nearest live
    /// sibling group and takes its extreme child.
    pub fn seek_beyond(&self, direction: Direction, group: u8, child: u8) -> Option<(u8, u8)> {
        let siblings = self.child(group);
        match direction {
            Direction::Above => {
                if let Some(found) = nearest_set_bit_above(siblings, child) {
                    return Some((group, found));
                }
                let next = nearest_set_bit_above(self.group, group)?;
                Some((next, smallest_set_bit(self.child(next))?))
            }
            Direction::Below => {
                if let Some(found) = nearest_set_bit_below(siblings, child) {
                    return Some((group, found));
                }
                let next = nearest_set_bit_below(self.group, group)?;
                Some((next, largest_set_bit(self.child(next))?))
            }
        }
    }

    /// Whether group bit `g` is set iff child `g` is non-zero, with no stray
    /// bits above the bucket width
    pub fn invariant_holds(&self) -> bool {
        if self.group & !BUCKET_MASK != 0 {
            return false;
        }
        self.children.iter().enumerate().all(|(g, &bits)| {
            bits & !BUCKET_MASK == 0 && is_set(self.group, g as u8) == (bits != 0)
        })
    }

    /// Packs into the 240-bit snapshot layout
    pub fn pack(&self) -> PackedBucket {
        let mut words = [0u64; PACKED_WORDS];
        put_field(&mut words, 0, self.group);
        for (g, &bits) in self.children.iter().enumerate() {
            put_field(&mut words, child_offset(g), bits);
        }
        words
    }

    /// Unpacks a snapshot word
    ///
    /// `None` if bits beyond the 240-bit layout are set. The propagation
    /// invariant is not checked here; see [`CompoundBucket::invariant_holds`].
    pub fn unpack(words: &PackedBucket) -> Option<Self> {
        if words[PACKED_WORDS - 1] >> (PACKED_BITS - 64 * (PACKED_WORDS - 1)) != 0 {
            return None;
        }
        let mut bucket = CompoundBucket {
            group: take_field(words, 0),
            children: [0; FAN_OUT],
        };
        for (g, bits) in bucket.children.iter_mut().enumerate() {
            *bits = take_field(words, child_offset(g));
        }
        Some(bucket)
    }
}

#[inline]
fn child_offset(group: usize) -> usize {
    BUCKET_WIDTH as usize * (group + 1)
}

fn put_field(words: &mut PackedBucket, offset: usize, bits: u16) {
    let (word, shift) = (offset / 64, offset % 64);
    let bits = (bits & BUCKET_MASK) as u64;
    words[word] |= bits << shift;
    if shift + BUCKET_WIDTH as usize > 64 {
        words[word + 1] |= bits >> (64 - shift);
    }
}

fn take_field(words: &PackedBucket, offset: usize) -> u16 {
    let (word, shift) = (offset / 64, offset % 64);
    let mut bits = words[word] >> shift;
    if shift + BUCKET_WIDTH as usize > 64 {
        bits |= words[word + 1] << (64 - shift);
    }
    (bits as u16) & BUCKET_MASK
}
