/// 15-bit bucket scans - the leaf primitive of the price index
///
/// A bucket is the low 15 bits of a `u16`. Every tier of the index is built
/// from buckets, one bit per base-15 digit value, so every scan here is a
/// single mask plus one hardware bit-scan:
/// - smallest/above: `trailing_zeros` (BSF/TZCNT)
/// - largest/below: `leading_zeros` (BSR/LZCNT)
///
/// Bits above position 14 are never considered set.
///
/// Absence is `None`.

/// Number of usable bits in a bucket
pub const BUCKET_WIDTH: u8 = 15;

/// Mask of the usable bits
pub const BUCKET_MASK: u16 = (1 << BUCKET_WIDTH) - 1;

/// Highest valid bit index
pub const MAX_BIT_INDEX: u8 = BUCKET_WIDTH - 1;

/// Lowest set bit, or `None` if the bucket is empty
#[inline]
pub fn smallest_set_bit(bucket: u16) -> Option<u8> {
    let masked = bucket & BUCKET_MASK;
    if masked == 0 {
        return None;
    }
    Some(masked.trailing_zeros() as u8)
}

/// Highest set bit, or `None` if the bucket is empty
#[inline]
pub fn largest_set_bit(bucket: u16) -> Option<u8> {
    let masked = bucket & BUCKET_MASK;
    if masked == 0 {
        return None;
    }
    Some(15 - masked.leading_zeros() as u8)
}

/// Highest set bit strictly below `index`
///
/// `None` when `index == 0` or no lower bit is set. An `index` beyond the
/// bucket behaves like the bucket width (every usable bit is "below").
#[inline]
pub fn nearest_set_bit_below(bucket: u16, index: u8) -> Option<u8> {
    if index == 0 {
        return None;
    }
    let limit = index.min(BUCKET_WIDTH);
    let below = bucket & BUCKET_MASK & ((1u16 << limit) - 1);
    largest_set_bit(below)
}

/// Lowest set bit strictly above `index`
///
/// `None` when `index >= 14` or no higher bit is set.
#[inline]
pub fn nearest_set_bit_above(bucket: u16, index: u8) -> Option<u8> {
    if index >= MAX_BIT_INDEX {
        return None;
    }
    let above = bucket & BUCKET_MASK & !((1u16 << (index + 1)) - 1);
    smallest_set_bit(above)
}

/// Whether bit `index` is set
#[inline]
pub fn is_set(bucket: u16, index: u8) -> bool {
    index < BUCKET_WIDTH && bucket & (1u16 << index) != 0
}
