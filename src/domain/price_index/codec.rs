/// Radix-15 one-hot codec ("binary coded base 15")
///
/// A price in `[0, MAX_PRICE]` is six base-15 digits `d5 d4 d3 d2 d1 d0`.
/// Each digit is stored one-hot in its own 16-bit lane of a `u128`:
///
/// ```text
/// bit:   95..80  79..64  63..48  47..32  31..16  15..0
/// lane:    d5      d4      d3      d2      d1      d0
/// ```
///
/// Only the low 15 bits of a lane can be set. Tier addressing reads digits
/// straight out of the lanes with one bit-scan each.
use crate::domain::error::PriceIndexError;

/// Unmapped price as stored in the index
pub type Price = u32;

/// Digit radix
pub const RADIX: u32 = 15;

/// Digits per price
pub const DIGIT_COUNT: usize = 6;

/// Largest representable price, 15^6 - 1
pub const MAX_PRICE: Price = 11_390_624;

/// Bit width of one digit lane
pub const LANE_WIDTH: u32 = 16;

/// Middle-tier units (15^2)
pub const MIDDLE_UNITS: usize = 225;

/// Bottom-tier units (15^4)
pub const BOTTOM_UNITS: usize = 50_625;

const LANE_MASK: u128 = 0xFFFF;
const DIGIT_MASK: u16 = 0x7FFF;
const USED_BITS_MASK: u128 = (1u128 << (LANE_WIDTH as usize * DIGIT_COUNT)) - 1;

/// Digits of a price, least significant first (`digits[i]` is `d_i`)
pub type Digits = [u8; DIGIT_COUNT];

/// Addressing keys for the middle and bottom tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotIndices {
    /// `15·d5 + d4`, in `[0, 224]`
    pub middle: u16,
    /// `225·middle + 15·d3 + d2`, in `[0, 50624]`
    pub bottom: u16,
}

/// A price in one-hot-per-digit form
///
/// Values only come from [`EncodedPrice::encode`] or the validating
/// [`EncodedPrice::from_raw`], so every lane is exactly one-hot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedPrice(u128);

impl EncodedPrice {
    /// Encodes a price, rejecting anything above `MAX_PRICE`
    pub fn encode(price: Price) -> Result<Self, PriceIndexError> {
        if price > MAX_PRICE {
            return Err(PriceIndexError::OutOfDomainPrice {
                price: price as u64,
                min: 0,
                max: MAX_PRICE as u64,
            });
        }

        let mut remaining = price;
        let mut raw = 0u128;
        for lane in 0..DIGIT_COUNT {
            let digit = remaining % RADIX;
            remaining /= RADIX;
            raw |= (1u128 << digit) << (lane as u32 * LANE_WIDTH);
        }
        Ok(Self(raw))
    }

    /// Encodes already-split digits (least significant first)
    ///
    /// `None` if any digit is outside `[0, 14]`.
    pub fn from_digits(digits: Digits) -> Option<Self> {
        let mut raw = 0u128;
        for (lane, &digit) in digits.iter().enumerate() {
            if digit as u32 >= RADIX {
                return None;
            }
            raw |= (1u128 << digit) << (lane as u32 * LANE_WIDTH);
        }
        Some(Self(raw))
    }

    /// Accepts a raw word only if it is a valid encoding
    pub fn from_raw(raw: u128) -> Option<Self> {
        if raw & !USED_BITS_MASK != 0 {
            return None;
        }
        for lane in 0..DIGIT_COUNT {
            let bits = ((raw >> (lane as u32 * LANE_WIDTH)) & LANE_MASK) as u16;
            if bits.count_ones() != 1 || bits & !DIGIT_MASK != 0 {
                return None;
            }
        }
        Some(Self(raw))
    }

    /// The packed word
    #[inline]
    pub fn raw(self) -> u128 {
        self.0
    }

    /// The one-hot lane holding digit `i`
    #[inline]
    pub fn lane(self, i: usize) -> u16 {
        debug_assert!(i < DIGIT_COUNT, "lane out of range");
        ((self.0 >> (i as u32 * LANE_WIDTH)) & LANE_MASK) as u16
    }

    /// Digit `d_i`
    #[inline]
    pub fn digit(self, i: usize) -> u8 {
        self.lane(i).trailing_zeros() as u8
    }

    /// All six digits, least significant first
    #[inline]
    pub fn digits(self) -> Digits {
        let mut digits = [0u8; DIGIT_COUNT];
        for (i, digit) in digits.iter_mut().enumerate() {
            *digit = self.digit(i);
        }
        digits
    }

    /// Recovers the price
    #[inline]
    pub fn decode(self) -> Price {
        price_from_digits(self.digits())
    }

    /// `15·d5 + d4`
    #[inline]
    pub fn middle_index(self) -> u16 {
        (self.digit(5) as u16) * RADIX as u16 + self.digit(4) as u16
    }

    /// `225·middle + 15·d3 + d2`
    #[inline]
    pub fn bottom_index(self, middle: u16) -> u16 {
        let bottom = (middle as u32) * RADIX * RADIX
            + (self.digit(3) as u32) * RADIX
            + self.digit(2) as u32;
        bottom as u16
    }

    /// Both addressing keys
    #[inline]
    pub fn slot_indices(self) -> SlotIndices {
        let middle = self.middle_index();
        SlotIndices {
            middle,
            bottom: self.bottom_index(middle),
        }
    }
}

/// Recombines digits (least significant first) into a price
#[inline]
pub fn price_from_digits(digits: Digits) -> Price {
    digits
        .iter()
        .rev()
        .fold(0u32, |acc, &digit| acc * RADIX + digit as u32)
}

/// Rebuilds a price from its tier addresses and bottom digit pair
///
/// Inverse of `slot_indices` + `(d1, d0)`.
#[inline]
pub fn price_from_slots(bottom: u16, d1: u8, d0: u8) -> Price {
    (bottom as u32) * RADIX * RADIX + (d1 as u32) * RADIX + d0 as u32
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arb_price() -> impl Strategy<Value = Price> {
        0..=MAX_PRICE
    }

    proptest! {
        #[test]
        fn prop_encode_decode_identity(price in arb_price()) {
            let encoded = EncodedPrice::encode(price).unwrap();
            prop_assert_eq!(encoded.decode(), price);
            prop_assert_eq!(encoded.raw().count_ones(), DIGIT_COUNT as u32);
            prop_assert_eq!(EncodedPrice::from_raw(encoded.raw()), Some(encoded));
            prop_assert_eq!(EncodedPrice::from_digits(encoded.digits()), Some(encoded));
        }

        #[test]
        fn prop_slots_reconstruct_price(price in arb_price()) {
            let encoded = EncodedPrice::encode(price).unwrap();
            let slots = encoded.slot_indices();
            prop_assert!((slots.middle as usize) < MIDDLE_UNITS);
            prop_assert!((slots.bottom as usize) < BOTTOM_UNITS);
            prop_assert_eq!(slots.middle as u32, price / 15u32.pow(4));
            prop_assert_eq!(slots.bottom as u32, price / 15u32.pow(2));
            prop_assert_eq!(
                price_from_slots(slots.bottom, encoded.digit(1), encoded.digit(0)),
                price
            );
        }

        #[test]
        fn prop_encode_rejects_beyond_max(price in (MAX_PRICE + 1)..=u32::MAX) {
            prop_assert!(EncodedPrice::encode(price).unwrap_err().is_out_of_domain());
        }
    }
}
