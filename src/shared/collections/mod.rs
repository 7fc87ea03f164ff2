/// Bit-level collections for the price index
///
/// - bit_bucket: O(1) bit scans over a 15-bit word (TZCNT/LZCNT)

pub mod bit_bucket;

pub use bit_bucket::{largest_set_bit, nearest_set_bit_above, nearest_set_bit_below, smallest_set_bit};
