/// Domain Layer - Core Index Logic
///
/// Pure, synchronous code with no I/O: the radix-15 tier forest, the mapped
/// two-sided facade over it, and the error types both raise.
///
/// ## Modules
/// - `price_index`: codec, tier units, forest and per-side index
/// - `orderbook`: price mapping, `PriceLevelIndex` trait and `PriceBook`
/// - `error`: domain and configuration errors

pub mod error;
pub mod orderbook;
pub mod price_index;

// Re-export key types
pub use error::{ConfigError, PriceIndexError};
pub use orderbook::{BookConfig, PriceBook, PriceLevelIndex, SharedPriceBook};
pub use price_index::{Direction, Side, SideIndex, MAX_PRICE};
