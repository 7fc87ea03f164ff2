/// Domain Layer - Price Book Module
///
/// The facade a matching engine talks to: mapped prices in and out, bounds
/// checked at the edge, one tier forest per side underneath.
///
/// ## Trait Abstraction
/// `PriceLevelIndex` is the narrow interface (insert/remove level, extremes,
/// nearest price, crossing). `PriceBook` is the owned implementation and
/// `SharedPriceBook` puts it behind a lock.

pub mod book;
pub mod mapping;
pub mod shared;
pub mod traits;

pub use book::{BookSnapshot, PriceBook};
pub use mapping::BookConfig;
pub use shared::SharedPriceBook;
pub use traits::{BookSummary, MappedLevels, PriceLevelIndex};
