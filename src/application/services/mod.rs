/// Application Services
///
/// Services drive the domain index from commands and record metrics.

pub mod index_service;

pub use index_service::{IndexCommand, IndexOutput, PriceIndexService};
