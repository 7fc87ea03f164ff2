/// Application Layer - Services
///
/// Orchestrates the domain index for callers that speak in commands. Depends
/// on the domain layer only through the `PriceLevelIndex` trait.
///
/// ## Modules
/// - `services`: `PriceIndexService` and its command/output types

pub mod services;

// Re-export key services
pub use services::{IndexCommand, IndexOutput, PriceIndexService};
