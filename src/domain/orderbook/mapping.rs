/// Book configuration and price mapping
///
/// External ("mapped") prices are fixed-point integers with `decimal_scale`
/// fractional digits. The index stores `mapped - base_price`, so a book
/// covers the closed range `[base_price, base_price + MAX_PRICE]`.
use std::fs;
use std::path::Path;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, PriceIndexError};
use crate::domain::price_index::{Price, MAX_PRICE};

/// Largest supported number of fractional digits
pub const MAX_DECIMAL_SCALE: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct BookConfig {
    /// Mapped price stored at internal price 0
    #[serde(default)]
    pub base_price: u64,
    /// Fixed-point digits of the external price unit
    #[serde(default)]
    pub decimal_scale: u8,
}

impl BookConfig {
    pub fn new(base_price: u64, decimal_scale: u8) -> Self {
        Self {
            base_price,
            decimal_scale,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_price.checked_add(MAX_PRICE as u64).is_none() {
            return Err(ConfigError::Invalid(format!(
                "base_price {} leaves no room for the index domain",
                self.base_price
            )));
        }
        if self.decimal_scale > MAX_DECIMAL_SCALE {
            return Err(ConfigError::Invalid(format!(
                "decimal_scale {} exceeds {}",
                self.decimal_scale, MAX_DECIMAL_SCALE
            )));
        }
        Ok(())
    }

    /// Loads and validates a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: BookConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn min_price(&self) -> u64 {
        self.base_price
    }

    /// Largest mapped price, saturating for unvalidated configs
    #[inline]
    pub fn max_price(&self) -> u64 {
        self.base_price.saturating_add(MAX_PRICE as u64)
    }

    /// Mapped → internal, rejecting prices outside the book's range
    #[inline]
    pub fn to_internal(&self, mapped: u64) -> Result<Price, PriceIndexError> {
        if mapped < self.min_price() || mapped > self.max_price() {
            return Err(PriceIndexError::OutOfDomainPrice {
                price: mapped,
                min: self.min_price(),
                max: self.max_price(),
            });
        }
        Ok((mapped - self.base_price) as Price)
    }

    /// Internal → mapped
    #[inline]
    pub fn to_external(&self, internal: Price) -> u64 {
        self.base_price + internal as u64
    }

    /// Renders a mapped price with `decimal_scale` fractional digits
    pub fn format_price(&self, mapped: u64) -> String {
        let unit = match 10u64.checked_pow(self.decimal_scale as u32) {
            Some(unit) if unit > 1 => unit,
            _ => return mapped.to_string(),
        };
        format!(
            "{}.{:0width$}",
            mapped / unit,
            mapped % unit,
            width = self.decimal_scale as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mapped() -> BookConfig {
        // 30000.00 with two decimals
        BookConfig::new(30_000 * 10u64.pow(2), 2)
    }

    #[test]
    fn test_to_internal_bounds() {
        let config = mapped();
        assert_eq!(config.to_internal(3_000_000).unwrap(), 0);
        assert_eq!(config.to_internal(14_390_624).unwrap(), MAX_PRICE);
        assert_eq!(config.to_internal(3_000_123).unwrap(), 123);

        let err = config.to_internal(0).unwrap_err();
        assert_eq!(err.to_string(), "OutOfDomainPrice(0, 3000000, 14390624)");
        assert!(config.to_internal(14_390_625).is_err());
        assert!(config.to_internal(2_999_999).is_err());
    }

    #[test]
    fn test_to_external_inverts_to_internal() {
        let config = mapped();
        for internal in [0, 1, 224, 50_625, MAX_PRICE] {
            let external = config.to_external(internal);
            assert_eq!(config.to_internal(external).unwrap(), internal);
        }
    }

    #[test]
    fn test_format_price() {
        let config = mapped();
        assert_eq!(config.format_price(3_000_000), "30000.00");
        assert_eq!(config.format_price(3_000_105), "30001.05");
        assert_eq!(BookConfig::default().format_price(42), "42");
        assert_eq!(BookConfig::new(0, 4).format_price(7), "0.0007");
    }

    #[test]
    fn test_validate() {
        assert!(mapped().validate().is_ok());
        assert!(BookConfig::new(u64::MAX, 0).validate().is_err());
        assert!(BookConfig::new(0, 19).validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.json");

        fs::write(&path, r#"{"base_price": 3000000, "decimal_scale": 2}"#).unwrap();
        let config = BookConfig::from_json_file(&path).unwrap();
        assert_eq!(config, mapped());

        fs::write(&path, r#"{"decimal_scale": 40}"#).unwrap();
        assert!(matches!(
            BookConfig::from_json_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(BookConfig::from_json_file(&path), Err(ConfigError::Json(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(BookConfig::from_json_file(&missing), Err(ConfigError::Io(_))));
    }
}
