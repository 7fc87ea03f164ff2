/// Price index error types.
///
/// Every error here is an immediate rejection: nothing is retried and no
/// forest state is touched before the check that raises it.
use thiserror::Error;

/// Errors raised by the price index and the order book facade
#[derive(Debug, Error)]
pub enum PriceIndexError {
    /// Price outside the closed range `[min, max]`.
    ///
    /// For raw index prices the range is `[0, MAX_PRICE]`; at the facade it is
    /// `[base_price, base_price + MAX_PRICE]`.
    #[error("OutOfDomainPrice({price}, {min}, {max})")]
    OutOfDomainPrice { price: u64, min: u64, max: u64 },

    /// A snapshot decoded cleanly but describes an impossible forest
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("snapshot encode error: {0}")]
    SnapshotEncode(#[from] bincode::error::EncodeError),

    #[error("snapshot decode error: {0}")]
    SnapshotDecode(#[from] bincode::error::DecodeError),
}

impl PriceIndexError {
    /// Whether this is a bounds rejection
    pub fn is_out_of_domain(&self) -> bool {
        matches!(self, PriceIndexError::OutOfDomainPrice { .. })
    }

    /// Which side of the domain a bounds rejection fell on
    pub fn rejection_reason(&self) -> Option<&'static str> {
        match self {
            PriceIndexError::OutOfDomainPrice { price, min, .. } if price < min => {
                Some("below_min")
            }
            PriceIndexError::OutOfDomainPrice { .. } => Some("above_max"),
            _ => None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_domain_display() {
        let err = PriceIndexError::OutOfDomainPrice {
            price: 0,
            min: 3_000_000,
            max: 14_390_624,
        };
        assert_eq!(err.to_string(), "OutOfDomainPrice(0, 3000000, 14390624)");
        assert!(err.is_out_of_domain());
    }

    #[test]
    fn test_rejection_reason() {
        let below = PriceIndexError::OutOfDomainPrice { price: 9, min: 10, max: 20 };
        let above = PriceIndexError::OutOfDomainPrice { price: 21, min: 10, max: 20 };
        assert_eq!(below.rejection_reason(), Some("below_min"));
        assert_eq!(above.rejection_reason(), Some("above_max"));
        assert_eq!(PriceIndexError::CorruptSnapshot(String::new()).rejection_reason(), None);
    }

    #[test]
    fn test_corrupt_snapshot_is_not_out_of_domain() {
        let err = PriceIndexError::CorruptSnapshot("bad top".to_string());
        assert!(!err.is_out_of_domain());
        assert_eq!(err.rejection_reason(), None);
        assert!(err.to_string().contains("bad top"));
    }
}
