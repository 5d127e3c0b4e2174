//! Error types for the liquidation engine.
//!
//! Errors fall into two groups. Item-scoped errors (a missing lookup, an
//! unavailable price, degenerate arithmetic) cause the current position or
//! vault to be skipped. Everything else, most importantly a failed balance
//! movement, aborts the batch that raised it.

use thiserror::Error;

/// Result type alias for liquidation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the liquidation engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Lookup Errors
    // ═══════════════════════════════════════════════════════════════════

    /// A referenced record (pair, pool, asset, rate stats, vault...) is absent
    #[error("{kind} {id} not found")]
    LookupMissing {
        /// Kind of record that was looked up
        kind: &'static str,
        /// Identifier used for the lookup
        id: String,
    },

    /// The oracle has no usable price for the asset
    #[error("Price unavailable for asset {asset_id}")]
    PriceUnavailable {
        /// Asset whose price could not be resolved
        asset_id: u64,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Balance Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Moving a balance between module accounts or to a user failed
    #[error("Transfer of {amount}{denom} from {from} to {to} failed: {reason}")]
    TransferFailed {
        /// Source account
        from: String,
        /// Destination account
        to: String,
        /// Denomination moved
        denom: String,
        /// Amount moved
        amount: u128,
        /// Underlying cause
        reason: String,
    },

    /// Burning a token from a module account failed
    #[error("Burn of {amount}{denom} from {module} failed: {reason}")]
    BurnFailed {
        /// Module account the burn was charged to
        module: String,
        /// Denomination burned
        denom: String,
        /// Amount burned
        amount: u128,
        /// Underlying cause
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Arithmetic Errors
    // ═══════════════════════════════════════════════════════════════════

    /// A computation hit a zero, near-zero or negative boundary
    #[error("Degenerate arithmetic in {context}")]
    ArithmeticDegenerate {
        /// What was being computed
        context: String,
    },

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    /// Underflow in calculation
    #[error("Arithmetic underflow in {operation}")]
    Underflow {
        /// Operation that underflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invalid configuration or risk parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invariant violation detected
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a missing lookup
    pub fn missing(kind: &'static str, id: impl ToString) -> Self {
        Error::LookupMissing {
            kind,
            id: id.to_string(),
        }
    }

    /// Shorthand for degenerate arithmetic
    pub fn degenerate(context: impl Into<String>) -> Self {
        Error::ArithmeticDegenerate {
            context: context.into(),
        }
    }

    /// Shorthand for an overflow
    pub fn overflow(operation: impl Into<String>) -> Self {
        Error::Overflow {
            operation: operation.into(),
        }
    }

    /// Returns true if the error only concerns the position or vault being
    /// processed, so the surrounding loop may move on to the next item
    pub fn is_item_scoped(&self) -> bool {
        matches!(
            self,
            Error::LookupMissing { .. }
                | Error::PriceUnavailable { .. }
                | Error::ArithmeticDegenerate { .. }
                | Error::Overflow { .. }
                | Error::Underflow { .. }
        )
    }

    /// Returns true if a balance movement failed
    pub fn is_balance_failure(&self) -> bool {
        matches!(self, Error::TransferFailed { .. } | Error::BurnFailed { .. })
    }

    /// Returns true if this is a critical error requiring immediate attention
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Error::InvariantViolation(_) | Error::Internal(_) | Error::Storage(_)
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Lookup errors: 1xxx
            Error::LookupMissing { .. } => 1001,
            Error::PriceUnavailable { .. } => 1002,

            // Balance errors: 2xxx
            Error::TransferFailed { .. } => 2001,
            Error::BurnFailed { .. } => 2002,

            // Arithmetic errors: 3xxx
            Error::ArithmeticDegenerate { .. } => 3001,
            Error::Overflow { .. } => 3002,
            Error::Underflow { .. } => 3003,

            // Validation errors: 5xxx
            Error::InvalidParameter { .. } => 5001,
            Error::InvariantViolation(_) => 5002,

            // Serialization errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,

            // Internal errors: 9xxx
            Error::Storage(_) => 9001,
            Error::Internal(_) => 9002,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let codes = vec![
            Error::missing("pool", 1).code(),
            Error::PriceUnavailable { asset_id: 1 }.code(),
            Error::TransferFailed {
                from: "a".into(),
                to: "b".into(),
                denom: "x".into(),
                amount: 1,
                reason: "r".into(),
            }
            .code(),
            Error::BurnFailed {
                module: "a".into(),
                denom: "x".into(),
                amount: 1,
                reason: "r".into(),
            }
            .code(),
            Error::degenerate("x").code(),
            Error::overflow("x").code(),
            Error::Storage("".into()).code(),
            Error::Internal("".into()).code(),
        ];

        let mut unique_codes = codes.clone();
        unique_codes.sort();
        unique_codes.dedup();

        assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    }

    #[test]
    fn test_error_display() {
        let err = Error::missing("lend pair", 42);
        assert_eq!(err.to_string(), "lend pair 42 not found");
    }

    #[test]
    fn test_item_scoped_classification() {
        assert!(Error::missing("pool", 1).is_item_scoped());
        assert!(Error::PriceUnavailable { asset_id: 3 }.is_item_scoped());
        assert!(Error::degenerate("sell-off denominator").is_item_scoped());

        let burn = Error::BurnFailed {
            module: "pool1".into(),
            denom: "cuatom".into(),
            amount: 10,
            reason: "insufficient".into(),
        };
        assert!(!burn.is_item_scoped());
        assert!(burn.is_balance_failure());
        assert!(!Error::Storage("io".into()).is_item_scoped());
    }

    #[test]
    fn test_is_critical() {
        assert!(Error::InvariantViolation("test".into()).is_critical());
        assert!(!Error::missing("asset", 1).is_critical());
    }
}
