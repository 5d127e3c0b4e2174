//! Checked fixed-point arithmetic.
//!
//! Every helper here returns an error instead of panicking so that adversarial
//! amounts or prices can never take a replica down.

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::core::types::Amount;
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Lift an integer amount into a `Decimal`
pub fn amount_to_decimal(amount: Amount) -> Result<Decimal> {
    Decimal::from_u128(amount).ok_or_else(|| Error::overflow(format!("decimal from {}", amount)))
}

/// Truncate a non-negative `Decimal` to an integer amount
pub fn truncate_to_amount(value: Decimal) -> Result<Amount> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::Underflow {
            operation: format!("amount from {}", value),
        });
    }
    value
        .trunc()
        .to_u128()
        .ok_or_else(|| Error::overflow(format!("amount from {}", value)))
}

/// Market value of `amount` units at `price`
pub fn market_value(amount: Amount, price: u64) -> Result<Decimal> {
    checked_mul(amount_to_decimal(amount)?, Decimal::from(price), "market value")
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAFE DECIMAL OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Safe addition with overflow check
pub fn checked_add(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(|| Error::overflow(operation))
}

/// Safe subtraction with overflow check
pub fn checked_sub(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal> {
    a.checked_sub(b).ok_or_else(|| Error::overflow(operation))
}

/// Safe multiplication with overflow check
pub fn checked_mul(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal> {
    a.checked_mul(b).ok_or_else(|| Error::overflow(operation))
}

/// Safe division; a zero divisor is degenerate rather than an overflow
pub fn checked_div(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal> {
    if b.is_zero() {
        return Err(Error::degenerate(format!("{}: division by zero", operation)));
    }
    a.checked_div(b).ok_or_else(|| Error::overflow(operation))
}

/// Safe integer subtraction with underflow check
pub fn safe_sub(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_sub(b).ok_or(Error::Underflow {
        operation: format!("{} - {}", a, b),
    })
}

/// Safe integer addition with overflow check
pub fn safe_add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b)
        .ok_or_else(|| Error::overflow(format!("{} + {}", a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_value() {
        assert_eq!(market_value(1_000, 3).unwrap(), Decimal::from(3_000));
        assert_eq!(market_value(0, 3).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_amount_to_decimal_overflow() {
        assert!(amount_to_decimal(u128::MAX).is_err());
        assert_eq!(amount_to_decimal(7).unwrap(), Decimal::from(7));
    }

    #[test]
    fn test_truncate_to_amount() {
        assert_eq!(truncate_to_amount(Decimal::new(12_999, 3)).unwrap(), 12);
        assert_eq!(truncate_to_amount(Decimal::ZERO).unwrap(), 0);
        assert!(truncate_to_amount(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_checked_div_zero_is_degenerate() {
        let err = checked_div(Decimal::ONE, Decimal::ZERO, "ratio").unwrap_err();
        assert!(matches!(err, Error::ArithmeticDegenerate { .. }));
    }

    #[test]
    fn test_checked_mul_overflow() {
        assert!(checked_mul(Decimal::MAX, Decimal::from(2), "mul").is_err());
    }

    #[test]
    fn test_safe_sub() {
        assert_eq!(safe_sub(10, 4).unwrap(), 6);
        assert!(safe_sub(4, 10).is_err());
    }
}
