//! Collateralization calculator.
//!
//! The ratio is debt value over collateral value, so it rises as a position
//! gets less healthy and is compared against the liquidation threshold with
//! `>`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::borrow::Asset;
use crate::core::types::Amount;
use crate::error::{Error, Result};
use crate::ledger::PriceOracle;
use crate::utils::math::{checked_div, market_value};

/// Both legs of a position priced at the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    /// Collateral unit price
    pub price_in: u64,
    /// Debt unit price
    pub price_out: u64,
    /// Collateral market value
    pub total_in: Decimal,
    /// Debt market value
    pub total_out: Decimal,
    /// `total_out / total_in`
    pub ratio: Decimal,
}

/// Resolve a usable price; an absent or zero price is unavailable
pub fn price_of<O: PriceOracle + ?Sized>(oracle: &O, asset_id: u64) -> Result<u64> {
    match oracle.price(asset_id)? {
        Some(price) if price > 0 => Ok(price),
        _ => Err(Error::PriceUnavailable { asset_id }),
    }
}

/// Price both legs and compute the ratio
pub fn value_position<O: PriceOracle + ?Sized>(
    oracle: &O,
    amount_in: Amount,
    asset_in: &Asset,
    amount_out: Amount,
    asset_out: &Asset,
) -> Result<Valuation> {
    let price_in = price_of(oracle, asset_in.id)?;
    let price_out = price_of(oracle, asset_out.id)?;
    let total_in = market_value(amount_in, price_in)?;
    let total_out = market_value(amount_out, price_out)?;
    if total_in.is_zero() {
        return Err(Error::degenerate(format!(
            "collateral value of {}{} is zero",
            amount_in, asset_in.denom
        )));
    }
    let ratio = checked_div(total_out, total_in, "collateralization ratio")?;
    Ok(Valuation {
        price_in,
        price_out,
        total_in,
        total_out,
        ratio,
    })
}

/// Collateralization ratio of `amount_out` of debt against `amount_in` of
/// collateral
pub fn collateralization_ratio<O: PriceOracle + ?Sized>(
    oracle: &O,
    amount_in: Amount,
    asset_in: &Asset,
    amount_out: Amount,
    asset_out: &Asset,
) -> Result<Decimal> {
    value_position(oracle, amount_in, asset_in, amount_out, asset_out).map(|v| v.ratio)
}
