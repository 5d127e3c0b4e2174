//! Records owned by the lending side of the protocol.
//!
//! The engine reads these through the capability traits in [`crate::ledger`];
//! only [`BorrowPosition`] and [`LendPosition`] are ever written back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::types::*;
use crate::error::{Error, Result};
use crate::utils::math::safe_add;

// ═══════════════════════════════════════════════════════════════════════════════
// BORROW POSITION
// ═══════════════════════════════════════════════════════════════════════════════

/// An open, non-liquidating debt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowPosition {
    /// Position id
    pub id: BorrowId,
    /// Lend position whose receipt tokens back this borrow
    pub lending_id: LendId,
    /// Lending pair
    pub pair_id: PairId,
    /// Collateral locked into the borrow (receipt asset units)
    pub amount_in: Coin,
    /// Principal borrowed
    pub amount_out: Coin,
    /// Interest accrued on top of the principal
    #[serde(default)]
    pub interest_accumulated: Amount,
    /// Bridge asset the borrow is routed through; zero means no routing
    pub bridged_asset_amount: Coin,
    /// Whether the borrow pays a stable rate
    #[serde(default)]
    pub is_stable_borrow: bool,
    /// Stable rate, meaningful only when `is_stable_borrow`
    #[serde(default)]
    pub stable_borrow_rate: Decimal,
    /// Time the borrow was opened
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl BorrowPosition {
    /// Principal plus accrued interest
    pub fn updated_amount_out(&self) -> Result<Amount> {
        safe_add(self.amount_out.amount, self.interest_accumulated)
    }

    /// Whether the borrow is routed through a bridge asset
    pub fn is_bridged(&self) -> bool {
        !self.bridged_asset_amount.is_zero()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEND POSITION
// ═══════════════════════════════════════════════════════════════════════════════

/// A supply position; its receipt tokens collateralize borrows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendPosition {
    /// Position id
    pub id: LendId,
    /// Owner address
    pub owner: String,
    /// Application the position belongs to
    pub app_id: AppId,
    /// Pool custodying the supplied asset
    pub pool_id: PoolId,
    /// Supplied asset
    pub asset_id: AssetId,
    /// Principal supplied
    pub amount_in: Coin,
    /// Principal plus accrued supply rewards
    pub updated_amount_in: Amount,
    /// Receipt tokens not yet pledged to a borrow
    #[serde(default)]
    pub available_to_borrow: Amount,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAIRS, POOLS, ASSETS
// ═══════════════════════════════════════════════════════════════════════════════

/// A lending pair: borrow `asset_out` against `asset_in`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendPair {
    /// Pair id
    pub id: PairId,
    /// Collateral asset
    pub asset_in: AssetId,
    /// Borrowed asset
    pub asset_out: AssetId,
    /// Pool the borrowed asset is drawn from
    pub asset_out_pool_id: PoolId,
    /// Whether collateral and debt live in different pools
    pub is_inter_pool: bool,
}

/// Pool metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Pool id
    pub id: PoolId,
    /// Module account custodying the pool's collateral
    pub module_name: String,
    /// First bridge asset
    pub first_bridged_asset_id: AssetId,
    /// Second bridge asset
    pub second_bridged_asset_id: AssetId,
}

/// Asset metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset id
    pub id: AssetId,
    /// Denomination string
    pub denom: String,
}

impl Asset {
    /// Create an asset
    pub fn new(id: AssetId, denom: impl Into<String>) -> Self {
        Self {
            id,
            denom: denom.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET RATE STATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-asset risk parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRatesStats {
    /// Asset these parameters apply to
    pub asset_id: AssetId,
    /// Loan-to-value
    pub ltv: Decimal,
    /// Ratio above which a position is liquidated
    pub liquidation_threshold: Decimal,
    /// Fraction of the sell-off credited to reserves
    pub liquidation_penalty: Decimal,
    /// Fraction of the sell-off paid to the winning bidder
    pub liquidation_bonus: Decimal,
    /// Receipt ("c-") asset minted for deposits of this asset
    pub c_asset_id: AssetId,
}

impl AssetRatesStats {
    /// Penalty plus bonus
    pub fn penalty_and_bonus(&self) -> Result<Decimal> {
        self.liquidation_penalty
            .checked_add(self.liquidation_bonus)
            .ok_or_else(|| Error::overflow("penalty + bonus"))
    }

    /// Check every fraction lies in `[0, 1]` and the threshold is positive
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("ltv", self.ltv),
            ("liquidation_threshold", self.liquidation_threshold),
            ("liquidation_penalty", self.liquidation_penalty),
            ("liquidation_bonus", self.liquidation_bonus),
        ];
        for (name, value) in fractions {
            if value.is_sign_negative() || value > Decimal::ONE {
                return Err(Error::InvalidParameter {
                    name: format!("asset {} {}", self.asset_id, name),
                    reason: format!("{} outside [0, 1]", value),
                });
            }
        }
        if self.liquidation_threshold.is_zero() {
            return Err(Error::InvalidParameter {
                name: format!("asset {} liquidation_threshold", self.asset_id),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BORROW STATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Aggregate borrow totals for a lending pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairBorrowStats {
    /// Pair these totals belong to
    pub pair_id: PairId,
    /// Total principal outstanding
    pub total_borrowed: Amount,
    /// Portion of `total_borrowed` at a stable rate
    pub total_stable_borrowed: Amount,
}

impl PairBorrowStats {
    /// Apply a principal change
    pub fn apply(&mut self, is_stable: bool, amount: Amount, increase: bool) -> Result<()> {
        if increase {
            self.total_borrowed = safe_add(self.total_borrowed, amount)?;
            if is_stable {
                self.total_stable_borrowed = safe_add(self.total_stable_borrowed, amount)?;
            }
        } else {
            self.total_borrowed = self.total_borrowed.saturating_sub(amount);
            if is_stable {
                self.total_stable_borrowed = self.total_stable_borrowed.saturating_sub(amount);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(lt: i64, ltv: i64, penalty: i64, bonus: i64) -> AssetRatesStats {
        AssetRatesStats {
            asset_id: 1,
            ltv: Decimal::new(ltv, 2),
            liquidation_threshold: Decimal::new(lt, 2),
            liquidation_penalty: Decimal::new(penalty, 2),
            liquidation_bonus: Decimal::new(bonus, 2),
            c_asset_id: 2,
        }
    }

    #[test]
    fn test_updated_amount_out() {
        let borrow = BorrowPosition {
            id: 1,
            lending_id: 1,
            pair_id: 1,
            amount_in: Coin::new("cuatom", 100),
            amount_out: Coin::new("ucmst", 50),
            interest_accumulated: 7,
            bridged_asset_amount: Coin::zero("ucmst"),
            is_stable_borrow: false,
            stable_borrow_rate: Decimal::ZERO,
            created_at: DateTime::<Utc>::default(),
        };
        assert_eq!(borrow.updated_amount_out().unwrap(), 57);
        assert!(!borrow.is_bridged());
    }

    #[test]
    fn test_stats_validation() {
        assert!(stats(85, 80, 5, 5).validate().is_ok());
        assert!(stats(0, 80, 5, 5).validate().is_err());
        assert!(stats(85, 120, 5, 5).validate().is_err());
        assert!(stats(85, 80, -5, 5).validate().is_err());
        assert_eq!(stats(85, 80, 5, 3).penalty_and_bonus().unwrap(), Decimal::new(8, 2));
    }

    #[test]
    fn test_pair_borrow_stats() {
        let mut stats = PairBorrowStats {
            pair_id: 1,
            ..Default::default()
        };
        stats.apply(true, 100, true).unwrap();
        stats.apply(false, 40, true).unwrap();
        assert_eq!(stats.total_borrowed, 140);
        assert_eq!(stats.total_stable_borrowed, 100);

        stats.apply(true, 500, false).unwrap();
        assert_eq!(stats.total_borrowed, 0);
        assert_eq!(stats.total_stable_borrowed, 0);
    }
}
