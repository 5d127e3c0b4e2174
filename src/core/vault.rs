//! Locked vaults: borrow positions frozen for liquidation.
//!
//! A [`LockedVault`] is created by the lock transition, resized every block by
//! the sell-off sizer and finally closed or converted back into a borrow by
//! the restoration engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::types::*;
use crate::error::{Error, Result};
use crate::utils::math::amount_to_decimal;

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT KIND
// ═══════════════════════════════════════════════════════════════════════════════

/// Origin-specific data carried by a locked vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockedVaultKind {
    /// Locked from a borrow position
    Borrow(BorrowMetaData),
    /// Locked from a CDP vault; handled by the vault module's own flow
    Cdp(CdpMetaData),
}

/// Metadata of a vault locked from a borrow position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowMetaData {
    /// Lend position backing the borrow
    pub lending_id: LendId,
    /// Whether the borrow paid a stable rate
    pub is_stable_borrow: bool,
    /// Stable rate at lock time
    pub stable_borrow_rate: Decimal,
    /// Bridge asset the borrow was routed through; zero means none
    pub bridged_asset_amount: Coin,
}

impl BorrowMetaData {
    /// Whether the locked borrow was routed through a bridge asset
    pub fn is_bridged(&self) -> bool {
        !self.bridged_asset_amount.is_zero()
    }
}

/// Metadata of a vault locked from a CDP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdpMetaData {
    /// Id of the CDP in its extended pair
    pub extended_pair_vault_id: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOCKED VAULT
// ═══════════════════════════════════════════════════════════════════════════════

/// A position currently undergoing or pending liquidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedVault {
    /// Monotonic id assigned at lock time
    pub locked_vault_id: VaultId,
    /// Application the position belongs to
    pub app_id: AppId,
    /// Id of the position this vault was locked from
    pub original_vault_id: BorrowId,
    /// Lending pair of the original position
    pub extended_pair_id: PairId,
    /// Owner address
    pub owner: String,
    /// Collateral still held
    pub amount_in: Amount,
    /// Principal outstanding
    pub amount_out: Amount,
    /// Principal plus interest
    pub updated_amount_out: Amount,
    /// Interest accrued when the position was locked
    pub interest_accumulated: Amount,
    /// Module that locked the vault
    pub initiator: String,
    /// Ratio at lock time
    pub cr_at_liquidation: Decimal,
    /// Ratio at the last recomputation
    pub current_collateralization_ratio: Decimal,
    /// Collateral units earmarked for auction
    pub collateral_to_be_auctioned: Decimal,
    /// Block time of the lock
    pub liquidation_timestamp: DateTime<Utc>,
    /// Textual records of finished sell-off auctions, oldest first
    pub sell_off_history: Vec<String>,
    /// Whether the penalty/bonus split has been taken from the collateral
    pub penalty_settled: bool,
    /// An auction for this vault is running
    pub is_auction_in_progress: bool,
    /// The last auction for this vault has finished
    pub is_auction_complete: bool,
    /// Origin-specific metadata
    pub kind: LockedVaultKind,
}

impl LockedVault {
    /// Borrow metadata, if this vault was locked from a borrow
    pub fn borrow_metadata(&self) -> Option<&BorrowMetaData> {
        match &self.kind {
            LockedVaultKind::Borrow(meta) => Some(meta),
            LockedVaultKind::Cdp(_) => None,
        }
    }

    /// Whether the next sizing pass is the first one and must settle the
    /// penalty and bonus
    pub fn is_first_sell_off(&self) -> bool {
        self.sell_off_history.is_empty() && !self.penalty_settled
    }

    /// Whether the sizer should (re)size this vault given its threshold
    pub fn awaits_sizing(&self, threshold: Decimal) -> bool {
        (!self.is_auction_in_progress && !self.is_auction_complete)
            || (self.is_auction_complete && self.current_collateralization_ratio >= threshold)
    }

    /// Record a finished auction; history entries are never rewritten
    pub fn record_sell_off(&mut self, record: String) {
        self.sell_off_history.push(record);
    }

    /// Check record-local invariants
    pub fn check_invariants(&self) -> Result<()> {
        if self.updated_amount_out < self.amount_out {
            return Err(Error::InvariantViolation(format!(
                "vault {}: updated amount out {} < amount out {}",
                self.locked_vault_id, self.updated_amount_out, self.amount_out
            )));
        }
        if self.collateral_to_be_auctioned.is_sign_negative()
            && !self.collateral_to_be_auctioned.is_zero()
        {
            return Err(Error::InvariantViolation(format!(
                "vault {}: negative collateral to auction {}",
                self.locked_vault_id, self.collateral_to_be_auctioned
            )));
        }
        if self.collateral_to_be_auctioned > amount_to_decimal(self.amount_in)? {
            return Err(Error::InvariantViolation(format!(
                "vault {}: collateral to auction {} exceeds amount in {}",
                self.locked_vault_id, self.collateral_to_be_auctioned, self.amount_in
            )));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HISTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Archived copy of a vault that left liquidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedVaultHistory {
    /// Monotonic history id
    pub history_id: u64,
    /// The vault as it was when archived
    pub locked_vault: LockedVault,
    /// Block time of archival
    pub archived_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_vault() -> LockedVault {
        LockedVault {
            locked_vault_id: 1,
            app_id: 3,
            original_vault_id: 9,
            extended_pair_id: 2,
            owner: "comdex1owner".into(),
            amount_in: 1_000,
            amount_out: 900,
            updated_amount_out: 950,
            interest_accumulated: 50,
            initiator: "liquidation".into(),
            cr_at_liquidation: Decimal::new(95, 2),
            current_collateralization_ratio: Decimal::new(95, 2),
            collateral_to_be_auctioned: Decimal::ZERO,
            liquidation_timestamp: DateTime::<Utc>::default(),
            sell_off_history: Vec::new(),
            penalty_settled: false,
            is_auction_in_progress: false,
            is_auction_complete: false,
            kind: LockedVaultKind::Borrow(BorrowMetaData {
                lending_id: 4,
                is_stable_borrow: false,
                stable_borrow_rate: Decimal::ZERO,
                bridged_asset_amount: Coin::zero("ucmst"),
            }),
        }
    }

    #[test]
    fn test_awaits_sizing() {
        let threshold = Decimal::new(85, 2);
        let mut vault = sample_vault();
        assert!(vault.awaits_sizing(threshold));

        vault.is_auction_in_progress = true;
        assert!(!vault.awaits_sizing(threshold));

        vault.is_auction_in_progress = false;
        vault.is_auction_complete = true;
        assert!(vault.awaits_sizing(threshold));

        vault.current_collateralization_ratio = Decimal::new(80, 2);
        assert!(!vault.awaits_sizing(threshold));
    }

    #[test]
    fn test_first_sell_off() {
        let mut vault = sample_vault();
        assert!(vault.is_first_sell_off());
        vault.penalty_settled = true;
        assert!(!vault.is_first_sell_off());

        let mut vault = sample_vault();
        vault.record_sell_off("auction_id:1".into());
        assert!(!vault.is_first_sell_off());
    }

    #[test]
    fn test_invariants() {
        let mut vault = sample_vault();
        assert!(vault.check_invariants().is_ok());

        vault.collateral_to_be_auctioned = Decimal::from(1_001);
        assert!(vault.check_invariants().is_err());

        let mut vault = sample_vault();
        vault.updated_amount_out = 10;
        assert!(vault.check_invariants().is_err());
    }

    #[test]
    fn test_kind_is_exhaustive() {
        let mut vault = sample_vault();
        assert!(vault.borrow_metadata().is_some());
        vault.kind = LockedVaultKind::Cdp(CdpMetaData {
            extended_pair_vault_id: 1,
        });
        assert!(vault.borrow_metadata().is_none());
    }
}
