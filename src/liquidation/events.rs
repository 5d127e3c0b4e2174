//! Liquidation events and skip records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::types::*;
use crate::error::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// SKIPPED ITEMS
// ═══════════════════════════════════════════════════════════════════════════════

/// A position or vault left untouched because of an item-scoped error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    /// Application, for locked vaults
    pub app_id: Option<AppId>,
    /// Borrow id or locked vault id
    pub id: u64,
    /// Error code
    pub code: u32,
    /// Error message
    pub reason: String,
}

impl SkippedItem {
    /// A borrow position skipped by the sweep
    pub fn borrow(id: BorrowId, error: &Error) -> Self {
        Self {
            app_id: None,
            id,
            code: error.code(),
            reason: error.to_string(),
        }
    }

    /// A locked vault skipped by the sizer
    pub fn vault(app_id: AppId, id: VaultId, error: &Error) -> Self {
        Self {
            app_id: Some(app_id),
            id,
            code: error.code(),
            reason: error.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Record of a state transition made by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationEvent {
    /// A borrow breached its threshold and was locked
    Locked {
        /// Block height
        block_height: u64,
        /// Application
        app_id: AppId,
        /// New vault id
        locked_vault_id: VaultId,
        /// Borrow that was locked
        borrow_id: BorrowId,
        /// Ratio at lock time
        ratio: Decimal,
        /// Threshold it breached
        threshold: Decimal,
    },
    /// The sizer (re)computed the collateral to auction
    SellOffSized {
        /// Block height
        block_height: u64,
        /// Application
        app_id: AppId,
        /// Vault
        locked_vault_id: VaultId,
        /// Current ratio
        ratio: Decimal,
        /// Collateral units earmarked for auction
        collateral_to_be_auctioned: Decimal,
        /// Collateral units taken as penalty and bonus in this pass
        deducted: Amount,
    },
    /// A fully repaid vault was closed and its collateral returned
    Closed {
        /// Block height
        block_height: u64,
        /// Application
        app_id: AppId,
        /// Vault
        locked_vault_id: VaultId,
        /// Receipt tokens returned to the owner
        returned: Coin,
    },
    /// A vault stayed locked after an auction
    StillLiquidating {
        /// Block height
        block_height: u64,
        /// Application
        app_id: AppId,
        /// Vault
        locked_vault_id: VaultId,
        /// Ratio after the auction
        ratio: Decimal,
    },
    /// A vault was converted back into an open borrow
    Reopened {
        /// Block height
        block_height: u64,
        /// Application
        app_id: AppId,
        /// Vault that was dissolved
        locked_vault_id: VaultId,
        /// New borrow id
        borrow_id: BorrowId,
        /// Ratio after the auction
        ratio: Decimal,
    },
}

impl LiquidationEvent {
    /// Vault the event concerns
    pub fn locked_vault_id(&self) -> VaultId {
        match self {
            LiquidationEvent::Locked {
                locked_vault_id, ..
            }
            | LiquidationEvent::SellOffSized {
                locked_vault_id, ..
            }
            | LiquidationEvent::Closed {
                locked_vault_id, ..
            }
            | LiquidationEvent::StillLiquidating {
                locked_vault_id, ..
            }
            | LiquidationEvent::Reopened {
                locked_vault_id, ..
            } => *locked_vault_id,
        }
    }

    /// Block the event happened in
    pub fn block_height(&self) -> u64 {
        match self {
            LiquidationEvent::Locked { block_height, .. }
            | LiquidationEvent::SellOffSized { block_height, .. }
            | LiquidationEvent::Closed { block_height, .. }
            | LiquidationEvent::StillLiquidating { block_height, .. }
            | LiquidationEvent::Reopened { block_height, .. } => *block_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_item_carries_code() {
        let skipped = SkippedItem::vault(3, 7, &Error::degenerate("sell-off denominator"));
        assert_eq!(skipped.app_id, Some(3));
        assert_eq!(skipped.code, 3001);
        assert!(skipped.reason.contains("sell-off denominator"));
    }

    #[test]
    fn test_event_accessors() {
        let event = LiquidationEvent::Closed {
            block_height: 12,
            app_id: 3,
            locked_vault_id: 4,
            returned: Coin::new("cuatom", 10),
        };
        assert_eq!(event.locked_vault_id(), 4);
        assert_eq!(event.block_height(), 12);
    }
}
