//! Finished auction records handed to the restoration engine.
//!
//! The auction module runs the bidding; the engine only reads its result and
//! appends the textual rendering to the vault's sell-off history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::*;

/// Result of a dutch auction over a locked vault's collateral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutchAuction {
    /// Auction id
    pub auction_id: u64,
    /// Application the vault belongs to
    pub app_id: AppId,
    /// Vault whose collateral was sold
    pub locked_vault_id: VaultId,
    /// Collateral offered at start
    pub outflow_token_init_amount: Coin,
    /// Collateral still unsold
    pub outflow_token_current_amount: Coin,
    /// Debt the auction set out to recover
    pub inflow_token_target_amount: Coin,
    /// Debt actually recovered
    pub inflow_token_current_amount: Coin,
    /// Starting price
    pub outflow_token_init_price: Decimal,
    /// Price when the auction ended
    pub outflow_token_current_price: Decimal,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time
    pub end_time: DateTime<Utc>,
}

impl fmt::Display for DutchAuction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "auction_id:{} app_id:{} locked_vault_id:{} outflow_init:{} outflow_current:{} \
             inflow_target:{} inflow_current:{} init_price:{} current_price:{} start:{} end:{}",
            self.auction_id,
            self.app_id,
            self.locked_vault_id,
            self.outflow_token_init_amount,
            self.outflow_token_current_amount,
            self.inflow_token_target_amount,
            self.inflow_token_current_amount,
            self.outflow_token_init_price,
            self.outflow_token_current_price,
            self.start_time.to_rfc3339(),
            self.end_time.to_rfc3339(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_stable() {
        let auction = DutchAuction {
            auction_id: 7,
            app_id: 3,
            locked_vault_id: 1,
            outflow_token_init_amount: Coin::new("uatom", 100),
            outflow_token_current_amount: Coin::new("uatom", 0),
            inflow_token_target_amount: Coin::new("ucmst", 90),
            inflow_token_current_amount: Coin::new("ucmst", 90),
            outflow_token_init_price: Decimal::new(12, 1),
            outflow_token_current_price: Decimal::ONE,
            start_time: DateTime::<Utc>::default(),
            end_time: DateTime::<Utc>::default(),
        };
        let text = auction.to_string();
        assert!(text.starts_with("auction_id:7 app_id:3 locked_vault_id:1"));
        assert!(text.contains("inflow_current:90ucmst"));
        assert_eq!(text, auction.clone().to_string());
    }
}
