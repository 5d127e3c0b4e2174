//! Per-block orchestration of the liquidation engine.
//!
//! [`LiquidationEngine`] owns the configuration, running statistics and a
//! bounded event log. State itself lives behind the [`LiquidationContext`]
//! passed into every call.

use serde::{Deserialize, Serialize};

use crate::core::auction::DutchAuction;
use crate::core::config::LiquidationConfig;
use crate::core::types::*;
use crate::error::{Error, Result};
use crate::ledger::LiquidationContext;
use crate::liquidation::events::LiquidationEvent;
use crate::liquidation::restore::{unliquidate_locked_borrow, RestorationBranch, RestorationOutcome};
use crate::liquidation::selloff::SellOffReport;
use crate::liquidation::sweep::{liquidate_borrows, SweepReport};
use crate::utils::math::safe_add;

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Engine driving the sweep, the sizer and restoration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationEngine {
    /// Configuration
    config: LiquidationConfig,
    /// Events history
    events: Vec<LiquidationEvent>,
    /// Borrows locked
    total_locked: u64,
    /// Sizing passes written
    total_sized: u64,
    /// First-pass penalty settlements
    total_settlements: u64,
    /// Collateral units taken as penalty and bonus
    total_deducted: Amount,
    /// Vaults closed after full repayment
    total_closed: u64,
    /// Vaults reopened as borrows
    total_reopened: u64,
    /// Items skipped on item-scoped errors
    total_skipped: u64,
}

impl Default for LiquidationEngine {
    fn default() -> Self {
        Self::with_config(LiquidationConfig::default())
    }
}

impl LiquidationEngine {
    /// Create an engine after validating `config`
    pub fn new(config: LiquidationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: LiquidationConfig) -> Self {
        Self {
            config,
            events: Vec::new(),
            total_locked: 0,
            total_sized: 0,
            total_settlements: 0,
            total_deducted: 0,
            total_closed: 0,
            total_reopened: 0,
            total_skipped: 0,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &LiquidationConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ENTRY POINTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Health-check every open borrow and resize every locked vault
    pub fn begin_block<C: LiquidationContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        block: &BlockContext,
    ) -> Result<SweepReport> {
        let report = liquidate_borrows(ctx, &self.config, block).map_err(|e| {
            tracing::error!("Liquidation sweep failed at height {}: {}", block.height, e);
            e
        })?;

        for locked in &report.locked {
            self.total_locked += 1;
            self.add_event(LiquidationEvent::Locked {
                block_height: block.height,
                app_id: locked.app_id,
                locked_vault_id: locked.locked_vault_id,
                borrow_id: locked.borrow_id,
                ratio: locked.ratio,
                threshold: locked.threshold,
            });
        }
        self.total_skipped += report.skipped.len() as u64;
        self.record_sizing(block, &report.sizing)?;

        if !report.locked.is_empty() {
            tracing::info!(
                "Height {}: examined {}, locked {}, skipped {}",
                block.height,
                report.examined,
                report.locked.len(),
                report.skipped.len()
            );
        }
        Ok(report)
    }

    /// Restore a vault whose auction finished
    pub fn unliquidate<C: LiquidationContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        block: &BlockContext,
        app_id: AppId,
        vault_id: VaultId,
        auction: &DutchAuction,
    ) -> Result<RestorationOutcome> {
        let outcome = unliquidate_locked_borrow(ctx, &self.config, block, app_id, vault_id, auction)
            .map_err(|e| {
                if e.is_item_scoped() {
                    tracing::warn!("Restoration of vault {}/{} skipped: {}", app_id, vault_id, e);
                } else {
                    tracing::error!("Restoration of vault {}/{} failed: {}", app_id, vault_id, e);
                }
                e
            })?;

        if let Some(returned) = &outcome.closed {
            self.total_closed += 1;
            self.add_event(LiquidationEvent::Closed {
                block_height: block.height,
                app_id,
                locked_vault_id: vault_id,
                returned: returned.clone(),
            });
        }
        match &outcome.branch {
            RestorationBranch::StillLiquidating { ratio, sizing } => {
                self.add_event(LiquidationEvent::StillLiquidating {
                    block_height: block.height,
                    app_id,
                    locked_vault_id: vault_id,
                    ratio: *ratio,
                });
                self.record_sizing(block, sizing)?;
            }
            RestorationBranch::Reopened { borrow_id, ratio } => {
                self.total_reopened += 1;
                self.add_event(LiquidationEvent::Reopened {
                    block_height: block.height,
                    app_id,
                    locked_vault_id: vault_id,
                    borrow_id: *borrow_id,
                    ratio: *ratio,
                });
            }
            RestorationBranch::Untouched | RestorationBranch::RatioUnavailable { .. } => {}
        }
        Ok(outcome)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get recent events
    pub fn recent_events(&self) -> &[LiquidationEvent] {
        &self.events
    }

    /// Get events for a specific vault
    pub fn events_for_vault(&self, locked_vault_id: VaultId) -> Vec<&LiquidationEvent> {
        self.events
            .iter()
            .filter(|e| e.locked_vault_id() == locked_vault_id)
            .collect()
    }

    /// Get statistics
    pub fn statistics(&self) -> LiquidationStats {
        LiquidationStats {
            total_locked: self.total_locked,
            total_sized: self.total_sized,
            total_settlements: self.total_settlements,
            total_deducted: self.total_deducted,
            total_closed: self.total_closed,
            total_reopened: self.total_reopened,
            total_skipped: self.total_skipped,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    fn record_sizing(&mut self, block: &BlockContext, sizing: &SellOffReport) -> Result<()> {
        for sized in &sizing.sized {
            self.total_sized += 1;
            let deducted = match &sized.settlement {
                Some(settlement) => {
                    self.total_settlements += 1;
                    self.total_deducted = safe_add(self.total_deducted, settlement.deducted)?;
                    settlement.deducted
                }
                None => 0,
            };
            self.add_event(LiquidationEvent::SellOffSized {
                block_height: block.height,
                app_id: sized.app_id,
                locked_vault_id: sized.locked_vault_id,
                ratio: sized.ratio,
                collateral_to_be_auctioned: sized.collateral_to_be_auctioned,
                deducted,
            });
        }
        self.total_skipped += sizing.skipped.len() as u64;
        Ok(())
    }

    /// Add an event (with pruning)
    fn add_event(&mut self, event: LiquidationEvent) {
        self.events.push(event);

        if self.events.len() > self.config.max_events {
            self.events.drain(0..self.events.len() - self.config.max_events);
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Liquidation statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationStats {
    /// Borrows locked
    pub total_locked: u64,
    /// Sizing passes written
    pub total_sized: u64,
    /// First-pass penalty settlements
    pub total_settlements: u64,
    /// Collateral units taken as penalty and bonus
    pub total_deducted: Amount,
    /// Vaults closed after full repayment
    pub total_closed: u64,
    /// Vaults reopened as borrows
    pub total_reopened: u64,
    /// Items skipped on item-scoped errors
    pub total_skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::*;
    use crate::liquidation::test_support::*;

    #[test]
    fn test_invalid_config_rejected() {
        let config = LiquidationConfig::default().with_deduction_percentage(rust_decimal::Decimal::ZERO);
        assert!(LiquidationEngine::new(config).is_err());
    }

    #[test]
    fn test_begin_block_records_events() {
        let (mut state, config) = fixture();
        state.open_borrow(&borrow_fixture(1, 900_000_000, 0)).unwrap();
        let mut engine = LiquidationEngine::new(config).unwrap();

        engine.begin_block(&mut state, &block(1)).unwrap();
        engine.begin_block(&mut state, &block(2)).unwrap();

        let stats = engine.statistics();
        assert_eq!(stats.total_locked, 1);
        assert_eq!(stats.total_sized, 2);
        assert_eq!(stats.total_settlements, 1);
        assert!(stats.total_deducted > 0);
        assert_eq!(engine.events_for_vault(1).len(), 3);
        assert!(matches!(engine.recent_events()[0], LiquidationEvent::Locked { .. }));
    }

    #[test]
    fn test_event_history_is_bounded() {
        let (mut state, mut config) = fixture();
        config.max_events = 2;
        state.open_borrow(&borrow_fixture(1, 900_000_000, 0)).unwrap();
        let mut engine = LiquidationEngine::new(config).unwrap();

        for height in 1..=5 {
            engine.begin_block(&mut state, &block(height)).unwrap();
        }
        assert_eq!(engine.recent_events().len(), 2);
        assert_eq!(engine.recent_events()[1].block_height(), 5);
    }

    #[test]
    fn test_unliquidate_closes_repaid_vault() {
        let (mut state, config) = fixture();
        let mut engine = LiquidationEngine::new(config.clone()).unwrap();
        let mut vault = lock_fixture(&mut state, &config, 950_000_000);
        vault.amount_in = 100_000_000;
        vault.amount_out = 0;
        vault.updated_amount_out = 0;
        vault.is_auction_complete = true;
        state.set_locked_vault(&vault).unwrap();

        let outcome = engine
            .unliquidate(&mut state, &block(3), APP_ID, vault.locked_vault_id, &auction(1))
            .unwrap();

        assert_eq!(outcome.closed, Some(Coin::new("cuatom", 100_000_000)));
        let stats = engine.statistics();
        assert_eq!(stats.total_closed, 1);
        assert_eq!(stats.total_reopened, 1);
    }

    #[test]
    fn test_engine_bytes_roundtrip() {
        let (mut state, config) = fixture();
        state.open_borrow(&borrow_fixture(1, 900_000_000, 0)).unwrap();
        let mut engine = LiquidationEngine::new(config).unwrap();
        engine.begin_block(&mut state, &block(1)).unwrap();

        let restored = LiquidationEngine::from_bytes(&engine.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.statistics(), engine.statistics());
        assert_eq!(restored.recent_events(), engine.recent_events());
    }
}
