//! Block-by-block simulation harness.
//!
//! A [`Scenario`] describes a lending market (assets, risk parameters, pools,
//! pairs, positions, balances) plus scheduled price moves and auction results.
//! [`Simulation`] seeds an in-memory [`StateManager`] from it and drives the
//! [`LiquidationEngine`] one block at a time.
//!
//! Decimal fields are written as JSON strings (`"0.85"`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::auction::DutchAuction;
use crate::core::borrow::*;
use crate::core::config::LiquidationConfig;
use crate::core::types::*;
use crate::error::{Error, Result};
use crate::ledger::*;
use crate::liquidation::engine::LiquidationEngine;
use crate::liquidation::restore::RestorationOutcome;
use crate::liquidation::sweep::SweepReport;
use crate::storage::{InMemoryStore, StateManager};
use crate::utils::math::{amount_to_decimal, checked_div, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// SCENARIO
// ═══════════════════════════════════════════════════════════════════════════════

/// Oracle price of an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Asset
    pub asset_id: AssetId,
    /// Unit price
    pub price: u64,
}

/// Balance minted into an account at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// Module or user account
    pub account: String,
    /// Coin minted
    pub coin: Coin,
}

/// Price change applied at the start of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceMove {
    /// Height at which the move applies
    pub height: u64,
    /// Asset
    pub asset_id: AssetId,
    /// New unit price
    pub price: u64,
}

/// Auction result delivered at the end of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionResult {
    /// Height at which the auction completes
    pub height: u64,
    /// Application of the vault
    pub app_id: AppId,
    /// Vault whose collateral was sold
    pub locked_vault_id: VaultId,
    /// Collateral units sold
    pub collateral_sold: Amount,
    /// Debt units recovered
    pub debt_repaid: Amount,
}

fn default_block_secs() -> i64 {
    6
}

fn default_start_height() -> u64 {
    1
}

/// Market description loaded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Height of the first simulated block
    #[serde(default = "default_start_height")]
    pub start_height: u64,
    /// Unix time of the first simulated block
    #[serde(default)]
    pub start_time: i64,
    /// Seconds between blocks
    #[serde(default = "default_block_secs")]
    pub block_secs: i64,
    /// Assets
    pub assets: Vec<Asset>,
    /// Risk parameters
    pub rates: Vec<AssetRatesStats>,
    /// Pools
    pub pools: Vec<Pool>,
    /// Lending pairs
    pub pairs: Vec<LendPair>,
    /// Lend positions
    pub lends: Vec<LendPosition>,
    /// Open borrows
    #[serde(default)]
    pub borrows: Vec<BorrowPosition>,
    /// Initial prices
    pub prices: Vec<PriceEntry>,
    /// Initial balances
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
    /// Scheduled price moves
    #[serde(default)]
    pub price_moves: Vec<PriceMove>,
    /// Scheduled auction results
    #[serde(default)]
    pub auctions: Vec<AuctionResult>,
}

impl Scenario {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Storage(format!("Failed to read scenario: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::Deserialization(format!("Failed to parse scenario: {}", e)))
    }

    /// Reject risk parameters that would make sell-off sizing degenerate on
    /// any route a pair can take
    pub fn validate(&self, config: &LiquidationConfig) -> Result<()> {
        let rates = |id: AssetId| {
            self.rates
                .iter()
                .find(|r| r.asset_id == id)
                .ok_or_else(|| Error::missing("asset rates stats", id))
        };
        for pair in &self.pairs {
            let collateral = rates(pair.asset_in)?;
            config.validate_risk_profile(collateral, None)?;
            for lend in self.lends.iter().filter(|l| l.asset_id == pair.asset_in) {
                let pool = self
                    .pools
                    .iter()
                    .find(|p| p.id == lend.pool_id)
                    .ok_or_else(|| Error::missing("pool", lend.pool_id))?;
                for bridge in [pool.first_bridged_asset_id, pool.second_bridged_asset_id] {
                    config.validate_risk_profile(collateral, Some(rates(bridge)?))?;
                }
            }
        }
        Ok(())
    }

    /// Build a state seeded with this scenario
    pub fn seed(&self) -> Result<StateManager<InMemoryStore>> {
        let mut state = StateManager::new(InMemoryStore::new());
        for asset in &self.assets {
            state.set_asset(asset)?;
        }
        for rates in &self.rates {
            state.set_asset_rates_stats(rates)?;
        }
        for pool in &self.pools {
            state.set_pool(pool)?;
        }
        for pair in &self.pairs {
            state.set_lend_pair(pair)?;
        }
        for entry in &self.prices {
            state.set_price(entry.asset_id, entry.price)?;
        }
        for entry in &self.balances {
            state.mint(&entry.account, &entry.coin)?;
        }
        for lend in &self.lends {
            state.set_lend(lend)?;
        }
        for borrow in &self.borrows {
            state.open_borrow(borrow)?;
        }
        Ok(state)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Restoration attempted for a scheduled auction result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationReport {
    /// Application
    pub app_id: AppId,
    /// Vault
    pub locked_vault_id: VaultId,
    /// Outcome, when restoration ran
    pub outcome: Option<RestorationOutcome>,
    /// Error message, when it was skipped
    pub error: Option<String>,
}

/// Everything that happened in one simulated block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReport {
    /// Block height
    pub height: u64,
    /// Sweep and sizing outcome
    pub sweep: SweepReport,
    /// Restorations triggered by auction results
    pub restorations: Vec<RestorationReport>,
}

/// A scenario being played block by block
pub struct Simulation {
    scenario: Scenario,
    state: StateManager<InMemoryStore>,
    engine: LiquidationEngine,
    block: BlockContext,
}

impl Simulation {
    /// Validate and seed `scenario`
    pub fn new(scenario: Scenario, config: LiquidationConfig) -> Result<Self> {
        scenario.validate(&config)?;
        let state = scenario.seed()?;
        let engine = LiquidationEngine::new(config)?;
        let block = BlockContext::at_unix(scenario.start_height, scenario.start_time);
        Ok(Self {
            scenario,
            state,
            engine,
            block,
        })
    }

    /// Current state
    pub fn state(&self) -> &StateManager<InMemoryStore> {
        &self.state
    }

    /// Engine with its statistics and events
    pub fn engine(&self) -> &LiquidationEngine {
        &self.engine
    }

    /// Run `blocks` blocks
    pub fn run(&mut self, blocks: u64) -> Result<Vec<BlockReport>> {
        (0..blocks).map(|_| self.step()).collect()
    }

    /// Apply this block's price moves, run the engine, then deliver this
    /// block's auction results
    pub fn step(&mut self) -> Result<BlockReport> {
        let block = self.block;

        for change in self.scenario.price_moves.iter().filter(|m| m.height == block.height) {
            tracing::info!(
                "Height {}: price of asset {} -> {}",
                block.height,
                change.asset_id,
                change.price
            );
            self.state.set_price(change.asset_id, change.price)?;
        }

        let sweep = self.engine.begin_block(&mut self.state, &block)?;

        let results: Vec<AuctionResult> = self
            .scenario
            .auctions
            .iter()
            .filter(|a| a.height == block.height)
            .cloned()
            .collect();
        let mut restorations = Vec::with_capacity(results.len());
        for result in results {
            restorations.push(self.deliver_auction(&block, &result)?);
        }

        self.block = block.next(self.scenario.block_secs);
        Ok(BlockReport {
            height: block.height,
            sweep,
            restorations,
        })
    }

    /// Apply an auction result to its vault and run restoration
    fn deliver_auction(
        &mut self,
        block: &BlockContext,
        result: &AuctionResult,
    ) -> Result<RestorationReport> {
        let mut report = RestorationReport {
            app_id: result.app_id,
            locked_vault_id: result.locked_vault_id,
            outcome: None,
            error: None,
        };

        let auction = match self.settle_auction(block, result) {
            Ok(auction) => auction,
            Err(e) if e.is_item_scoped() => {
                report.error = Some(e.to_string());
                return Ok(report);
            }
            Err(e) => return Err(e),
        };

        match self.engine.unliquidate(
            &mut self.state,
            block,
            result.app_id,
            result.locked_vault_id,
            &auction,
        ) {
            Ok(outcome) => report.outcome = Some(outcome),
            Err(e) if e.is_item_scoped() => report.error = Some(e.to_string()),
            Err(e) => return Err(e),
        }
        Ok(report)
    }

    fn settle_auction(
        &mut self,
        block: &BlockContext,
        result: &AuctionResult,
    ) -> Result<DutchAuction> {
        let mut vault = self
            .state
            .locked_vault(result.app_id, result.locked_vault_id)?
            .ok_or_else(|| {
                Error::missing(
                    "locked vault",
                    format!("{}/{}", result.app_id, result.locked_vault_id),
                )
            })?;
        let pair = self
            .state
            .lend_pair(vault.extended_pair_id)?
            .ok_or_else(|| Error::missing("lend pair", vault.extended_pair_id))?;
        let denom = |id: AssetId| -> Result<String> {
            self.state
                .asset(id)?
                .map(|a| a.denom)
                .ok_or_else(|| Error::missing("asset", id))
        };
        let (denom_in, denom_out) = (denom(pair.asset_in)?, denom(pair.asset_out)?);

        let offered = vault.amount_in;
        let target = vault.updated_amount_out;
        vault.amount_in = safe_sub(vault.amount_in, result.collateral_sold)?;
        vault.amount_out = vault.amount_out.saturating_sub(result.debt_repaid);
        vault.updated_amount_out = safe_sub(vault.updated_amount_out, result.debt_repaid)?;
        vault.is_auction_in_progress = false;
        vault.is_auction_complete = true;
        self.state.set_locked_vault(&vault)?;

        let price = |id: AssetId| -> Result<Decimal> {
            Ok(Decimal::from(self.state.price(id)?.unwrap_or_default()))
        };
        let sold_ratio = if result.collateral_sold == 0 {
            Decimal::ZERO
        } else {
            checked_div(
                amount_to_decimal(result.debt_repaid)?,
                amount_to_decimal(result.collateral_sold)?,
                "auction clearing price",
            )?
        };

        Ok(DutchAuction {
            auction_id: result.locked_vault_id,
            app_id: result.app_id,
            locked_vault_id: result.locked_vault_id,
            outflow_token_init_amount: Coin::new(denom_in.clone(), offered),
            outflow_token_current_amount: Coin::new(denom_in, vault.amount_in),
            inflow_token_target_amount: Coin::new(denom_out.clone(), target),
            inflow_token_current_amount: Coin::new(denom_out, result.debt_repaid),
            outflow_token_init_price: price(pair.asset_in)?,
            outflow_token_current_price: sold_ratio,
            start_time: vault.liquidation_timestamp,
            end_time: block.time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "start_time": 1700000000,
        "assets": [
            {"id": 1, "denom": "uatom"},
            {"id": 2, "denom": "ucmst"},
            {"id": 3, "denom": "uharbor"},
            {"id": 4, "denom": "cuatom"},
            {"id": 5, "denom": "uosmo"}
        ],
        "rates": [
            {"asset_id": 1, "ltv": "0.8", "liquidation_threshold": "0.85",
             "liquidation_penalty": "0.05", "liquidation_bonus": "0.05", "c_asset_id": 4},
            {"asset_id": 2, "ltv": "0.6", "liquidation_threshold": "0.9",
             "liquidation_penalty": "0.05", "liquidation_bonus": "0.05", "c_asset_id": 6},
            {"asset_id": 3, "ltv": "0.5", "liquidation_threshold": "0.8",
             "liquidation_penalty": "0.05", "liquidation_bonus": "0.05", "c_asset_id": 7}
        ],
        "pools": [{"id": 1, "module_name": "pool1", "first_bridged_asset_id": 2, "second_bridged_asset_id": 3}],
        "pairs": [{"id": 1, "asset_in": 1, "asset_out": 5, "asset_out_pool_id": 1, "is_inter_pool": false}],
        "lends": [{"id": 1, "owner": "comdex1owner", "app_id": 3, "pool_id": 1, "asset_id": 1,
                   "amount_in": {"denom": "uatom", "amount": 1000000000}, "updated_amount_in": 1000000000}],
        "borrows": [{"id": 1, "lending_id": 1, "pair_id": 1,
                     "amount_in": {"denom": "cuatom", "amount": 1000000000},
                     "amount_out": {"denom": "uosmo", "amount": 700000000},
                     "bridged_asset_amount": {"denom": "ucmst", "amount": 0}}],
        "prices": [{"asset_id": 1, "price": 1}, {"asset_id": 2, "price": 1},
                   {"asset_id": 3, "price": 1}, {"asset_id": 5, "price": 1}],
        "balances": [{"account": "pool1", "coin": {"denom": "uatom", "amount": 1000000000}},
                     {"account": "pool1", "coin": {"denom": "cuatom", "amount": 1000000000}}],
        "price_moves": [{"height": 2, "asset_id": 5, "price": 2}],
        "auctions": [{"height": 3, "app_id": 3, "locked_vault_id": 1,
                      "collateral_sold": 100000000, "debt_repaid": 700000000}]
    }"#;

    #[test]
    fn test_scenario_parses_and_seeds() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert_eq!(scenario.block_secs, 6);
        assert!(scenario.validate(&LiquidationConfig::default()).is_ok());

        let state = scenario.seed().unwrap();
        assert_eq!(state.borrow_ids().unwrap(), Some(vec![1]));
        assert_eq!(state.borrow_stats(1).unwrap().total_borrowed, 700_000_000);
    }

    #[test]
    fn test_simulation_locks_then_restores() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let mut sim = Simulation::new(scenario, LiquidationConfig::default()).unwrap();

        let reports = sim.run(3).unwrap();
        assert!(reports[0].sweep.locked.is_empty());
        assert_eq!(reports[1].sweep.locked.len(), 1);
        assert_eq!(reports[2].restorations.len(), 1);

        let restoration = &reports[2].restorations[0];
        let outcome = restoration.outcome.as_ref().unwrap();
        let returned = outcome.closed.clone().unwrap();
        assert_eq!(returned.denom, "cuatom");
        assert_eq!(
            sim.state().balance("comdex1owner", "cuatom").unwrap(),
            returned.amount
        );
        assert!(sim.state().locked_vaults().unwrap().is_empty());
        assert_eq!(sim.engine().statistics().total_locked, 1);
    }

    #[test]
    fn test_unknown_vault_auction_is_reported() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.auctions[0].locked_vault_id = 42;
        let mut sim = Simulation::new(scenario, LiquidationConfig::default()).unwrap();

        let reports = sim.run(3).unwrap();
        assert!(reports[2].restorations[0].error.is_some());
    }
}
