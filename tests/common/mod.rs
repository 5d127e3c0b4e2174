//! Shared market fixture for the integration and property tests.

#![allow(dead_code)]

use borrow_liquidation::ledger::*;
use borrow_liquidation::prelude::*;
use rust_decimal::Decimal;

pub type State = StateManager<InMemoryStore>;

pub const APP_ID: u64 = 3;
pub const OWNER: &str = "comdex1owner";
pub const LEND_ID: u64 = 1;
pub const PAIR_ID: u64 = 1;
pub const POOL_ID: u64 = 1;
pub const POOL_MODULE: &str = "pool1";
pub const COLLATERAL: u128 = 1_000_000_000;

fn rates(asset_id: u64, lt: i64, ltv: i64, c_asset_id: u64) -> AssetRatesStats {
    AssetRatesStats {
        asset_id,
        ltv: Decimal::new(ltv, 2),
        liquidation_threshold: Decimal::new(lt, 2),
        liquidation_penalty: Decimal::new(5, 2),
        liquidation_bonus: Decimal::new(5, 2),
        c_asset_id,
    }
}

/// uatom (1) lent into pool1 and borrowed against for uosmo (5).
/// Bridges are ucmst (2) and uharbor (3); the receipt token is cuatom (4).
/// Every price is 1.
pub fn market(fund_pool: bool) -> State {
    let mut state = StateManager::new(InMemoryStore::new());
    for (id, denom) in [(1, "uatom"), (2, "ucmst"), (3, "uharbor"), (4, "cuatom"), (5, "uosmo")] {
        state.set_asset(&Asset::new(id, denom)).unwrap();
        state.set_price(id, 1).unwrap();
    }
    state.set_asset_rates_stats(&rates(1, 85, 80, 4)).unwrap();
    state.set_asset_rates_stats(&rates(2, 90, 60, 6)).unwrap();
    state.set_asset_rates_stats(&rates(3, 80, 50, 7)).unwrap();
    state
        .set_pool(&Pool {
            id: POOL_ID,
            module_name: POOL_MODULE.into(),
            first_bridged_asset_id: 2,
            second_bridged_asset_id: 3,
        })
        .unwrap();
    state
        .set_lend_pair(&LendPair {
            id: PAIR_ID,
            asset_in: 1,
            asset_out: 5,
            asset_out_pool_id: POOL_ID,
            is_inter_pool: false,
        })
        .unwrap();
    state
        .set_lend(&LendPosition {
            id: LEND_ID,
            owner: OWNER.into(),
            app_id: APP_ID,
            pool_id: POOL_ID,
            asset_id: 1,
            amount_in: Coin::new("uatom", COLLATERAL),
            updated_amount_in: COLLATERAL,
            available_to_borrow: 0,
        })
        .unwrap();
    if fund_pool {
        state.mint(POOL_MODULE, &Coin::new("uatom", 10 * COLLATERAL)).unwrap();
        state.mint(POOL_MODULE, &Coin::new("cuatom", 10 * COLLATERAL)).unwrap();
    }
    state
}

pub fn borrow(id: u64, amount_out: u128, interest: u128) -> BorrowPosition {
    BorrowPosition {
        id,
        lending_id: LEND_ID,
        pair_id: PAIR_ID,
        amount_in: Coin::new("cuatom", COLLATERAL),
        amount_out: Coin::new("uosmo", amount_out),
        interest_accumulated: interest,
        bridged_asset_amount: Coin::zero("ucmst"),
        is_stable_borrow: false,
        stable_borrow_rate: Decimal::ZERO,
        created_at: Default::default(),
    }
}

pub fn block(height: u64) -> BlockContext {
    BlockContext::at_unix(height, 1_700_000_000 + height as i64 * 6)
}

pub fn auction(locked_vault_id: u64) -> DutchAuction {
    DutchAuction {
        auction_id: locked_vault_id,
        app_id: APP_ID,
        locked_vault_id,
        outflow_token_init_amount: Coin::new("uatom", 100),
        outflow_token_current_amount: Coin::zero("uatom"),
        inflow_token_target_amount: Coin::new("uosmo", 100),
        inflow_token_current_amount: Coin::new("uosmo", 100),
        outflow_token_init_price: Decimal::ONE,
        outflow_token_current_price: Decimal::ONE,
        start_time: Default::default(),
        end_time: Default::default(),
    }
}

/// Mark a vault's auction as finished with the given remaining amounts
pub fn finish_auction(state: &mut State, vault_id: u64, amount_in: u128, debt: u128) -> LockedVault {
    let mut vault = state.locked_vault(APP_ID, vault_id).unwrap().unwrap();
    vault.amount_in = amount_in;
    vault.amount_out = debt;
    vault.updated_amount_out = debt;
    vault.is_auction_in_progress = false;
    vault.is_auction_complete = true;
    state.set_locked_vault(&vault).unwrap();
    vault
}
