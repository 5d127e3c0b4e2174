//! Shared fixtures for the liquidation unit tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::core::auction::DutchAuction;
use crate::core::borrow::*;
use crate::core::config::LiquidationConfig;
use crate::core::types::*;
use crate::core::vault::LockedVault;
use crate::ledger::*;
use crate::liquidation::lock::create_locked_borrow;
use crate::storage::{InMemoryStore, StateManager};
use crate::utils::math::amount_to_decimal;

pub type TestState = StateManager<InMemoryStore>;

pub const APP_ID: AppId = 3;
pub const OWNER: &str = "comdex1owner";
pub const LEND_ID: LendId = 1;
pub const PAIR_ID: PairId = 1;
pub const POOL_ID: PoolId = 1;
pub const POOL_MODULE: &str = "pool1";
pub const ASSET_IN: AssetId = 1;
pub const FIRST_BRIDGE: AssetId = 2;
pub const SECOND_BRIDGE: AssetId = 3;
pub const C_ASSET: AssetId = 4;
pub const ASSET_OUT: AssetId = 5;
pub const COLLATERAL: Amount = 1_000_000_000;

fn rates(asset_id: AssetId, lt: i64, ltv: i64, c_asset_id: AssetId) -> AssetRatesStats {
    AssetRatesStats {
        asset_id,
        ltv: Decimal::new(ltv, 2),
        liquidation_threshold: Decimal::new(lt, 2),
        liquidation_penalty: Decimal::new(5, 2),
        liquidation_bonus: Decimal::new(5, 2),
        c_asset_id,
    }
}

/// One pool, one pair (uatom → uosmo), one lend position; every price is 1
pub fn fixture() -> (TestState, LiquidationConfig) {
    let mut state = StateManager::new(InMemoryStore::new());

    for (id, denom) in [
        (ASSET_IN, "uatom"),
        (FIRST_BRIDGE, "ucmst"),
        (SECOND_BRIDGE, "uharbor"),
        (C_ASSET, "cuatom"),
        (ASSET_OUT, "uosmo"),
    ] {
        state.set_asset(&Asset::new(id, denom)).unwrap();
        state.set_price(id, 1).unwrap();
    }
    state.set_asset_rates_stats(&rates(ASSET_IN, 85, 80, C_ASSET)).unwrap();
    state.set_asset_rates_stats(&rates(FIRST_BRIDGE, 90, 60, 6)).unwrap();
    state.set_asset_rates_stats(&rates(SECOND_BRIDGE, 80, 50, 7)).unwrap();
    state
        .set_pool(&Pool {
            id: POOL_ID,
            module_name: POOL_MODULE.into(),
            first_bridged_asset_id: FIRST_BRIDGE,
            second_bridged_asset_id: SECOND_BRIDGE,
        })
        .unwrap();
    state
        .set_lend_pair(&LendPair {
            id: PAIR_ID,
            asset_in: ASSET_IN,
            asset_out: ASSET_OUT,
            asset_out_pool_id: POOL_ID,
            is_inter_pool: false,
        })
        .unwrap();

    state.set_lend(&lend_fixture()).unwrap();
    state.mint(POOL_MODULE, &Coin::new("uatom", COLLATERAL)).unwrap();
    state.mint(POOL_MODULE, &Coin::new("cuatom", COLLATERAL)).unwrap();

    (state, LiquidationConfig::default())
}

pub fn lend_fixture() -> LendPosition {
    LendPosition {
        id: LEND_ID,
        owner: OWNER.into(),
        app_id: APP_ID,
        pool_id: POOL_ID,
        asset_id: ASSET_IN,
        amount_in: Coin::new("uatom", COLLATERAL),
        updated_amount_in: COLLATERAL,
        available_to_borrow: 0,
    }
}

pub fn borrow_fixture(id: BorrowId, amount_out: Amount, interest: Amount) -> BorrowPosition {
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
        created_at: DateTime::<Utc>::default(),
    }
}

pub fn block(height: u64) -> BlockContext {
    BlockContext::at_unix(height, 1_700_000_000 + height as i64 * 6)
}

/// Lock a borrow of `amount_out` directly, without running the sizer
pub fn lock_fixture(
    state: &mut TestState,
    config: &LiquidationConfig,
    amount_out: Amount,
) -> LockedVault {
    let borrow = borrow_fixture(1, amount_out, 0);
    let ratio = amount_to_decimal(amount_out).unwrap() / amount_to_decimal(COLLATERAL).unwrap();
    create_locked_borrow(state, config, &borrow, &lend_fixture(), ratio, APP_ID, &block(1)).unwrap()
}

pub fn auction(locked_vault_id: VaultId) -> DutchAuction {
    DutchAuction {
        auction_id: 1,
        app_id: APP_ID,
        locked_vault_id,
        outflow_token_init_amount: Coin::new("uatom", 100),
        outflow_token_current_amount: Coin::zero("uatom"),
        inflow_token_target_amount: Coin::new("uosmo", 100),
        inflow_token_current_amount: Coin::new("uosmo", 100),
        outflow_token_init_price: Decimal::ONE,
        outflow_token_current_price: Decimal::ONE,
        start_time: DateTime::<Utc>::default(),
        end_time: DateTime::<Utc>::default(),
    }
}
