//! Lock transition: freeze an unhealthy borrow into a locked vault.

use rust_decimal::Decimal;

use crate::core::borrow::{BorrowPosition, LendPosition};
use crate::core::config::LiquidationConfig;
use crate::core::types::{AppId, BlockContext};
use crate::core::vault::{BorrowMetaData, LockedVault, LockedVaultKind};
use crate::error::{Error, Result};
use crate::ledger::LockedVaultStore;

/// Snapshot `borrow` into a new locked vault and persist it.
///
/// The vault is written before the id counter is advanced.
pub fn create_locked_borrow<S: LockedVaultStore + ?Sized>(
    store: &mut S,
    config: &LiquidationConfig,
    borrow: &BorrowPosition,
    lend: &LendPosition,
    ratio: Decimal,
    app_id: AppId,
    block: &BlockContext,
) -> Result<LockedVault> {
    let locked_vault_id = store
        .locked_vault_id()?
        .checked_add(1)
        .ok_or_else(|| Error::overflow("locked vault id counter"))?;

    let vault = LockedVault {
        locked_vault_id,
        app_id,
        original_vault_id: borrow.id,
        extended_pair_id: borrow.pair_id,
        owner: lend.owner.clone(),
        amount_in: borrow.amount_in.amount,
        amount_out: borrow.amount_out.amount,
        updated_amount_out: borrow.updated_amount_out()?,
        interest_accumulated: borrow.interest_accumulated,
        initiator: config.initiator.clone(),
        cr_at_liquidation: ratio,
        current_collateralization_ratio: ratio,
        collateral_to_be_auctioned: Decimal::ZERO,
        liquidation_timestamp: block.time,
        sell_off_history: Vec::new(),
        penalty_settled: false,
        is_auction_in_progress: false,
        is_auction_complete: false,
        kind: LockedVaultKind::Borrow(BorrowMetaData {
            lending_id: borrow.lending_id,
            is_stable_borrow: borrow.is_stable_borrow,
            stable_borrow_rate: borrow.stable_borrow_rate,
            bridged_asset_amount: borrow.bridged_asset_amount.clone(),
        }),
    };

    store.set_locked_vault(&vault)?;
    store.set_locked_vault_id(locked_vault_id)?;

    tracing::info!(
        "Locked borrow {} as vault {} (app {}, ratio {})",
        borrow.id,
        locked_vault_id,
        app_id,
        ratio
    );
    Ok(vault)
}
