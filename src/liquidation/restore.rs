//! Restoration engine: settle a locked vault once its auction has finished.
//!
//! A vault whose debt reached zero is closed and its remaining receipt tokens
//! go back to the owner. Independently of that, the post-auction ratio decides
//! whether the vault stays locked and is resized, or is dissolved into a fresh
//! borrow position.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::auction::DutchAuction;
use crate::core::borrow::BorrowPosition;
use crate::core::config::LiquidationConfig;
use crate::core::types::*;
use crate::core::vault::{BorrowMetaData, LockedVault, LockedVaultKind};
use crate::error::{Error, Result};
use crate::ledger::LiquidationContext;
use crate::liquidation::ratio::collateralization_ratio;
use crate::liquidation::selloff::{update_locked_borrows, SellOffReport, VaultContext};
use crate::utils::math::safe_add;

/// What the ratio check did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestorationBranch {
    /// Not a borrow vault, or its auction has not completed
    Untouched,
    /// The vault stays locked and was resized
    StillLiquidating {
        /// Post-auction ratio
        ratio: Decimal,
        /// Sizing pass triggered by the restoration
        sizing: SellOffReport,
    },
    /// The vault was converted back into an open borrow
    Reopened {
        /// New borrow id
        borrow_id: BorrowId,
        /// Post-auction ratio
        ratio: Decimal,
    },
    /// The ratio could not be computed after a close-out
    RatioUnavailable {
        /// Error code
        code: u32,
        /// Error message
        reason: String,
    },
}

/// Outcome of restoring one vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationOutcome {
    /// Receipt tokens returned to the owner when the debt was fully repaid
    pub closed: Option<Coin>,
    /// Ratio branch taken
    pub branch: RestorationBranch,
}

impl RestorationOutcome {
    fn untouched() -> Self {
        Self {
            closed: None,
            branch: RestorationBranch::Untouched,
        }
    }
}

/// Restore vault `(app_id, vault_id)` after `auction` finished
pub fn unliquidate_locked_borrow<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    config: &LiquidationConfig,
    block: &BlockContext,
    app_id: AppId,
    vault_id: VaultId,
    auction: &DutchAuction,
) -> Result<RestorationOutcome> {
    let mut vault = ctx
        .locked_vault(app_id, vault_id)?
        .ok_or_else(|| Error::missing("locked vault", format!("{}/{}", app_id, vault_id)))?;
    let meta = match &vault.kind {
        LockedVaultKind::Borrow(meta) => meta.clone(),
        LockedVaultKind::Cdp(_) => return Ok(RestorationOutcome::untouched()),
    };
    if !vault.is_auction_complete {
        return Ok(RestorationOutcome::untouched());
    }

    let resolved = VaultContext::resolve(&*ctx, &vault, &meta)?;
    let threshold = resolved.profile.liquidation_threshold()?;
    let mut outcome = RestorationOutcome::untouched();

    if vault.amount_out == 0 {
        outcome.closed = Some(close_vault(ctx, block, &vault, &resolved)?);
    }

    let ratio = match collateralization_ratio(
        &*ctx,
        vault.amount_in,
        &resolved.asset_in,
        vault.updated_amount_out,
        &resolved.asset_out,
    ) {
        Ok(ratio) => ratio,
        Err(e) if outcome.closed.is_some() && e.is_item_scoped() => {
            tracing::warn!("No ratio for closed vault {}/{}: {}", app_id, vault_id, e);
            outcome.branch = RestorationBranch::RatioUnavailable {
                code: e.code(),
                reason: e.to_string(),
            };
            return Ok(outcome);
        }
        Err(e) => return Err(e),
    };

    if ratio > threshold {
        vault.record_sell_off(auction.to_string());
        vault.current_collateralization_ratio = ratio;
        ctx.set_locked_vault(&vault)?;
        tracing::info!(
            "Vault {}/{} stays locked after auction {} (ratio {})",
            app_id,
            vault_id,
            auction.auction_id,
            ratio
        );
        let sizing = update_locked_borrows(ctx, config)?;
        outcome.branch = RestorationBranch::StillLiquidating { ratio, sizing };
    } else {
        ctx.create_locked_vault_history(&vault, block.time)?;
        ctx.delete_borrow_for_owner_by_pair(&vault.owner, vault.extended_pair_id)?;
        let borrow_id = reopen_borrow(ctx, block, &vault, &meta, &resolved)?;
        ctx.delete_locked_vault(app_id, vault_id)?;
        tracing::info!(
            "Vault {}/{} reopened as borrow {} (ratio {})",
            app_id,
            vault_id,
            borrow_id,
            ratio
        );
        outcome.branch = RestorationBranch::Reopened { borrow_id, ratio };
    }

    Ok(outcome)
}

/// Archive and delete a fully repaid vault, returning its collateral
fn close_vault<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    block: &BlockContext,
    vault: &LockedVault,
    resolved: &VaultContext,
) -> Result<Coin> {
    let mut lend = resolved.lend.clone();
    lend.available_to_borrow = safe_add(lend.available_to_borrow, vault.amount_in)?;
    let returned = Coin::new(resolved.c_asset.denom.clone(), vault.amount_in);

    ctx.create_locked_vault_history(vault, block.time)?;
    ctx.delete_borrow_for_owner_by_pair(&vault.owner, vault.extended_pair_id)?;
    ctx.delete_locked_vault(vault.app_id, vault.locked_vault_id)?;
    ctx.send_module_to_account(&resolved.pool.module_name, &vault.owner, &returned)?;
    ctx.set_lend(&lend)?;

    tracing::info!(
        "Closed vault {}/{}, returned {} to {}",
        vault.app_id,
        vault.locked_vault_id,
        returned,
        vault.owner
    );
    Ok(returned)
}

/// Materialize a fresh borrow from the vault's current amounts and register
/// it in every ledger index and the pair stats
fn reopen_borrow<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    block: &BlockContext,
    vault: &LockedVault,
    meta: &BorrowMetaData,
    resolved: &VaultContext,
) -> Result<BorrowId> {
    let id = ctx.next_borrow_id()?;
    let borrow = BorrowPosition {
        id,
        lending_id: meta.lending_id,
        pair_id: vault.extended_pair_id,
        amount_in: Coin::new(resolved.c_asset.denom.clone(), vault.amount_in),
        amount_out: Coin::new(resolved.asset_out.denom.clone(), vault.updated_amount_out),
        interest_accumulated: 0,
        bridged_asset_amount: meta.bridged_asset_amount.clone(),
        is_stable_borrow: meta.is_stable_borrow,
        stable_borrow_rate: meta.stable_borrow_rate,
        created_at: block.time,
    };

    let owner = resolved.lend.owner.as_str();
    ctx.set_borrow(&borrow)?;
    ctx.update_borrow_ids(id, true)?;
    ctx.update_owner_borrow_ids(owner, id, true)?;
    ctx.update_owner_pool_borrow_ids(owner, resolved.pair.asset_out_pool_id, id, true)?;
    ctx.set_borrow_for_owner_by_pair(owner, resolved.pair.id, id)?;
    ctx.update_borrow_stats(
        &resolved.pair,
        borrow.is_stable_borrow,
        borrow.amount_out.amount,
        true,
    )?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::*;
    use crate::liquidation::test_support::*;

    fn complete(state: &mut TestState, mut vault: LockedVault) -> LockedVault {
        vault.is_auction_complete = true;
        state.set_locked_vault(&vault).unwrap();
        vault
    }

    #[test]
    fn test_missing_vault() {
        let (mut state, config) = fixture();
        let err = unliquidate_locked_borrow(&mut state, &config, &block(2), APP_ID, 9, &auction(9))
            .unwrap_err();
        assert!(matches!(err, Error::LookupMissing { .. }));
    }

    #[test]
    fn test_incomplete_auction_is_untouched() {
        let (mut state, config) = fixture();
        let vault = lock_fixture(&mut state, &config, 950_000_000);
        let outcome = unliquidate_locked_borrow(
            &mut state,
            &config,
            &block(2),
            APP_ID,
            vault.locked_vault_id,
            &auction(vault.locked_vault_id),
        )
        .unwrap();
        assert_eq!(outcome, RestorationOutcome::untouched());
        assert_eq!(state.locked_vault(APP_ID, vault.locked_vault_id).unwrap(), Some(vault));
    }

    #[test]
    fn test_recovered_vault_reopens() {
        let (mut state, config) = fixture();
        let mut vault = lock_fixture(&mut state, &config, 950_000_000);
        vault.amount_in = 600_000_000;
        vault.amount_out = 300_000_000;
        vault.updated_amount_out = 300_000_000;
        let vault = complete(&mut state, vault);

        let outcome = unliquidate_locked_borrow(
            &mut state,
            &config,
            &block(2),
            APP_ID,
            vault.locked_vault_id,
            &auction(vault.locked_vault_id),
        )
        .unwrap();

        let borrow_id = match outcome.branch {
            RestorationBranch::Reopened { borrow_id, ratio } => {
                assert_eq!(ratio, Decimal::new(5, 1));
                borrow_id
            }
            other => panic!("unexpected branch {:?}", other),
        };
        assert!(outcome.closed.is_none());
        let borrow = state.borrow(borrow_id).unwrap().unwrap();
        assert_eq!(borrow.amount_in.amount, 600_000_000);
        assert_eq!(borrow.amount_out.amount, 300_000_000);
        assert_eq!(borrow.interest_accumulated, 0);
        assert_eq!(state.borrow_ids().unwrap(), Some(vec![borrow_id]));
        assert_eq!(state.owner_borrow_ids(OWNER).unwrap(), vec![borrow_id]);
        assert_eq!(state.borrow_for_owner_by_pair(OWNER, PAIR_ID).unwrap(), Some(borrow_id));
        assert_eq!(state.borrow_stats(PAIR_ID).unwrap().total_borrowed, 300_000_000);
        assert!(state.locked_vault(APP_ID, vault.locked_vault_id).unwrap().is_none());
        assert!(state.locked_vault_history(1).unwrap().is_some());
    }

    #[test]
    fn test_still_unhealthy_vault_records_auction() {
        let (mut state, config) = fixture();
        let mut vault = lock_fixture(&mut state, &config, 950_000_000);
        vault.penalty_settled = true;
        vault.amount_in = 500_000_000;
        vault.updated_amount_out = 450_000_000;
        let vault = complete(&mut state, vault);
        let record = auction(vault.locked_vault_id);

        let outcome = unliquidate_locked_borrow(
            &mut state,
            &config,
            &block(2),
            APP_ID,
            vault.locked_vault_id,
            &record,
        )
        .unwrap();

        assert!(matches!(outcome.branch, RestorationBranch::StillLiquidating { .. }));
        let stored = state.locked_vault(APP_ID, vault.locked_vault_id).unwrap().unwrap();
        assert_eq!(stored.sell_off_history, vec![record.to_string()]);
        assert_eq!(stored.current_collateralization_ratio, Decimal::new(9, 1));
    }
}
