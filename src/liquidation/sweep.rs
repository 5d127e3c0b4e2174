//! Liquidation sweep: health-check every open borrow and lock the unhealthy
//! ones, then run the sell-off sizer over all locked vaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::borrow::{BorrowPosition, LendPair, LendPosition};
use crate::core::config::LiquidationConfig;
use crate::core::types::*;
use crate::error::{Error, Result};
use crate::ledger::LiquidationContext;
use crate::liquidation::events::SkippedItem;
use crate::liquidation::lock::create_locked_borrow;
use crate::liquidation::ratio::collateralization_ratio;
use crate::liquidation::selloff::{update_locked_borrows, SellOffReport};
use crate::liquidation::threshold::RiskProfile;

/// A borrow the sweep locked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBorrow {
    /// Original borrow id
    pub borrow_id: BorrowId,
    /// Application of the new vault
    pub app_id: AppId,
    /// New vault id
    pub locked_vault_id: VaultId,
    /// Ratio at lock time
    pub ratio: Decimal,
    /// Threshold it breached
    pub threshold: Decimal,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Borrow ids examined
    pub examined: usize,
    /// Borrows locked, in id order
    pub locked: Vec<LockedBorrow>,
    /// Borrows skipped on item-scoped errors
    pub skipped: Vec<SkippedItem>,
    /// Sizing pass run after the health checks
    pub sizing: SellOffReport,
}

/// Run the health checks for one block.
///
/// Ids are processed in ascending order. A position whose references cannot
/// be resolved or priced is skipped; the sizer's error, if any, is the
/// sweep's error.
pub fn liquidate_borrows<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    config: &LiquidationConfig,
    block: &BlockContext,
) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    match ctx.borrow_ids()? {
        None => tracing::debug!("No open borrow index at height {}", block.height),
        Some(mut ids) => {
            ids.sort_unstable();
            ids.dedup();
            for id in ids {
                report.examined += 1;
                match check_borrow(ctx, config, block, id) {
                    Ok(Some(locked)) => report.locked.push(locked),
                    Ok(None) => {}
                    Err(e) if e.is_item_scoped() => {
                        tracing::debug!("Skipping borrow {}: {}", id, e);
                        report.skipped.push(SkippedItem::borrow(id, &e));
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    report.sizing = update_locked_borrows(ctx, config)?;
    Ok(report)
}

fn check_borrow<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    config: &LiquidationConfig,
    block: &BlockContext,
    id: BorrowId,
) -> Result<Option<LockedBorrow>> {
    let borrow = ctx.borrow(id)?.ok_or_else(|| Error::missing("borrow", id))?;
    let pair = ctx
        .lend_pair(borrow.pair_id)?
        .ok_or_else(|| Error::missing("lend pair", borrow.pair_id))?;
    let lend = ctx
        .lend(borrow.lending_id)?
        .ok_or_else(|| Error::missing("lend position", borrow.lending_id))?;
    let pool = ctx
        .pool(lend.pool_id)?
        .ok_or_else(|| Error::missing("pool", lend.pool_id))?;
    let asset_in = ctx
        .asset(pair.asset_in)?
        .ok_or_else(|| Error::missing("asset", pair.asset_in))?;
    let asset_out = ctx
        .asset(pair.asset_out)?
        .ok_or_else(|| Error::missing("asset", pair.asset_out))?;
    let profile = RiskProfile::resolve(&*ctx, &pair, &pool, &borrow.bridged_asset_amount)?;

    let threshold = profile.liquidation_threshold()?;
    let ratio = collateralization_ratio(
        &*ctx,
        borrow.amount_in.amount,
        &asset_in,
        borrow.updated_amount_out()?,
        &asset_out,
    )?;
    if ratio <= threshold {
        return Ok(None);
    }

    let vault = create_locked_borrow(ctx, config, &borrow, &lend, ratio, lend.app_id, block)?;
    if let Err(e) = retire_borrow(ctx, &borrow, &lend, &pair) {
        tracing::warn!(
            "Index cleanup for borrow {} locked as vault {} failed: {}",
            id,
            vault.locked_vault_id,
            e
        );
    }

    Ok(Some(LockedBorrow {
        borrow_id: id,
        app_id: vault.app_id,
        locked_vault_id: vault.locked_vault_id,
        ratio,
        threshold,
    }))
}

/// Remove a locked borrow from the ledger, its stats and its indexes.
///
/// The primary index goes first and the record last. Every step is attempted;
/// the first failure is returned.
fn retire_borrow<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    borrow: &BorrowPosition,
    lend: &LendPosition,
    pair: &LendPair,
) -> Result<()> {
    let mut first_error: Option<Error> = None;
    let mut keep = |result: Result<()>| {
        if let Err(e) = result {
            first_error.get_or_insert(e);
        }
    };

    keep(ctx.update_borrow_ids(borrow.id, false));
    keep(ctx.update_owner_borrow_ids(&lend.owner, borrow.id, false));
    keep(ctx.update_owner_pool_borrow_ids(&lend.owner, pair.asset_out_pool_id, borrow.id, false));
    keep(ctx.update_borrow_stats(pair, borrow.is_stable_borrow, borrow.amount_out.amount, false));
    keep(ctx.delete_borrow(borrow.id).map(|_| ()));

    first_error.map_or(Ok(()), Err)
}
