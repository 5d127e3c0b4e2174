//! Sell-off sizer.
//!
//! For every locked vault awaiting sizing, computes the market value of
//! collateral whose sale brings the position back to its collateral factor:
//!
//! ```text
//! sell_off = (total_out − c·total_in) / (deduction − b·c)
//! b        = deduction + penalty + bonus
//! ```
//!
//! The first pass over a vault also settles the penalty and bonus: the bonus
//! goes to the auction module, the penalty to the reserve, the matching receipt
//! tokens are burned and the vault and its lend position shrink by the
//! deducted collateral. The vault is then re-sized from the settled amounts,
//! so a second pass without a price or balance change writes the same values.
//!
//! Lookup, price and arithmetic failures skip the vault. A failed transfer or
//! burn aborts the whole batch.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::borrow::{Asset, LendPair, LendPosition, Pool};
use crate::core::config::LiquidationConfig;
use crate::core::types::*;
use crate::core::vault::{BorrowMetaData, LockedVault, LockedVaultKind};
use crate::error::{Error, Result};
use crate::ledger::LiquidationContext;
use crate::liquidation::events::SkippedItem;
use crate::liquidation::ratio::{value_position, Valuation};
use crate::liquidation::threshold::RiskProfile;
use crate::utils::math::*;

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything a locked borrow references, resolved up front
#[derive(Debug, Clone)]
pub struct VaultContext {
    /// Lending pair of the original borrow
    pub pair: LendPair,
    /// Lend position backing the borrow
    pub lend: LendPosition,
    /// Pool custodying the collateral
    pub pool: Pool,
    /// Collateral asset
    pub asset_in: Asset,
    /// Debt asset
    pub asset_out: Asset,
    /// Receipt asset of the collateral
    pub c_asset: Asset,
    /// Applicable risk parameters
    pub profile: RiskProfile,
}

impl VaultContext {
    /// Resolve the references of a borrow-flavored vault. Any absent record
    /// is a `LookupMissing`.
    pub fn resolve<C: LiquidationContext + ?Sized>(
        ctx: &C,
        vault: &LockedVault,
        meta: &BorrowMetaData,
    ) -> Result<Self> {
        let pair = ctx
            .lend_pair(vault.extended_pair_id)?
            .ok_or_else(|| Error::missing("lend pair", vault.extended_pair_id))?;
        let lend = ctx
            .lend(meta.lending_id)?
            .ok_or_else(|| Error::missing("lend position", meta.lending_id))?;
        let pool = ctx
            .pool(lend.pool_id)?
            .ok_or_else(|| Error::missing("pool", lend.pool_id))?;
        let profile = RiskProfile::resolve(ctx, &pair, &pool, &meta.bridged_asset_amount)?;
        let asset_in = ctx
            .asset(pair.asset_in)?
            .ok_or_else(|| Error::missing("asset", pair.asset_in))?;
        let asset_out = ctx
            .asset(pair.asset_out)?
            .ok_or_else(|| Error::missing("asset", pair.asset_out))?;
        let c_asset = ctx
            .asset(profile.collateral.c_asset_id)?
            .ok_or_else(|| Error::missing("asset", profile.collateral.c_asset_id))?;

        Ok(Self {
            pair,
            lend,
            pool,
            asset_in,
            asset_out,
            c_asset,
            profile,
        })
    }

    /// Price the vault's current amounts
    pub fn value<C: LiquidationContext + ?Sized>(
        &self,
        ctx: &C,
        vault: &LockedVault,
    ) -> Result<Valuation> {
        value_position(
            ctx,
            vault.amount_in,
            &self.asset_in,
            vault.updated_amount_out,
            &self.asset_out,
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUOTE
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of the sell-off formula for one vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOffQuote {
    /// Current ratio
    pub ratio: Decimal,
    /// Market value of collateral to release
    pub sell_off: Decimal,
    /// Collateral units to auction, capped at the vault's collateral
    pub collateral_to_be_auctioned: Decimal,
    /// Collateral units taken as penalty plus bonus
    pub deduction_units: Amount,
    /// Collateral units paid to the bidder
    pub bonus_units: Amount,
    /// Collateral units credited to the reserve
    pub penalty_units: Amount,
}

/// Evaluate the sell-off formula. Fails with `ArithmeticDegenerate` when the
/// denominator is at or below the configured cut-off.
///
/// A negative sell-off (the position recovered above its collateral factor)
/// quotes zero. Penalty and bonus units are taken from the auctionable value,
/// so they never exceed the collateral held.
pub fn quote_sell_off(
    config: &LiquidationConfig,
    profile: &RiskProfile,
    valuation: &Valuation,
    amount_in: Amount,
) -> Result<SellOffQuote> {
    let stats = &profile.collateral;
    let c = profile.collateral_factor()?;
    let penalty_and_bonus = stats.penalty_and_bonus()?;
    let b = checked_add(
        config.deduction_percentage,
        penalty_and_bonus,
        "deduction + penalty + bonus",
    )?;

    let denominator = checked_sub(
        config.deduction_percentage,
        checked_mul(b, c, "b * c")?,
        "sell-off denominator",
    )?;
    if denominator <= config.min_sell_off_denominator {
        return Err(Error::degenerate(format!(
            "sell-off denominator {} for asset {}",
            denominator, stats.asset_id
        )));
    }

    let numerator = checked_sub(
        valuation.total_out,
        checked_mul(c, valuation.total_in, "c * total in")?,
        "sell-off numerator",
    )?;
    let mut sell_off = checked_div(numerator, denominator, "sell-off amount")?;
    if sell_off.is_sign_negative() {
        tracing::debug!("Sell-off {} for asset {} clamped to zero", sell_off, stats.asset_id);
        sell_off = Decimal::ZERO;
    }

    let price_in = Decimal::from(valuation.price_in);
    let auctioned_value = sell_off.min(valuation.total_in);
    let units = |fraction: Decimal, what: &str| -> Result<Amount> {
        truncate_to_amount(checked_div(
            checked_mul(auctioned_value, fraction, what)?,
            price_in,
            what,
        )?)
    };

    let collateral_to_be_auctioned =
        checked_div(auctioned_value, price_in, "collateral to auction")?
            .min(amount_to_decimal(amount_in)?);

    let deduction_units = units(penalty_and_bonus, "liquidation deduction")?.min(amount_in);
    let bonus_units = units(stats.liquidation_bonus, "bidder bonus")?.min(deduction_units);
    let penalty_units = units(stats.liquidation_penalty, "reserve penalty")?
        .min(deduction_units.saturating_sub(bonus_units));

    Ok(SellOffQuote {
        ratio: valuation.ratio,
        sell_off,
        collateral_to_be_auctioned,
        deduction_units,
        bonus_units,
        penalty_units,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Penalty and bonus taken on a vault's first sizing pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Sent to the auction module
    pub bonus: Coin,
    /// Credited to the reserve
    pub penalty: Coin,
    /// Receipt tokens burned from the pool
    pub burned: Coin,
    /// Collateral units removed from the vault and the lend position
    pub deducted: Amount,
}

/// A vault the sizer wrote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizedVault {
    /// Application
    pub app_id: AppId,
    /// Vault id
    pub locked_vault_id: VaultId,
    /// Ratio written
    pub ratio: Decimal,
    /// Collateral units earmarked for auction
    pub collateral_to_be_auctioned: Decimal,
    /// Present on the first pass only
    pub settlement: Option<Settlement>,
}

/// Outcome of one sizing batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOffReport {
    /// Vaults (re)sized, in processing order
    pub sized: Vec<SizedVault>,
    /// Vaults skipped on item-scoped errors
    pub skipped: Vec<SkippedItem>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIZER
// ═══════════════════════════════════════════════════════════════════════════════

/// Size every locked vault in ascending `(app_id, locked_vault_id)` order
pub fn update_locked_borrows<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    config: &LiquidationConfig,
) -> Result<SellOffReport> {
    let mut report = SellOffReport::default();

    for vault in ctx.locked_vaults()? {
        let (app_id, id) = (vault.app_id, vault.locked_vault_id);
        match size_vault(ctx, config, vault) {
            Ok(Some(sized)) => report.sized.push(sized),
            Ok(None) => {}
            Err(e) if e.is_item_scoped() => {
                tracing::warn!("Skipping sell-off sizing of vault {}/{}: {}", app_id, id, e);
                report.skipped.push(SkippedItem::vault(app_id, id, &e));
            }
            Err(e) => {
                tracing::error!("Sell-off sizing aborted at vault {}/{}: {}", app_id, id, e);
                return Err(e);
            }
        }
    }

    Ok(report)
}

fn size_vault<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    config: &LiquidationConfig,
    mut vault: LockedVault,
) -> Result<Option<SizedVault>> {
    let meta = match &vault.kind {
        LockedVaultKind::Borrow(meta) => meta.clone(),
        LockedVaultKind::Cdp(_) => return Ok(None),
    };

    let resolved = VaultContext::resolve(&*ctx, &vault, &meta)?;
    let threshold = resolved.profile.liquidation_threshold()?;
    if !vault.awaits_sizing(threshold) {
        return Ok(None);
    }

    let valuation = resolved.value(&*ctx, &vault)?;
    let mut quote = quote_sell_off(config, &resolved.profile, &valuation, vault.amount_in)?;

    let mut settlement = None;
    if vault.is_first_sell_off() && !quote.sell_off.is_zero() {
        settlement = Some(settle_penalty(ctx, config, &resolved, &mut vault, &quote)?);
        let valuation = resolved.value(&*ctx, &vault)?;
        quote = quote_sell_off(config, &resolved.profile, &valuation, vault.amount_in)?;
    }

    vault.current_collateralization_ratio = quote.ratio;
    vault.collateral_to_be_auctioned = quote.collateral_to_be_auctioned;
    vault.check_invariants()?;
    ctx.set_locked_vault(&vault)?;

    tracing::debug!(
        "Sized vault {}/{}: ratio {}, collateral to auction {}",
        vault.app_id,
        vault.locked_vault_id,
        quote.ratio,
        quote.collateral_to_be_auctioned
    );

    Ok(Some(SizedVault {
        app_id: vault.app_id,
        locked_vault_id: vault.locked_vault_id,
        ratio: quote.ratio,
        collateral_to_be_auctioned: quote.collateral_to_be_auctioned,
        settlement,
    }))
}

/// Take the penalty and bonus out of the vault's collateral and persist the
/// settled vault and lend position
fn settle_penalty<C: LiquidationContext + ?Sized>(
    ctx: &mut C,
    config: &LiquidationConfig,
    resolved: &VaultContext,
    vault: &mut LockedVault,
    quote: &SellOffQuote,
) -> Result<Settlement> {
    let deducted = quote.deduction_units;
    let short = |what: &str| Error::degenerate(format!("deduction of {} exceeds {}", deducted, what));

    let vault_amount_in = vault
        .amount_in
        .checked_sub(deducted)
        .ok_or_else(|| short("vault collateral"))?;
    let mut lend = resolved.lend.clone();
    let lend_amount_in = lend
        .amount_in
        .amount
        .checked_sub(deducted)
        .ok_or_else(|| short("lend principal"))?;
    let lend_updated_amount_in = lend
        .updated_amount_in
        .checked_sub(deducted)
        .ok_or_else(|| short("lend updated principal"))?;

    let module = resolved.pool.module_name.as_str();
    let bonus = Coin::new(resolved.asset_in.denom.clone(), quote.bonus_units);
    let penalty = Coin::new(resolved.asset_in.denom.clone(), quote.penalty_units);
    let burned = Coin::new(resolved.c_asset.denom.clone(), quote.penalty_units);

    ctx.send_module_to_module(module, &config.auction_module, &bonus)?;
    ctx.update_reserve_balance(resolved.pair.asset_in, module, &penalty, true)?;
    ctx.burn(module, &burned)?;

    lend.amount_in.amount = lend_amount_in;
    lend.updated_amount_in = lend_updated_amount_in;
    ctx.set_lend(&lend)?;

    vault.amount_in = vault_amount_in;
    vault.penalty_settled = true;
    ctx.set_locked_vault(vault)?;

    tracing::info!(
        "Settled vault {}/{}: bonus {}, penalty {}, burned {}",
        vault.app_id,
        vault.locked_vault_id,
        bonus,
        penalty,
        burned
    );

    Ok(Settlement {
        bonus,
        penalty,
        burned,
        deducted,
    })
}
