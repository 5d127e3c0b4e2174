//! Bridge-aware threshold resolution shared by the sweep, the sizer and
//! restoration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::borrow::{AssetRatesStats, LendPair, Pool};
use crate::core::types::Coin;
use crate::error::{Error, Result};
use crate::ledger::AssetRegistry;
use crate::utils::math::checked_mul;

/// Which of the pool's bridge assets a position is routed through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeRoute {
    /// No bridge routing
    Direct,
    /// Routed through the pool's first bridge asset
    First,
    /// Routed through the pool's second bridge asset
    Second,
}

/// Risk parameters that apply to one position or vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskProfile {
    /// Parameters of the pair's collateral asset
    pub collateral: AssetRatesStats,
    /// Route taken
    pub route: BridgeRoute,
    /// Parameters of the bridge asset, when routed
    pub bridge: Option<AssetRatesStats>,
}

impl RiskProfile {
    /// Resolve the profile of a position on `pair` in `pool` carrying
    /// `bridged`.
    ///
    /// The collateral asset's stats, both bridge assets' stats and the first
    /// bridge asset's metadata must all be present; the bridge is matched on
    /// denom, not id.
    pub fn resolve<R: AssetRegistry + ?Sized>(
        registry: &R,
        pair: &LendPair,
        pool: &Pool,
        bridged: &Coin,
    ) -> Result<Self> {
        let collateral = registry
            .asset_rates_stats(pair.asset_in)?
            .ok_or_else(|| Error::missing("asset rates stats", pair.asset_in))?;
        let first = registry
            .asset_rates_stats(pool.first_bridged_asset_id)?
            .ok_or_else(|| Error::missing("asset rates stats", pool.first_bridged_asset_id))?;
        let second = registry
            .asset_rates_stats(pool.second_bridged_asset_id)?
            .ok_or_else(|| Error::missing("asset rates stats", pool.second_bridged_asset_id))?;
        let first_asset = registry
            .asset(pool.first_bridged_asset_id)?
            .ok_or_else(|| Error::missing("asset", pool.first_bridged_asset_id))?;

        let (route, bridge) = if bridged.is_zero() {
            (BridgeRoute::Direct, None)
        } else if bridged.denom == first_asset.denom {
            (BridgeRoute::First, Some(first))
        } else {
            (BridgeRoute::Second, Some(second))
        };

        Ok(Self {
            collateral,
            route,
            bridge,
        })
    }

    /// Ratio above which the position is liquidated
    pub fn liquidation_threshold(&self) -> Result<Decimal> {
        match &self.bridge {
            Some(bridge) => checked_mul(
                self.collateral.liquidation_threshold,
                bridge.liquidation_threshold,
                "bridged liquidation threshold",
            ),
            None => Ok(self.collateral.liquidation_threshold),
        }
    }

    /// Collateral factor `c` of the sell-off formula
    pub fn collateral_factor(&self) -> Result<Decimal> {
        match &self.bridge {
            Some(bridge) => checked_mul(
                self.collateral.liquidation_threshold,
                bridge.ltv,
                "collateral factor",
            ),
            None => Ok(self.collateral.liquidation_threshold),
        }
    }
}
