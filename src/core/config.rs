//! Engine configuration.
//!
//! [`LiquidationConfig`] carries the constants of the sell-off formula and the
//! module account the bidder bonus is sent to. It is also where risk-parameter
//! combinations that would make the sell-off formula degenerate get rejected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::borrow::AssetRatesStats;
use crate::error::{Error, Result};
use crate::utils::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration of the liquidation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationConfig {
    /// Fraction of debt the sell-off targets (1.0 = full recovery)
    pub deduction_percentage: Decimal,
    /// Sell-off denominators at or below this are degenerate
    pub min_sell_off_denominator: Decimal,
    /// Initiator recorded on locked vaults
    pub initiator: String,
    /// Module account that receives the bidder bonus
    pub auction_module: String,
    /// Maximum events kept by the engine
    pub max_events: usize,
}

impl Default for LiquidationConfig {
    fn default() -> Self {
        Self {
            deduction_percentage: Decimal::ONE,
            min_sell_off_denominator: Decimal::new(MIN_SELL_OFF_DENOMINATOR_MICROS, 6),
            initiator: LIQUIDATION_MODULE.into(),
            auction_module: AUCTION_MODULE.into(),
            max_events: MAX_EVENT_HISTORY,
        }
    }
}

impl LiquidationConfig {
    /// Override the deduction percentage
    pub fn with_deduction_percentage(mut self, value: Decimal) -> Self {
        self.deduction_percentage = value;
        self
    }

    /// Override the degenerate-denominator cut-off
    pub fn with_min_denominator(mut self, value: Decimal) -> Self {
        self.min_sell_off_denominator = value;
        self
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Storage(format!("Failed to read config: {}", e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Deserialization(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.deduction_percentage <= Decimal::ZERO {
            return Err(Error::InvalidParameter {
                name: "deduction_percentage".into(),
                reason: "must be positive".into(),
            });
        }
        if self.min_sell_off_denominator.is_sign_negative() {
            return Err(Error::InvalidParameter {
                name: "min_sell_off_denominator".into(),
                reason: "must not be negative".into(),
            });
        }
        for (name, value) in [
            ("initiator", &self.initiator),
            ("auction_module", &self.auction_module),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidParameter {
                    name: name.into(),
                    reason: "cannot be empty".into(),
                });
            }
        }
        Ok(())
    }

    /// Reject a collateral asset / bridge asset combination whose sell-off
    /// denominator `deduction − (deduction + penalty + bonus) × c` would not
    /// stay above the cut-off. `bridge` is `None` for direct borrows.
    pub fn validate_risk_profile(
        &self,
        collateral: &AssetRatesStats,
        bridge: Option<&AssetRatesStats>,
    ) -> Result<()> {
        collateral.validate()?;
        let factor = match bridge {
            Some(bridge) => {
                bridge.validate()?;
                collateral
                    .liquidation_threshold
                    .checked_mul(bridge.ltv)
                    .ok_or_else(|| Error::overflow("collateral factor"))?
            }
            None => collateral.liquidation_threshold,
        };
        let b = self
            .deduction_percentage
            .checked_add(collateral.penalty_and_bonus()?)
            .ok_or_else(|| Error::overflow("deduction + penalty + bonus"))?;
        let denominator = b
            .checked_mul(factor)
            .and_then(|bc| self.deduction_percentage.checked_sub(bc))
            .ok_or_else(|| Error::overflow("sell-off denominator"))?;
        if denominator <= self.min_sell_off_denominator {
            return Err(Error::InvalidParameter {
                name: format!("asset {} risk parameters", collateral.asset_id),
                reason: format!("sell-off denominator {} is not positive", denominator),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(asset_id: u64, lt: i64, ltv: i64, penalty: i64, bonus: i64) -> AssetRatesStats {
        AssetRatesStats {
            asset_id,
            ltv: Decimal::new(ltv, 2),
            liquidation_threshold: Decimal::new(lt, 2),
            liquidation_penalty: Decimal::new(penalty, 2),
            liquidation_bonus: Decimal::new(bonus, 2),
            c_asset_id: asset_id + 100,
        }
    }

    #[test]
    fn test_default_config_valid() {
        let config = LiquidationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.deduction_percentage, Decimal::ONE);
    }

    #[test]
    fn test_invalid_config() {
        let config = LiquidationConfig::default().with_deduction_percentage(Decimal::ZERO);
        assert!(config.validate().is_err());

        let mut config = LiquidationConfig::default();
        config.auction_module.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_risk_profile_direct() {
        let config = LiquidationConfig::default();
        // 1 - 1.1 * 0.8 = 0.12
        assert!(config.validate_risk_profile(&stats(1, 80, 70, 5, 5), None).is_ok());
        // 1 - 1.2 * 0.9 = -0.08
        assert!(config.validate_risk_profile(&stats(1, 90, 80, 10, 10), None).is_err());
    }

    #[test]
    fn test_risk_profile_bridged() {
        let config = LiquidationConfig::default();
        let collateral = stats(1, 90, 80, 10, 10);
        // c = 0.9 * 0.5 = 0.45; 1 - 1.2 * 0.45 = 0.46
        assert!(config
            .validate_risk_profile(&collateral, Some(&stats(2, 80, 50, 0, 0)))
            .is_ok());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = LiquidationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LiquidationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
