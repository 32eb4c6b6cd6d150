//! Health factor computation and the solvency invariant.
//!
//! The health factor is the ratio of threshold-adjusted collateral value to
//! debt: only half of raw collateral value counts toward solvency, so a
//! position must stay at least 200% collateralized. A factor of exactly 1 is
//! the floor; anything below it makes the position liquidatable.
//!
//! A debt-free position is unconditionally safe and reports the max sentinel
//! instead of attempting the division.

use crate::ledger::Position;
use crate::oracle::{OracleAdapter, OracleError};
use crate::types::{AssetId, HealthFactor, VALUE_SCALE};
use crate::valuation::collateral_value;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolvencyParams {
    /// Fraction of raw collateral value that counts toward solvency.
    pub liquidation_threshold: Decimal,
    /// Premium paid to a liquidator, as a fraction of the covered value.
    pub liquidation_bonus: Decimal,
    /// Floor below which a position is liquidatable.
    pub min_health_factor: Decimal,
}

impl Default for SolvencyParams {
    fn default() -> Self {
        Self {
            liquidation_threshold: dec!(0.5),
            liquidation_bonus: dec!(0.1),
            min_health_factor: Decimal::ONE,
        }
    }
}

pub fn health_factor(
    position: &Position,
    assets: &[AssetId],
    oracle: &OracleAdapter,
    params: &SolvencyParams,
    current_time: u64,
) -> Result<HealthFactor, OracleError> {
    if position.debt().is_zero() {
        return Ok(HealthFactor::MAX);
    }

    let collateral = collateral_value(position, assets, oracle, current_time)?;
    let adjusted = collateral
        .value()
        .checked_mul(params.liquidation_threshold)
        .ok_or(OracleError::Overflow)?
        .trunc_with_scale(VALUE_SCALE);

    // debt is non-zero here, and the synthetic is pegged 1:1 to USD
    let ratio = adjusted
        .checked_div(position.debt().value())
        .ok_or(OracleError::Overflow)?;

    Ok(HealthFactor::new(ratio))
}

pub fn is_healthy(health_factor: HealthFactor, params: &SolvencyParams) -> bool {
    health_factor.value() >= params.min_health_factor
}
