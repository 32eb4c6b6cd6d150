//! Collateral valuation.
//!
//! Sums the USD value of a position's balances over the approved asset list,
//! in list order, skipping zero balances. Pure read with no side effects;
//! the only failure modes are oracle failures for assets actually held.

use crate::ledger::Position;
use crate::oracle::{OracleAdapter, OracleError};
use crate::types::{AssetId, Usd};

pub fn collateral_value(
    position: &Position,
    assets: &[AssetId],
    oracle: &OracleAdapter,
    current_time: u64,
) -> Result<Usd, OracleError> {
    let mut total = Usd::zero();

    for asset in assets {
        let balance = position.collateral(*asset);
        if balance.is_zero() {
            continue;
        }
        let value = oracle.value_in_usd(*asset, balance, current_time)?;
        total = total.checked_add(value).ok_or(OracleError::Overflow)?;
    }

    Ok(total)
}
