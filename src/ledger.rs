//! Per-user collateral and debt bookkeeping.
//!
//! The ledger is pure data: collateral balances by asset and a single debt
//! balance per user, plus the fixed list of approved collateral assets. All
//! mutation goes through the engine's position operations, which stage a
//! cloned position, run every check and external call, and commit the staged
//! copy only once nothing can fail.

use crate::types::{Amount, AssetId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient collateral: requested {requested}, available {available}")]
    InsufficientCollateral { requested: Amount, available: Amount },

    #[error("insufficient debt: requested {requested}, available {available}")]
    InsufficientDebt { requested: Amount, available: Amount },

    #[error("balance arithmetic overflowed")]
    Overflow,
}

/// One user's collateral balances and debt. Created implicitly on first
/// deposit; a position with zero balances is indistinguishable from a
/// non-existent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    collateral: HashMap<AssetId, Amount>,
    debt: Amount,
}

impl Position {
    pub fn collateral(&self, asset: AssetId) -> Amount {
        self.collateral.get(&asset).copied().unwrap_or_else(Amount::zero)
    }

    pub fn collateral_entries(&self) -> impl Iterator<Item = (AssetId, Amount)> + '_ {
        self.collateral.iter().map(|(a, b)| (*a, *b))
    }

    pub fn debt(&self) -> Amount {
        self.debt
    }

    pub fn is_empty(&self) -> bool {
        self.debt.is_zero() && self.collateral.values().all(|b| b.is_zero())
    }

    pub(crate) fn credit_collateral(&mut self, asset: AssetId, amount: Amount) -> Result<(), LedgerError> {
        let current = self.collateral(asset);
        let updated = current.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.collateral.insert(asset, updated);
        Ok(())
    }

    pub(crate) fn debit_collateral(&mut self, asset: AssetId, amount: Amount) -> Result<(), LedgerError> {
        let current = self.collateral(asset);
        let updated = current
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientCollateral {
                requested: amount,
                available: current,
            })?;
        if updated.is_zero() {
            // zero balance and absent entry are the same state
            self.collateral.remove(&asset);
        } else {
            self.collateral.insert(asset, updated);
        }
        Ok(())
    }

    pub(crate) fn add_debt(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.debt = self.debt.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    pub(crate) fn sub_debt(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.debt = self
            .debt
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientDebt {
                requested: amount,
                available: self.debt,
            })?;
        Ok(())
    }
}

/// All positions, addressable by user, plus the approved asset list. The
/// asset list is fixed at construction and defines the deterministic
/// enumeration order for valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    approved: Vec<AssetId>,
    positions: HashMap<UserId, Position>,
}

impl Ledger {
    pub fn new(approved: Vec<AssetId>) -> Self {
        Self {
            approved,
            positions: HashMap::new(),
        }
    }

    pub fn approved_assets(&self) -> &[AssetId] {
        &self.approved
    }

    pub fn is_approved(&self, asset: AssetId) -> bool {
        self.approved.contains(&asset)
    }

    pub fn position(&self, user: UserId) -> Option<&Position> {
        self.positions.get(&user)
    }

    pub fn collateral_of(&self, user: UserId, asset: AssetId) -> Amount {
        self.positions
            .get(&user)
            .map(|p| p.collateral(asset))
            .unwrap_or_else(Amount::zero)
    }

    pub fn debt_of(&self, user: UserId) -> Amount {
        self.positions
            .get(&user)
            .map(|p| p.debt())
            .unwrap_or_else(Amount::zero)
    }

    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.positions.keys().copied()
    }

    /// Working copy of a user's position for staging an operation.
    pub(crate) fn staged(&self, user: UserId) -> Position {
        self.positions.get(&user).cloned().unwrap_or_default()
    }

    /// Replace a user's position with a fully validated staged copy. This is
    /// the single commit point; it cannot fail.
    pub(crate) fn commit(&mut self, user: UserId, position: Position) {
        if position.is_empty() {
            self.positions.remove(&user);
        } else {
            self.positions.insert(user, position);
        }
    }
}
