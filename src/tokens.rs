// External token collaborators. The engine never moves assets itself; it
// instructs these interfaces and records the outcome in the ledger. Mock
// implementations here are in-memory balance maps, no real transfers.

use crate::types::{Amount, UserId};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Balance owner: the engine's custody account or a user wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Holder {
    Engine,
    User(UserId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("insufficient balance for {holder:?}: requested {requested}, available {available}")]
    InsufficientBalance {
        holder: Holder,
        requested: Amount,
        available: Amount,
    },

    #[error("token is halted")]
    Halted,

    #[error("token balance arithmetic overflowed")]
    Overflow,
}

/// The synthetic asset ledger. Minting is privileged to the engine: the
/// engine exclusively owns this handle and no other code path can reach it.
pub trait SyntheticToken {
    fn symbol(&self) -> &str;

    fn total_supply(&self) -> Amount;

    fn balance_of(&self, holder: Holder) -> Amount;

    fn mint(&mut self, to: Holder, amount: Amount) -> Result<(), TokenError>;

    /// Burns from the engine's own holdings.
    fn burn(&mut self, amount: Amount) -> Result<(), TokenError>;

    fn transfer_from(&mut self, from: Holder, to: Holder, amount: Amount) -> Result<(), TokenError>;
}

/// A collateral asset's transfer interface. `transfer` moves out of engine
/// custody; `transfer_from` pulls from an arbitrary holder.
pub trait CollateralToken {
    fn symbol(&self) -> &str;

    fn balance_of(&self, holder: Holder) -> Amount;

    fn transfer(&mut self, to: Holder, amount: Amount) -> Result<(), TokenError>;

    fn transfer_from(&mut self, from: Holder, to: Holder, amount: Amount) -> Result<(), TokenError>;
}

#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<Holder, Amount>,
    total_supply: Amount,
    halted: bool,
}

impl TokenState {
    fn balance(&self, holder: Holder) -> Amount {
        self.balances.get(&holder).copied().unwrap_or_else(Amount::zero)
    }

    fn credit(&mut self, holder: Holder, amount: Amount) -> Result<(), TokenError> {
        let updated = self
            .balance(holder)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(holder, updated);
        Ok(())
    }

    fn debit(&mut self, holder: Holder, amount: Amount) -> Result<(), TokenError> {
        let current = self.balance(holder);
        let updated = current
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                holder,
                requested: amount,
                available: current,
            })?;
        self.balances.insert(holder, updated);
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), TokenError> {
        if self.halted {
            Err(TokenError::Halted)
        } else {
            Ok(())
        }
    }
}

/// Mock fungible token for tests and simulation. Implements both collaborator
/// interfaces; the engine boxes it as whichever one it needs. The returned
/// handle keeps shared access so callers can seed wallets and force failures
/// after the engine takes ownership.
pub struct MockToken {
    symbol: String,
    state: Rc<RefCell<TokenState>>,
}

#[derive(Clone)]
pub struct TokenHandle {
    state: Rc<RefCell<TokenState>>,
}

impl MockToken {
    pub fn new(symbol: &str) -> Self {
        Self::with_handle(symbol).0
    }

    pub fn with_handle(symbol: &str) -> (Self, TokenHandle) {
        let state = Rc::new(RefCell::new(TokenState::default()));
        let handle = TokenHandle {
            state: Rc::clone(&state),
        };
        (
            Self {
                symbol: symbol.to_string(),
                state,
            },
            handle,
        )
    }
}

impl TokenHandle {
    /// Faucet: credit a wallet out of thin air. Test setup only.
    pub fn credit(&self, holder: Holder, amount: Amount) {
        let mut state = self.state.borrow_mut();
        if state.credit(holder, amount).is_ok() {
            state.total_supply = state
                .total_supply
                .checked_add(amount)
                .unwrap_or(state.total_supply);
        }
    }

    pub fn balance_of(&self, holder: Holder) -> Amount {
        self.state.borrow().balance(holder)
    }

    pub fn total_supply(&self) -> Amount {
        self.state.borrow().total_supply
    }

    /// Halted tokens decline every transfer, mint, and burn.
    pub fn set_halted(&self, halted: bool) {
        self.state.borrow_mut().halted = halted;
    }
}

impl SyntheticToken for MockToken {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn total_supply(&self) -> Amount {
        self.state.borrow().total_supply
    }

    fn balance_of(&self, holder: Holder) -> Amount {
        self.state.borrow().balance(holder)
    }

    fn mint(&mut self, to: Holder, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.ensure_live()?;
        state.credit(to, amount)?;
        state.total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Ok(())
    }

    fn burn(&mut self, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.ensure_live()?;
        state.debit(Holder::Engine, amount)?;
        state.total_supply = state
            .total_supply
            .checked_sub(amount)
            .ok_or(TokenError::Overflow)?;
        Ok(())
    }

    fn transfer_from(&mut self, from: Holder, to: Holder, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.ensure_live()?;
        state.debit(from, amount)?;
        state.credit(to, amount)?;
        Ok(())
    }
}

impl CollateralToken for MockToken {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn balance_of(&self, holder: Holder) -> Amount {
        self.state.borrow().balance(holder)
    }

    fn transfer(&mut self, to: Holder, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.ensure_live()?;
        state.debit(Holder::Engine, amount)?;
        state.credit(to, amount)?;
        Ok(())
    }

    fn transfer_from(&mut self, from: Holder, to: Holder, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.ensure_live()?;
        state.debit(from, amount)?;
        state.credit(to, amount)?;
        Ok(())
    }
}
