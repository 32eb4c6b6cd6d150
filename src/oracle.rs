// Price Oracle Adapter
//
// This module abstracts how the engine reads collateral prices. The core engine
// is agnostic to whether quotes come from Pyth, Chainlink, a CEX aggregator,
// or a custom oracle. We define a trait any price source can implement, plus
// the adapter that converts raw quotes into normalized USD valuations.

use crate::types::{Amount, AssetId, Usd, VALUE_SCALE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Implied fractional digits of a raw quote's integer price.
pub const QUOTE_DECIMALS: u32 = 8;

/// A single raw quote from a price source. The price is a signed integer with
/// eight implied decimal places, the common oracle wire convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: i64,
    /// Unix seconds at which the source produced this quote.
    pub timestamp: u64,
    /// Seconds before this quote is considered stale.
    pub ttl_seconds: u64,
}

impl PriceQuote {
    pub fn new(price: i64, timestamp: u64) -> Self {
        Self {
            price,
            timestamp,
            ttl_seconds: 60, // default 1 minute TTL
        }
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl_seconds = ttl;
        self
    }

    pub fn is_stale(&self, current_time: u64) -> bool {
        current_time > self.timestamp.saturating_add(self.ttl_seconds)
    }

    /// Price as a Decimal in USD per unit. A non-positive raw price never
    /// produces a usable value.
    pub fn normalized(&self) -> Result<Decimal, OracleError> {
        if self.price <= 0 {
            return Err(OracleError::NonPositivePrice { raw: self.price });
        }
        Ok(Decimal::new(self.price, QUOTE_DECIMALS))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("no price source registered for asset {0:?}")]
    UnknownAsset(AssetId),

    #[error("price source returned no quote")]
    NoQuote,

    #[error("non-positive raw price {raw}")]
    NonPositivePrice { raw: i64 },

    #[error("quote is stale: {age_seconds}s old, ttl {ttl_seconds}s")]
    StaleQuote { age_seconds: u64, ttl_seconds: u64 },

    #[error("overflow during value computation")]
    Overflow,
}

/// Trait for price sources. Implement this to integrate a specific oracle
/// network or data feed.
pub trait PriceSource {
    /// Human readable name.
    fn name(&self) -> &str;

    /// Fetch the latest quote, or None if the source is down.
    fn latest_quote(&self) -> Option<PriceQuote>;
}

/// One price source per approved collateral asset, fixed at construction.
/// `value_in_usd` and `amount_for_usd_value` are the only two conversions the
/// rest of the engine ever needs; both truncate toward zero at 18 decimals.
pub struct OracleAdapter {
    sources: Vec<(AssetId, Box<dyn PriceSource>)>,
}

impl OracleAdapter {
    pub fn new(sources: Vec<(AssetId, Box<dyn PriceSource>)>) -> Self {
        Self { sources }
    }

    pub fn assets(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.sources.iter().map(|(id, _)| *id)
    }

    fn source(&self, asset: AssetId) -> Result<&dyn PriceSource, OracleError> {
        self.sources
            .iter()
            .find(|(id, _)| *id == asset)
            .map(|(_, s)| s.as_ref())
            .ok_or(OracleError::UnknownAsset(asset))
    }

    /// Latest quote for the asset, validated for freshness.
    pub fn fresh_quote(&self, asset: AssetId, current_time: u64) -> Result<PriceQuote, OracleError> {
        let quote = self.source(asset)?.latest_quote().ok_or(OracleError::NoQuote)?;
        if quote.is_stale(current_time) {
            return Err(OracleError::StaleQuote {
                age_seconds: current_time.saturating_sub(quote.timestamp),
                ttl_seconds: quote.ttl_seconds,
            });
        }
        Ok(quote)
    }

    /// USD value of `amount` units of `asset`, truncated toward zero.
    pub fn value_in_usd(
        &self,
        asset: AssetId,
        amount: Amount,
        current_time: u64,
    ) -> Result<Usd, OracleError> {
        let price = self.fresh_quote(asset, current_time)?.normalized()?;
        let value = amount
            .value()
            .checked_mul(price)
            .ok_or(OracleError::Overflow)?
            .trunc_with_scale(VALUE_SCALE);
        Ok(Usd::new_unchecked(value))
    }

    /// Inverse conversion: how many native units of `asset` are worth
    /// `usd_value`. Used to size liquidation payouts.
    pub fn amount_for_usd_value(
        &self,
        asset: AssetId,
        usd_value: Usd,
        current_time: u64,
    ) -> Result<Amount, OracleError> {
        let price = self.fresh_quote(asset, current_time)?.normalized()?;
        let amount = usd_value
            .value()
            .checked_div(price)
            .ok_or(OracleError::Overflow)?
            .trunc_with_scale(VALUE_SCALE);
        Ok(Amount::new_unchecked(amount))
    }
}

impl std::fmt::Debug for OracleAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|(id, s)| (id, s.name())))
            .finish()
    }
}

#[derive(Debug)]
struct SourceState {
    price: i64,
    timestamp: u64,
    ttl_seconds: u64,
    healthy: bool,
}

/// Mock source for tests and simulation. The returned handle keeps a shared
/// reference so callers can move the price after the engine takes ownership
/// of the source.
pub struct MockPriceSource {
    name: String,
    state: Rc<RefCell<SourceState>>,
}

#[derive(Clone)]
pub struct SourceHandle {
    state: Rc<RefCell<SourceState>>,
}

impl MockPriceSource {
    pub fn new(name: &str, raw_price: i64) -> Self {
        Self::with_handle(name, raw_price).0
    }

    pub fn with_handle(name: &str, raw_price: i64) -> (Self, SourceHandle) {
        let state = Rc::new(RefCell::new(SourceState {
            price: raw_price,
            timestamp: 0,
            ttl_seconds: 60,
            healthy: true,
        }));
        let handle = SourceHandle {
            state: Rc::clone(&state),
        };
        (
            Self {
                name: name.to_string(),
                state,
            },
            handle,
        )
    }
}

impl SourceHandle {
    pub fn set_price(&self, raw_price: i64) {
        self.state.borrow_mut().price = raw_price;
    }

    pub fn set_timestamp(&self, timestamp: u64) {
        self.state.borrow_mut().timestamp = timestamp;
    }

    pub fn set_ttl(&self, ttl_seconds: u64) {
        self.state.borrow_mut().ttl_seconds = ttl_seconds;
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.borrow_mut().healthy = healthy;
    }
}

impl PriceSource for MockPriceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn latest_quote(&self) -> Option<PriceQuote> {
        let state = self.state.borrow();
        if !state.healthy {
            return None;
        }
        Some(PriceQuote::new(state.price, state.timestamp).with_ttl(state.ttl_seconds))
    }
}
