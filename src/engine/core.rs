// 5.1 engine/core.rs: main engine. owns the ledger, the oracle adapter, and
// the token collaborators; operations live in engine/operations.rs.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::events::{Event, EventId, EventPayload, OperationRejectedEvent};
use crate::ledger::{Ledger, Position};
use crate::oracle::{OracleAdapter, PriceSource};
use crate::solvency;
use crate::tokens::{CollateralToken, SyntheticToken};
use crate::types::{Amount, AssetId, HealthFactor, Timestamp, Usd, UserId};
use crate::valuation;
use std::collections::HashMap;

/** 5.1.1: main engine struct. all state lives here */
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) ledger: Ledger,
    pub(super) oracle: OracleAdapter,
    pub(super) synthetic: Box<dyn SyntheticToken>,
    pub(super) collateral_tokens: HashMap<AssetId, Box<dyn CollateralToken>>,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
    // reentrancy exclusion: set for the whole of any mutating operation so an
    // external token call cannot start a second transition mid-flight
    pub(super) busy: bool,
}

impl Engine {
    /// Builds the engine from equal-length paired lists: one price source and
    /// one transfer interface per approved collateral asset, in list order.
    pub fn new(
        config: EngineConfig,
        assets: Vec<AssetId>,
        price_sources: Vec<Box<dyn PriceSource>>,
        collateral_tokens: Vec<Box<dyn CollateralToken>>,
        synthetic: Box<dyn SyntheticToken>,
    ) -> Result<Self, EngineError> {
        if assets.len() != price_sources.len() || assets.len() != collateral_tokens.len() {
            return Err(EngineError::ConfigurationMismatch {
                assets: assets.len(),
                price_sources: price_sources.len(),
                collateral_tokens: collateral_tokens.len(),
            });
        }

        let oracle = OracleAdapter::new(assets.iter().copied().zip(price_sources).collect());
        let collateral_tokens = assets.iter().copied().zip(collateral_tokens).collect();

        Ok(Self {
            config,
            ledger: Ledger::new(assets),
            oracle,
            synthetic,
            collateral_tokens,
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
            busy: false,
        })
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    pub fn approved_assets(&self) -> &[AssetId] {
        self.ledger.approved_assets()
    }

    pub fn position(&self, user: UserId) -> Option<&Position> {
        self.ledger.position(user)
    }

    pub fn collateral_of(&self, user: UserId, asset: AssetId) -> Amount {
        self.ledger.collateral_of(user, asset)
    }

    pub fn debt_of(&self, user: UserId) -> Amount {
        self.ledger.debt_of(user)
    }

    /// USD value of everything the user has deposited, at current prices.
    pub fn total_collateral_value(&self, user: UserId) -> Result<Usd, EngineError> {
        let position = self.ledger.staged(user);
        let value = valuation::collateral_value(
            &position,
            self.ledger.approved_assets(),
            &self.oracle,
            self.current_time.as_secs(),
        )?;
        Ok(value)
    }

    /// Read-only health factor for a user.
    pub fn health_factor(&self, user: UserId) -> Result<HealthFactor, EngineError> {
        let position = self.ledger.staged(user);
        self.staged_health(&position)
    }

    pub fn synthetic_token(&self) -> &dyn SyntheticToken {
        self.synthetic.as_ref()
    }

    pub fn collateral_token(&self, asset: AssetId) -> Option<&dyn CollateralToken> {
        self.collateral_tokens.get(&asset).map(|t| t.as_ref())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    // health factor of a working position copy, before it is committed
    pub(super) fn staged_health(&self, position: &Position) -> Result<HealthFactor, EngineError> {
        let hf = solvency::health_factor(
            position,
            self.ledger.approved_assets(),
            &self.oracle,
            &self.config.solvency,
            self.current_time.as_secs(),
        )?;
        Ok(hf)
    }

    // the single solvency gate: every debt-holding position must clear the floor
    pub(super) fn require_healthy(&self, position: &Position) -> Result<HealthFactor, EngineError> {
        let hf = self.staged_health(position)?;
        if !solvency::is_healthy(hf, &self.config.solvency) {
            return Err(EngineError::HealthFactorBroken(hf));
        }
        Ok(hf)
    }

    pub(super) fn collateral_token_mut(
        &mut self,
        asset: AssetId,
    ) -> Result<&mut Box<dyn CollateralToken>, EngineError> {
        self.collateral_tokens
            .get_mut(&asset)
            .ok_or(EngineError::AssetNotApproved(asset))
    }

    /// Runs one mutating operation under the busy guard. A failure journals a
    /// rejection event and surfaces the error; the ledger is untouched either
    /// way until the operation's own commit.
    pub(super) fn with_guard<T>(
        &mut self,
        operation: &'static str,
        user: UserId,
        f: impl FnOnce(&mut Self) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        if self.busy {
            return Err(EngineError::ReentrantCall);
        }
        self.busy = true;
        let result = f(self);
        self.busy = false;

        if let Err(err) = &result {
            self.emit_event(EventPayload::OperationRejected(OperationRejectedEvent {
                operation: operation.to_string(),
                user,
                reason: err.to_string(),
            }));
        }
        result
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("ledger", &self.ledger)
            .field("oracle", &self.oracle)
            .field("events", &self.events.len())
            .field("time", &self.current_time)
            .finish()
    }
}
