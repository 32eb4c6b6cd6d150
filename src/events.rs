// 6.0: every committed state change produces an event. used for audit trails,
// state reconstruction, and notifying external systems. rejected operations are
// journaled too so a failed call leaves a trace without leaving state.

use crate::types::{Amount, AssetId, HealthFactor, Timestamp, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // position events
    CollateralDeposited(CollateralDepositedEvent),
    SyntheticMinted(SyntheticMintedEvent),
    CollateralRedeemed(CollateralRedeemedEvent),
    SyntheticBurned(SyntheticBurnedEvent),

    // risk events
    Liquidation(LiquidationEvent),

    // audit events
    OperationRejected(OperationRejectedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralDepositedEvent {
    pub user: UserId,
    pub asset: AssetId,
    pub amount: Amount,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticMintedEvent {
    pub user: UserId,
    pub amount: Amount,
    pub new_debt: Amount,
    pub health_factor: HealthFactor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralRedeemedEvent {
    pub user: UserId,
    pub asset: AssetId,
    pub amount: Amount,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticBurnedEvent {
    pub user: UserId,
    pub amount: Amount,
    pub new_debt: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub victim: UserId,
    pub liquidator: UserId,
    pub asset: AssetId,
    pub debt_covered: Amount,
    pub collateral_seized: Amount,
    pub bonus_collateral: Amount,
    pub victim_health_before: HealthFactor,
    pub victim_health_after: HealthFactor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRejectedEvent {
    pub operation: String,
    pub user: UserId,
    pub reason: String,
}
