// 5.0.2: result types and errors for engine operations.

use crate::ledger::LedgerError;
use crate::oracle::OracleError;
use crate::tokens::TokenError;
use crate::types::{Amount, AssetId, HealthFactor, UserId};

/// Outcome of a successful liquidation.
#[derive(Debug, Clone)]
pub struct LiquidationOutcome {
    pub victim: UserId,
    pub liquidator: UserId,
    pub asset: AssetId,
    pub debt_covered: Amount,
    pub collateral_seized: Amount,
    pub bonus_collateral: Amount,
    pub victim_health_before: HealthFactor,
    pub victim_health_after: HealthFactor,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("asset {0:?} is not approved collateral")]
    AssetNotApproved(AssetId),

    #[error("token transfer declined: {0}")]
    TransferFailed(TokenError),

    #[error("synthetic mint declined: {0}")]
    MintFailed(TokenError),

    #[error("health factor {0} is below the minimum")]
    HealthFactorBroken(HealthFactor),

    #[error("position is healthy ({0}); nothing to liquidate")]
    HealthFactorOk(HealthFactor),

    #[error("liquidation left the victim no better off ({0})")]
    HealthFactorNotImproved(HealthFactor),

    #[error("unusable price quote: {0}")]
    InvalidPriceQuote(OracleError),

    #[error("insufficient collateral: requested {requested}, available {available}")]
    InsufficientCollateral { requested: Amount, available: Amount },

    #[error("insufficient debt: requested {requested}, available {available}")]
    InsufficientDebt { requested: Amount, available: Amount },

    #[error(
        "construction lists differ in length: {assets} assets, {price_sources} price sources, \
         {collateral_tokens} collateral tokens"
    )]
    ConfigurationMismatch {
        assets: usize,
        price_sources: usize,
        collateral_tokens: usize,
    },

    #[error("arithmetic overflow in balance computation")]
    ArithmeticOverflow,

    #[error("reentrant call rejected")]
    ReentrantCall,
}

impl From<OracleError> for EngineError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::UnknownAsset(asset) => EngineError::AssetNotApproved(asset),
            OracleError::Overflow => EngineError::ArithmeticOverflow,
            other => EngineError::InvalidPriceQuote(other),
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientCollateral { requested, available } => {
                EngineError::InsufficientCollateral { requested, available }
            }
            LedgerError::InsufficientDebt { requested, available } => {
                EngineError::InsufficientDebt { requested, available }
            }
            LedgerError::Overflow => EngineError::ArithmeticOverflow,
        }
    }
}
