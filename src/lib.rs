// synth-core: collateral-backed synthetic asset engine.
// solvency-first architecture: the health factor invariant takes priority.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: UserId, AssetId, Amount, Usd, HealthFactor
//   2.x  oracle.rs: price source trait, quote normalization, USD conversion
//   3.x  ledger.rs: per-user collateral and debt balances, approved assets
//   3.1  valuation.rs: total collateral value in USD per user
//   4.x  solvency.rs: health factor math, thresholds, liquidation bonus
//   5.x  engine/: position operations: deposit, mint, redeem, burn, liquidate
//   6.x  events.rs: state transition events for audit
//   7.x  tokens.rs: synthetic + collateral token interfaces (mocked)

// core accounting modules
pub mod ledger;
pub mod solvency;
pub mod types;
pub mod valuation;

// engine and integration modules
pub mod engine;
pub mod events;
pub mod oracle;
pub mod tokens;

// re exports for convenience
pub use engine::{Engine, EngineConfig, EngineError, LiquidationOutcome};
pub use events::{Event, EventId, EventPayload};
pub use ledger::{Ledger, LedgerError, Position};
pub use oracle::{MockPriceSource, OracleAdapter, OracleError, PriceQuote, PriceSource, SourceHandle};
pub use solvency::SolvencyParams;
pub use tokens::{CollateralToken, Holder, MockToken, SyntheticToken, TokenError, TokenHandle};
pub use types::{Amount, AssetId, HealthFactor, Timestamp, Usd, UserId};
