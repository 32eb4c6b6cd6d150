//! The public position operations: deposit, mint, redeem, burn, their
//! composites, and liquidate.
//!
//! Every operation is one atomic transition. The body stages the affected
//! position as a working copy, runs each precondition, solvency check, and
//! external token call in order, and commits the staged copy to the ledger
//! only as the final, infallible step. A failure at any point leaves the
//! ledger exactly as it was before the call.
//!
//! External calls are ordered pulls-first so a declined outbound transfer can
//! be compensated without touching the ledger.

use super::core::Engine;
use super::results::{EngineError, LiquidationOutcome};
use crate::events::{
    CollateralDepositedEvent, CollateralRedeemedEvent, EventPayload, LiquidationEvent,
    SyntheticBurnedEvent, SyntheticMintedEvent,
};
use crate::solvency;
use crate::tokens::Holder;
use crate::types::{Amount, AssetId, Usd, UserId, VALUE_SCALE};

fn require_positive(amount: Amount) -> Result<(), EngineError> {
    if amount.is_zero() {
        return Err(EngineError::InvalidAmount);
    }
    Ok(())
}

impl Engine {
    /// Pull collateral from the user's wallet into engine custody and credit
    /// their balance. Cannot worsen solvency, so no health check runs here.
    pub fn deposit_collateral(
        &mut self,
        user: UserId,
        asset: AssetId,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.with_guard("deposit_collateral", user, |e| {
            require_positive(amount)?;
            if !e.ledger.is_approved(asset) {
                return Err(EngineError::AssetNotApproved(asset));
            }

            let mut staged = e.ledger.staged(user);
            staged.credit_collateral(asset, amount)?;
            let new_balance = staged.collateral(asset);

            e.collateral_token_mut(asset)?
                .transfer_from(Holder::User(user), Holder::Engine, amount)
                .map_err(EngineError::TransferFailed)?;

            e.ledger.commit(user, staged);
            e.emit_event(EventPayload::CollateralDeposited(CollateralDepositedEvent {
                user,
                asset,
                amount,
                new_balance,
            }));
            Ok(())
        })
    }

    /// Take on debt. The solvency gate runs on the staged position before the
    /// external mint is requested.
    pub fn mint(&mut self, user: UserId, amount: Amount) -> Result<(), EngineError> {
        self.with_guard("mint", user, |e| {
            require_positive(amount)?;

            let mut staged = e.ledger.staged(user);
            staged.add_debt(amount)?;
            let hf = e.require_healthy(&staged)?;

            e.synthetic
                .mint(Holder::User(user), amount)
                .map_err(EngineError::MintFailed)?;

            let new_debt = staged.debt();
            e.ledger.commit(user, staged);
            e.emit_event(EventPayload::SyntheticMinted(SyntheticMintedEvent {
                user,
                amount,
                new_debt,
                health_factor: hf,
            }));
            Ok(())
        })
    }

    /// Deposit and mint in one transition: deposit first, a single solvency
    /// gate at the end covering both mutations.
    pub fn deposit_and_mint(
        &mut self,
        user: UserId,
        asset: AssetId,
        collateral_amount: Amount,
        mint_amount: Amount,
    ) -> Result<(), EngineError> {
        self.with_guard("deposit_and_mint", user, |e| {
            require_positive(collateral_amount)?;
            require_positive(mint_amount)?;
            if !e.ledger.is_approved(asset) {
                return Err(EngineError::AssetNotApproved(asset));
            }

            let mut staged = e.ledger.staged(user);
            staged.credit_collateral(asset, collateral_amount)?;
            staged.add_debt(mint_amount)?;
            let hf = e.require_healthy(&staged)?;

            e.collateral_token_mut(asset)?
                .transfer_from(Holder::User(user), Holder::Engine, collateral_amount)
                .map_err(EngineError::TransferFailed)?;

            if let Err(err) = e.synthetic.mint(Holder::User(user), mint_amount) {
                // hand the pulled collateral back; nothing was committed
                let _ = e
                    .collateral_token_mut(asset)?
                    .transfer(Holder::User(user), collateral_amount);
                return Err(EngineError::MintFailed(err));
            }

            let new_balance = staged.collateral(asset);
            let new_debt = staged.debt();
            e.ledger.commit(user, staged);
            e.emit_event(EventPayload::CollateralDeposited(CollateralDepositedEvent {
                user,
                asset,
                amount: collateral_amount,
                new_balance,
            }));
            e.emit_event(EventPayload::SyntheticMinted(SyntheticMintedEvent {
                user,
                amount: mint_amount,
                new_debt,
                health_factor: hf,
            }));
            Ok(())
        })
    }

    /// Return collateral from engine custody to the user. The solvency gate
    /// runs on the staged position, so a withdrawal that would leave the
    /// remaining debt under-collateralized never moves tokens.
    pub fn redeem_collateral(
        &mut self,
        user: UserId,
        asset: AssetId,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.with_guard("redeem_collateral", user, |e| {
            require_positive(amount)?;
            if !e.ledger.is_approved(asset) {
                return Err(EngineError::AssetNotApproved(asset));
            }

            let mut staged = e.ledger.staged(user);
            staged.debit_collateral(asset, amount)?;
            e.require_healthy(&staged)?;

            e.collateral_token_mut(asset)?
                .transfer(Holder::User(user), amount)
                .map_err(EngineError::TransferFailed)?;

            let new_balance = staged.collateral(asset);
            e.ledger.commit(user, staged);
            e.emit_event(EventPayload::CollateralRedeemed(CollateralRedeemedEvent {
                user,
                asset,
                amount,
                new_balance,
            }));
            Ok(())
        })
    }

    /// Retire debt: pull synthetic from the user, destroy it, reduce their
    /// debt. Burning cannot worsen solvency; the gate here is defensive and
    /// short-circuits for a fully repaid position.
    pub fn burn(&mut self, user: UserId, amount: Amount) -> Result<(), EngineError> {
        self.with_guard("burn", user, |e| {
            require_positive(amount)?;

            let mut staged = e.ledger.staged(user);
            staged.sub_debt(amount)?;
            e.require_healthy(&staged)?;

            e.synthetic
                .transfer_from(Holder::User(user), Holder::Engine, amount)
                .map_err(EngineError::TransferFailed)?;
            if let Err(err) = e.synthetic.burn(amount) {
                let _ = e
                    .synthetic
                    .transfer_from(Holder::Engine, Holder::User(user), amount);
                return Err(EngineError::TransferFailed(err));
            }

            let new_debt = staged.debt();
            e.ledger.commit(user, staged);
            e.emit_event(EventPayload::SyntheticBurned(SyntheticBurnedEvent {
                user,
                amount,
                new_debt,
            }));
            Ok(())
        })
    }

    /// Burn then redeem in one transition, with a single solvency gate over
    /// the combined result.
    pub fn redeem_and_burn(
        &mut self,
        user: UserId,
        asset: AssetId,
        collateral_amount: Amount,
        burn_amount: Amount,
    ) -> Result<(), EngineError> {
        self.with_guard("redeem_and_burn", user, |e| {
            require_positive(collateral_amount)?;
            require_positive(burn_amount)?;
            if !e.ledger.is_approved(asset) {
                return Err(EngineError::AssetNotApproved(asset));
            }

            let mut staged = e.ledger.staged(user);
            staged.sub_debt(burn_amount)?;
            staged.debit_collateral(asset, collateral_amount)?;
            e.require_healthy(&staged)?;

            e.synthetic
                .transfer_from(Holder::User(user), Holder::Engine, burn_amount)
                .map_err(EngineError::TransferFailed)?;
            if let Err(err) = e.synthetic.burn(burn_amount) {
                let _ = e
                    .synthetic
                    .transfer_from(Holder::Engine, Holder::User(user), burn_amount);
                return Err(EngineError::TransferFailed(err));
            }
            if let Err(err) = e
                .collateral_token_mut(asset)?
                .transfer(Holder::User(user), collateral_amount)
            {
                // the user's synthetic is already destroyed; re-issue it
                let _ = e.synthetic.mint(Holder::User(user), burn_amount);
                return Err(EngineError::TransferFailed(err));
            }

            let new_balance = staged.collateral(asset);
            let new_debt = staged.debt();
            e.ledger.commit(user, staged);
            e.emit_event(EventPayload::SyntheticBurned(SyntheticBurnedEvent {
                user,
                amount: burn_amount,
                new_debt,
            }));
            e.emit_event(EventPayload::CollateralRedeemed(CollateralRedeemedEvent {
                user,
                asset,
                amount: collateral_amount,
                new_balance,
            }));
            Ok(())
        })
    }

    /// Third-party liquidation of an under-collateralized position. The
    /// liquidator pays `debt_to_cover` of their own synthetic holdings and
    /// receives collateral worth that value plus the liquidation bonus, taken
    /// from the victim.
    pub fn liquidate(
        &mut self,
        liquidator: UserId,
        victim: UserId,
        asset: AssetId,
        debt_to_cover: Amount,
    ) -> Result<LiquidationOutcome, EngineError> {
        self.with_guard("liquidate", liquidator, |e| {
            require_positive(debt_to_cover)?;
            if !e.ledger.is_approved(asset) {
                return Err(EngineError::AssetNotApproved(asset));
            }

            let mut staged = e.ledger.staged(victim);
            let starting_health = e.staged_health(&staged)?;
            if solvency::is_healthy(starting_health, &e.config.solvency) {
                return Err(EngineError::HealthFactorOk(starting_health));
            }

            // size the payout: covered debt at the peg, plus the bonus
            let covered_value = Usd::new_unchecked(debt_to_cover.value());
            let base = e.oracle.amount_for_usd_value(
                asset,
                covered_value,
                e.current_time.as_secs(),
            )?;
            let bonus = Amount::new_unchecked(
                base.value()
                    .checked_mul(e.config.solvency.liquidation_bonus)
                    .ok_or(EngineError::ArithmeticOverflow)?
                    .trunc_with_scale(VALUE_SCALE),
            );
            let seized = base
                .checked_add(bonus)
                .ok_or(EngineError::ArithmeticOverflow)?;

            staged.sub_debt(debt_to_cover)?;
            staged.debit_collateral(asset, seized)?;

            let ending_health = e.staged_health(&staged)?;
            if ending_health <= starting_health {
                return Err(EngineError::HealthFactorNotImproved(ending_health));
            }

            // the liquidator's own position must not be left broken either
            let liquidator_position = e.ledger.staged(liquidator);
            e.require_healthy(&liquidator_position)?;

            e.synthetic
                .transfer_from(Holder::User(liquidator), Holder::Engine, debt_to_cover)
                .map_err(EngineError::TransferFailed)?;
            if let Err(err) = e.synthetic.burn(debt_to_cover) {
                let _ = e.synthetic.transfer_from(
                    Holder::Engine,
                    Holder::User(liquidator),
                    debt_to_cover,
                );
                return Err(EngineError::TransferFailed(err));
            }
            if let Err(err) = e
                .collateral_token_mut(asset)?
                .transfer(Holder::User(liquidator), seized)
            {
                let _ = e.synthetic.mint(Holder::User(liquidator), debt_to_cover);
                return Err(EngineError::TransferFailed(err));
            }

            e.ledger.commit(victim, staged);
            e.emit_event(EventPayload::Liquidation(LiquidationEvent {
                victim,
                liquidator,
                asset,
                debt_covered: debt_to_cover,
                collateral_seized: seized,
                bonus_collateral: bonus,
                victim_health_before: starting_health,
                victim_health_after: ending_health,
            }));

            Ok(LiquidationOutcome {
                victim,
                liquidator,
                asset,
                debt_covered: debt_to_cover,
                collateral_seized: seized,
                bonus_collateral: bonus,
                victim_health_before: starting_health,
                victim_health_after: ending_health,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::oracle::{MockPriceSource, PriceSource, SourceHandle};
    use crate::tokens::{CollateralToken, MockToken, SyntheticToken, TokenHandle};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const ETH: AssetId = AssetId(1);
    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    const PRICE_2000: i64 = 200_000_000_000; // $2000, 8 implied decimals

    fn amt(d: Decimal) -> Amount {
        Amount::new_unchecked(d)
    }

    struct Fixture {
        engine: Engine,
        price: SourceHandle,
        collateral: TokenHandle,
        synthetic: TokenHandle,
    }

    fn setup() -> Fixture {
        let (source, price) = MockPriceSource::with_handle("ETH-USD", PRICE_2000);
        let (collateral_token, collateral) = MockToken::with_handle("WETH");
        let (synthetic_token, synthetic) = MockToken::with_handle("sUSD");

        let engine = Engine::new(
            EngineConfig::default(),
            vec![ETH],
            vec![Box::new(source) as Box<dyn PriceSource>],
            vec![Box::new(collateral_token) as Box<dyn CollateralToken>],
            Box::new(synthetic_token) as Box<dyn SyntheticToken>,
        )
        .unwrap();

        collateral.credit(Holder::User(ALICE), amt(dec!(100)));
        collateral.credit(Holder::User(BOB), amt(dec!(100)));

        Fixture {
            engine,
            price,
            collateral,
            synthetic,
        }
    }

    #[test]
    fn construction_rejects_mismatched_lists() {
        let (source, _) = MockPriceSource::with_handle("ETH-USD", PRICE_2000);
        let synthetic_token = MockToken::new("sUSD");

        let result = Engine::new(
            EngineConfig::default(),
            vec![ETH, AssetId(2)],
            vec![Box::new(source) as Box<dyn PriceSource>],
            vec![],
            Box::new(synthetic_token) as Box<dyn SyntheticToken>,
        );
        assert!(matches!(
            result,
            Err(EngineError::ConfigurationMismatch {
                assets: 2,
                price_sources: 1,
                collateral_tokens: 0
            })
        ));
    }

    #[test]
    fn deposit_moves_tokens_into_custody() {
        let mut fx = setup();

        fx.engine.deposit_collateral(ALICE, ETH, amt(dec!(10))).unwrap();

        assert_eq!(fx.engine.collateral_of(ALICE, ETH).value(), dec!(10));
        assert_eq!(fx.collateral.balance_of(Holder::Engine).value(), dec!(10));
        assert_eq!(fx.collateral.balance_of(Holder::User(ALICE)).value(), dec!(90));
    }

    #[test]
    fn deposit_zero_rejected() {
        let mut fx = setup();

        let result = fx.engine.deposit_collateral(ALICE, ETH, Amount::zero());
        assert!(matches!(result, Err(EngineError::InvalidAmount)));
    }

    #[test]
    fn deposit_unapproved_asset_rejected() {
        let mut fx = setup();

        let result = fx.engine.deposit_collateral(ALICE, AssetId(99), amt(dec!(1)));
        assert!(matches!(result, Err(EngineError::AssetNotApproved(AssetId(99)))));
        assert!(fx.engine.collateral_of(ALICE, AssetId(99)).is_zero());
    }

    #[test]
    fn deposit_without_wallet_balance_rolls_back() {
        let mut fx = setup();

        let result = fx.engine.deposit_collateral(ALICE, ETH, amt(dec!(1000)));
        assert!(matches!(result, Err(EngineError::TransferFailed(_))));
        assert!(fx.engine.collateral_of(ALICE, ETH).is_zero());
    }

    #[test]
    fn mint_against_sufficient_collateral() {
        let mut fx = setup();

        fx.engine.deposit_collateral(ALICE, ETH, amt(dec!(10))).unwrap();
        fx.engine.mint(ALICE, amt(dec!(5000))).unwrap();

        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(5000));
        assert_eq!(fx.synthetic.balance_of(Holder::User(ALICE)).value(), dec!(5000));
        assert_eq!(fx.synthetic.total_supply().value(), dec!(5000));
    }

    #[test]
    fn mint_boundary_at_the_floor() {
        let mut fx = setup();
        fx.engine.deposit_collateral(ALICE, ETH, amt(dec!(10))).unwrap();

        // $20000 of collateral, half counts: exactly $10000 of debt is allowed
        fx.engine.mint(ALICE, amt(dec!(10000))).unwrap();
        assert_eq!(fx.engine.health_factor(ALICE).unwrap().value(), Decimal::ONE);

        // one more unit tips the ratio under the floor
        let result = fx.engine.mint(ALICE, amt(dec!(1)));
        assert!(matches!(result, Err(EngineError::HealthFactorBroken(_))));
        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(10000));
        assert_eq!(fx.synthetic.balance_of(Holder::User(ALICE)).value(), dec!(10000));
    }

    #[test]
    fn mint_without_collateral_rejected() {
        let mut fx = setup();

        let result = fx.engine.mint(ALICE, amt(dec!(1)));
        assert!(matches!(result, Err(EngineError::HealthFactorBroken(_))));
        assert!(fx.engine.debt_of(ALICE).is_zero());
    }

    #[test]
    fn deposit_and_mint_single_transition() {
        let mut fx = setup();

        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(10)), amt(dec!(9999)))
            .unwrap();

        assert_eq!(fx.engine.collateral_of(ALICE, ETH).value(), dec!(10));
        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(9999));

        let hf = fx.engine.health_factor(ALICE).unwrap();
        assert!(hf.value() > Decimal::ONE);
        assert!(hf.value() < dec!(1.0002));
    }

    #[test]
    fn deposit_and_mint_rolls_back_as_a_unit() {
        let mut fx = setup();

        // the mint side is too large, so the deposit side must not stick
        let result = fx
            .engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(10)), amt(dec!(10001)));
        assert!(matches!(result, Err(EngineError::HealthFactorBroken(_))));

        assert!(fx.engine.collateral_of(ALICE, ETH).is_zero());
        assert!(fx.engine.debt_of(ALICE).is_zero());
        assert_eq!(fx.collateral.balance_of(Holder::User(ALICE)).value(), dec!(100));
        assert!(fx.synthetic.balance_of(Holder::User(ALICE)).is_zero());
    }

    #[test]
    fn redeem_free_collateral() {
        let mut fx = setup();
        fx.engine.deposit_collateral(ALICE, ETH, amt(dec!(10))).unwrap();

        fx.engine.redeem_collateral(ALICE, ETH, amt(dec!(4))).unwrap();

        assert_eq!(fx.engine.collateral_of(ALICE, ETH).value(), dec!(6));
        assert_eq!(fx.collateral.balance_of(Holder::User(ALICE)).value(), dec!(94));
    }

    #[test]
    fn redeem_guarded_by_solvency() {
        let mut fx = setup();
        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(10)), amt(dec!(10000)))
            .unwrap();

        // at the floor already; removing any collateral would break it
        let result = fx.engine.redeem_collateral(ALICE, ETH, amt(dec!(0.1)));
        assert!(matches!(result, Err(EngineError::HealthFactorBroken(_))));
        assert_eq!(fx.engine.collateral_of(ALICE, ETH).value(), dec!(10));
        assert_eq!(fx.collateral.balance_of(Holder::Engine).value(), dec!(10));
    }

    #[test]
    fn redeem_more_than_deposited_rejected() {
        let mut fx = setup();
        fx.engine.deposit_collateral(ALICE, ETH, amt(dec!(2))).unwrap();

        let result = fx.engine.redeem_collateral(ALICE, ETH, amt(dec!(3)));
        assert!(matches!(result, Err(EngineError::InsufficientCollateral { .. })));
    }

    #[test]
    fn burn_retires_debt_and_supply() {
        let mut fx = setup();
        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(10)), amt(dec!(5000)))
            .unwrap();

        fx.engine.burn(ALICE, amt(dec!(2000))).unwrap();

        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(3000));
        assert_eq!(fx.synthetic.balance_of(Holder::User(ALICE)).value(), dec!(3000));
        assert_eq!(fx.synthetic.total_supply().value(), dec!(3000));
    }

    #[test]
    fn burn_more_than_debt_rejected() {
        let mut fx = setup();
        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(10)), amt(dec!(100)))
            .unwrap();

        let result = fx.engine.burn(ALICE, amt(dec!(101)));
        assert!(matches!(result, Err(EngineError::InsufficientDebt { .. })));
        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(100));
    }

    #[test]
    fn redeem_and_burn_unwinds_together() {
        let mut fx = setup();
        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(10)), amt(dec!(10000)))
            .unwrap();

        // burning half the debt frees half the collateral
        fx.engine
            .redeem_and_burn(ALICE, ETH, amt(dec!(5)), amt(dec!(5000)))
            .unwrap();

        assert_eq!(fx.engine.collateral_of(ALICE, ETH).value(), dec!(5));
        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(5000));
        assert_eq!(fx.engine.health_factor(ALICE).unwrap().value(), Decimal::ONE);
    }

    #[test]
    fn full_exit_leaves_no_position() {
        let mut fx = setup();
        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(10)), amt(dec!(5000)))
            .unwrap();

        fx.engine
            .redeem_and_burn(ALICE, ETH, amt(dec!(10)), amt(dec!(5000)))
            .unwrap();

        assert!(fx.engine.position(ALICE).is_none());
        assert!(fx.engine.health_factor(ALICE).unwrap().is_max());
        assert_eq!(fx.collateral.balance_of(Holder::User(ALICE)).value(), dec!(100));
        assert!(fx.synthetic.total_supply().is_zero());
    }

    #[test]
    fn liquidation_pays_the_bonus() {
        let mut fx = setup();

        // victim at the floor, then the price slides
        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(1)), amt(dec!(1000)))
            .unwrap();
        fx.price.set_price(180_000_000_000); // $1800
        assert_eq!(fx.engine.health_factor(ALICE).unwrap().value(), dec!(0.9));

        // Bob funds his synthetic balance with his own over-collateralized mint
        fx.engine
            .deposit_and_mint(BOB, ETH, amt(dec!(10)), amt(dec!(1000)))
            .unwrap();

        let before = fx.engine.health_factor(ALICE).unwrap();
        let outcome = fx.engine.liquidate(BOB, ALICE, ETH, amt(dec!(900))).unwrap();

        // $900 of debt at $1800 is 0.5 units, plus the 10% bonus
        assert_eq!(outcome.debt_covered.value(), dec!(900));
        assert_eq!(outcome.bonus_collateral.value(), dec!(0.05));
        assert_eq!(outcome.collateral_seized.value(), dec!(0.55));

        assert!(outcome.victim_health_after > before);
        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(100));
        assert_eq!(fx.engine.collateral_of(ALICE, ETH).value(), dec!(0.45));

        // Bob paid 900 synthetic and received the seized collateral
        assert_eq!(fx.synthetic.balance_of(Holder::User(BOB)).value(), dec!(100));
        assert_eq!(fx.collateral.balance_of(Holder::User(BOB)).value(), dec!(90.55));
        assert_eq!(fx.synthetic.total_supply().value(), dec!(1100));
    }

    #[test]
    fn liquidating_a_healthy_position_rejected() {
        let mut fx = setup();
        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(10)), amt(dec!(1000)))
            .unwrap();
        fx.engine
            .deposit_and_mint(BOB, ETH, amt(dec!(10)), amt(dec!(1000)))
            .unwrap();

        let result = fx.engine.liquidate(BOB, ALICE, ETH, amt(dec!(100)));
        assert!(matches!(result, Err(EngineError::HealthFactorOk(_))));
    }

    #[test]
    fn liquidation_covering_too_little_rejected() {
        let mut fx = setup();
        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(1)), amt(dec!(1000)))
            .unwrap();
        fx.price.set_price(100_000_000_000); // $1000: deep under water

        fx.engine
            .deposit_and_mint(BOB, ETH, amt(dec!(10)), amt(dec!(1000)))
            .unwrap();

        // a trivial cover cannot lift the ratio
        let result = fx.engine.liquidate(BOB, ALICE, ETH, amt(dec!(0.000001)));
        assert!(matches!(result, Err(EngineError::HealthFactorNotImproved(_))));
        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(1000));
    }

    #[test]
    fn liquidator_must_be_solvent_themselves() {
        let mut fx = setup();

        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(1)), amt(dec!(1000)))
            .unwrap();
        fx.engine
            .deposit_and_mint(BOB, ETH, amt(dec!(1)), amt(dec!(1000)))
            .unwrap();

        // the drop puts both of them under water
        fx.price.set_price(180_000_000_000);

        let result = fx.engine.liquidate(BOB, ALICE, ETH, amt(dec!(900)));
        assert!(matches!(result, Err(EngineError::HealthFactorBroken(_))));
        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(1000));
    }

    #[test]
    fn liquidation_without_synthetic_funds_rolls_back() {
        let mut fx = setup();

        fx.engine
            .deposit_and_mint(ALICE, ETH, amt(dec!(1)), amt(dec!(1000)))
            .unwrap();
        fx.price.set_price(180_000_000_000);

        // Bob never minted, so the pull of his synthetic fails
        let result = fx.engine.liquidate(BOB, ALICE, ETH, amt(dec!(900)));
        assert!(matches!(result, Err(EngineError::TransferFailed(_))));
        assert_eq!(fx.engine.debt_of(ALICE).value(), dec!(1000));
        assert_eq!(fx.engine.collateral_of(ALICE, ETH).value(), dec!(1));
    }

    #[test]
    fn reentrant_call_rejected() {
        let mut fx = setup();
        fx.engine.busy = true;

        let result = fx.engine.deposit_collateral(ALICE, ETH, amt(dec!(1)));
        assert!(matches!(result, Err(EngineError::ReentrantCall)));
    }

    #[test]
    fn rejected_operation_is_journaled() {
        let mut fx = setup();

        let _ = fx.engine.deposit_collateral(ALICE, AssetId(99), amt(dec!(1)));

        let last = fx.engine.recent_events(1).first().cloned().unwrap();
        match last.payload {
            EventPayload::OperationRejected(e) => {
                assert_eq!(e.operation, "deposit_collateral");
                assert_eq!(e.user, ALICE);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn stale_quote_blocks_debt_operations() {
        let mut fx = setup();
        fx.engine.deposit_collateral(ALICE, ETH, amt(dec!(10))).unwrap();

        // quote produced at t=0 with a 60s ttl; jump past it
        fx.engine.set_time(crate::types::Timestamp::from_millis(120_000));

        let result = fx.engine.mint(ALICE, amt(dec!(1)));
        assert!(matches!(result, Err(EngineError::InvalidPriceQuote(_))));
        assert!(fx.engine.debt_of(ALICE).is_zero());
    }
}
