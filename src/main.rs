//! Synthetic Asset Engine Simulation.
//!
//! Walks the full position lifecycle: deposit, mint, the solvency boundary,
//! a price crash, and a third-party liquidation with the bonus payout.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use synth_core::*;

const ETH: AssetId = AssetId(1);
const PRICE_2000: i64 = 200_000_000_000; // $2000, 8 implied decimals

fn main() {
    println!("Synthetic Asset Engine Simulation");
    println!("Single Collateral Asset, 200% Collateralization, Full Lifecycle\n");

    scenario_1_position_lifecycle();
    scenario_2_mint_boundary();
    scenario_3_liquidation();
    scenario_4_rejected_operations();

    println!("\nAll simulations completed successfully.");
}

struct Sim {
    engine: Engine,
    price: SourceHandle,
    collateral: TokenHandle,
    synthetic: TokenHandle,
}

fn setup() -> Sim {
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
    .expect("paired construction lists");

    Sim {
        engine,
        price,
        collateral,
        synthetic,
    }
}

fn amt(d: Decimal) -> Amount {
    Amount::new_unchecked(d)
}

/// Deposit, mint, partial unwind, full exit.
fn scenario_1_position_lifecycle() {
    println!("Scenario 1: Position Lifecycle\n");

    let mut sim = setup();
    let alice = UserId(1);
    sim.collateral.credit(Holder::User(alice), amt(dec!(20)));

    println!("  Oracle price: $2,000 per unit");

    sim.engine.deposit_collateral(alice, ETH, amt(dec!(10))).unwrap();
    println!(
        "  Alice deposits 10 units, collateral value: {}",
        sim.engine.total_collateral_value(alice).unwrap()
    );

    sim.engine.mint(alice, amt(dec!(5000))).unwrap();
    println!(
        "  Alice mints 5,000 sUSD, health factor: {}",
        sim.engine.health_factor(alice).unwrap()
    );

    sim.engine
        .redeem_and_burn(alice, ETH, amt(dec!(5)), amt(dec!(2500)))
        .unwrap();
    println!(
        "  Alice unwinds half: 5 units out, 2,500 sUSD burned, health factor: {}",
        sim.engine.health_factor(alice).unwrap()
    );

    sim.engine
        .redeem_and_burn(alice, ETH, amt(dec!(5)), amt(dec!(2500)))
        .unwrap();
    println!(
        "  Alice exits fully. wallet: {} units, synthetic supply: {}\n",
        sim.collateral.balance_of(Holder::User(alice)),
        sim.synthetic.total_supply()
    );
}

/// The solvency boundary: half of collateral value is the debt ceiling.
fn scenario_2_mint_boundary() {
    println!("Scenario 2: Mint Boundary\n");

    let mut sim = setup();
    let alice = UserId(1);
    sim.collateral.credit(Holder::User(alice), amt(dec!(10)));

    sim.engine
        .deposit_and_mint(alice, ETH, amt(dec!(10)), amt(dec!(9999)))
        .unwrap();
    println!(
        "  Alice deposits 10 units ($20,000) and mints 9,999 sUSD, health factor: {}",
        sim.engine.health_factor(alice).unwrap()
    );

    sim.engine.mint(alice, amt(dec!(1))).unwrap();
    println!(
        "  Minting 1 more lands exactly on the floor: {}",
        sim.engine.health_factor(alice).unwrap()
    );

    match sim.engine.mint(alice, amt(dec!(1))) {
        Err(e) => println!("  Minting past the floor is rejected: {e}\n"),
        Ok(_) => unreachable!("the floor must hold"),
    }
}

/// A price crash and the liquidation that restores solvency.
fn scenario_3_liquidation() {
    println!("Scenario 3: Liquidation\n");

    let mut sim = setup();
    let alice = UserId(1);
    let bob = UserId(2);
    sim.collateral.credit(Holder::User(alice), amt(dec!(1)));
    sim.collateral.credit(Holder::User(bob), amt(dec!(10)));

    sim.engine
        .deposit_and_mint(alice, ETH, amt(dec!(1)), amt(dec!(1000)))
        .unwrap();
    println!("  Alice: 1 unit of collateral, 1,000 sUSD of debt, health factor 1");

    sim.price.set_price(180_000_000_000);
    println!(
        "  Price drops to $1,800. Alice's health factor: {}",
        sim.engine.health_factor(alice).unwrap()
    );

    sim.engine
        .deposit_and_mint(bob, ETH, amt(dec!(10)), amt(dec!(1000)))
        .unwrap();

    let outcome = sim.engine.liquidate(bob, alice, ETH, amt(dec!(900))).unwrap();
    println!(
        "  Bob covers {} sUSD and seizes {} units ({} of it bonus)",
        outcome.debt_covered, outcome.collateral_seized, outcome.bonus_collateral
    );
    println!(
        "  Alice's health factor after: {} (debt {}, collateral {})\n",
        outcome.victim_health_after,
        sim.engine.debt_of(alice),
        sim.engine.collateral_of(alice, ETH)
    );
}

/// Failed operations roll back completely and leave an audit trace.
fn scenario_4_rejected_operations() {
    println!("Scenario 4: Rejected Operations\n");

    let mut sim = setup();
    let alice = UserId(1);
    sim.collateral.credit(Holder::User(alice), amt(dec!(10)));

    match sim.engine.deposit_collateral(alice, AssetId(99), amt(dec!(1))) {
        Err(e) => println!("  Deposit of unapproved asset: {e}"),
        Ok(_) => unreachable!(),
    }

    match sim.engine.deposit_and_mint(alice, ETH, amt(dec!(10)), amt(dec!(50000))) {
        Err(e) => println!("  Over-minting composite: {e}"),
        Ok(_) => unreachable!(),
    }
    println!(
        "  Nothing stuck: collateral balance {}, debt {}",
        sim.engine.collateral_of(alice, ETH),
        sim.engine.debt_of(alice)
    );

    println!("  Audit journal holds {} events", sim.engine.events().len());
}
