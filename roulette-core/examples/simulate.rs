//! Run a batch of headless PvE sessions and print a summary.
//!
//! Usage: `cargo run -p roulette-core --example simulate -- [sessions] [seed]`
//! Set `RUST_LOG=roulette_core=debug` to watch every decision.

use roulette_core::{
    EngineConfig, HeadlessConfig, HeadlessMatch, Outcome, Pact, RngSource, Talent,
};
use std::collections::BTreeMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let sessions: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(200);
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);

    let mut outcomes: BTreeMap<String, u32> = BTreeMap::new();
    let mut levels = 0u32;
    let mut shots = 0u32;

    for i in 0..sessions {
        let engine_config = EngineConfig::pve()
            .with_talent(Talent::Quick)
            .with_pact(Pact::Power);
        let mut game = HeadlessMatch::new(
            HeadlessConfig::default().with_max_levels(5),
            engine_config,
            RngSource::seeded(seed.wrapping_add(i)),
        )?;
        let report = game.run()?;

        let label = match report.outcome {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
            Outcome::Draw => "draw",
        };
        *outcomes.entry(label.to_string()).or_default() += 1;
        levels += report.levels_cleared;
        shots += report.shots;
    }

    println!("{sessions} sessions from seed {seed}");
    for (label, count) in &outcomes {
        println!("  {label:>8}: {count}");
    }
    println!(
        "  avg bosses beaten: {:.2}",
        levels as f64 / sessions.max(1) as f64
    );
    println!("  avg shots: {:.1}", shots as f64 / sessions.max(1) as f64);
    Ok(())
}
