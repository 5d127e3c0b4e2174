//! Liquidation simulator
//!
//! Plays a JSON market scenario through the liquidation engine block by block
//! and prints one JSON report per block.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use borrow_liquidation::core::config::LiquidationConfig;
use borrow_liquidation::simulation::{Scenario, Simulation};

/// Replay a lending market scenario through the borrow liquidation engine
#[derive(Parser)]
#[command(name = "liquidation-sim")]
#[command(version = borrow_liquidation::VERSION)]
#[command(about = "Block-by-block borrow liquidation simulator", long_about = None)]
struct Cli {
    /// Scenario file (JSON)
    #[arg(short, long, env = "LIQUIDATION_SCENARIO")]
    scenario: PathBuf,

    /// Number of blocks to simulate
    #[arg(short, long, default_value_t = 10)]
    blocks: u64,

    /// Engine configuration file (JSON); defaults apply when omitted
    #[arg(short, long, env = "LIQUIDATION_CONFIG")]
    config: Option<PathBuf>,

    /// Pretty-print reports
    #[arg(short, long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LiquidationConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LiquidationConfig::default(),
    };
    let scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;

    let mut simulation = Simulation::new(scenario, config).context("seeding simulation")?;
    for _ in 0..cli.blocks {
        let report = simulation.step()?;
        let line = if cli.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{}", line);
    }

    let stats = simulation.engine().statistics();
    tracing::info!(
        "Done: locked {}, settled {}, closed {}, reopened {}, skipped {}",
        stats.total_locked,
        stats.total_settlements,
        stats.total_closed,
        stats.total_reopened,
        stats.total_skipped
    );
    Ok(())
}
