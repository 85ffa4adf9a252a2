//! RailFX Simulator
//!
//! Command-line driver exercising the engine's top-level operations:
//! quotes, fiat routing, multi-rail routing, and the deals workflow.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod scenario;

use scenario::{Scenario, ScenarioRunner};

/// RailFX scenario driver.
#[derive(Parser, Debug)]
#[command(name = "railfx-simulator")]
#[command(about = "Drive the RailFX routing and pricing engine")]
struct Args {
    /// Scenario to run: quote, routing, multi-rail, deals, or all
    #[arg(short, long, default_value = "all")]
    scenario: String,

    /// Directory for durable deal documents (in-memory when omitted)
    #[arg(long)]
    data_dir: Option<String>,

    /// Reference data document (built-in defaults when omitted)
    #[arg(long)]
    reference_data: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let scenario = Scenario::parse(&args.scenario)?;

    info!(scenario = %args.scenario, "Starting RailFX simulator");

    let runner = ScenarioRunner::new(args.reference_data.as_deref(), args.data_dir.as_deref())?;
    runner.run(scenario).await?;

    info!("Simulation complete");
    Ok(())
}
