//! Simulate command - run the demo tracking server.

use std::time::Duration;

use couriertrack::geo::Position;
use couriertrack::simulator::{SimulatedServer, SimulatorConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub bind: Option<String>,
    pub store: Option<Position>,
    pub customer: Option<Position>,
    pub steps: Option<u32>,
    pub interval_ms: Option<u64>,
    pub token: Option<String>,
}

/// Run the simulate command until Ctrl+C.
pub async fn run(args: SimulateArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(false, true)?;
    runner.log_startup("simulate");
    let config = runner.config();

    let defaults = SimulatorConfig::default();
    let sim_config = SimulatorConfig {
        bind: args.bind.unwrap_or_else(|| config.server.url.clone()),
        store: args.store.unwrap_or(defaults.store),
        customer: args.customer.unwrap_or(defaults.customer),
        steps: args.steps.unwrap_or(defaults.steps),
        interval: args
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.interval),
        token: args.token,
        speed_kmh: config.map.courier_speed_kmh,
    };

    println!("CourierTrack Simulator v{}", couriertrack::VERSION);
    println!("=============================");
    println!();
    println!("Store:    {}", sim_config.store);
    println!("Customer: {}", sim_config.customer);
    println!(
        "Walk:     {} steps every {} ms",
        sim_config.steps,
        sim_config.interval.as_millis()
    );
    println!(
        "Auth:     {}",
        if sim_config.token.is_some() {
            "bearer token required"
        } else {
            "open"
        }
    );

    let server = SimulatedServer::bind(sim_config).await?;
    println!("Listening on {}", server.local_addr());
    println!();
    println!("Press Ctrl+C to stop");

    let cancellation = CancellationToken::new();
    let serve = tokio::spawn(server.serve(cancellation.clone()));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    cancellation.cancel();

    match serve.await {
        Ok(result) => result?,
        Err(e) => return Err(CliError::Task(e.to_string())),
    }

    println!();
    println!("Simulator stopped.");
    Ok(())
}
