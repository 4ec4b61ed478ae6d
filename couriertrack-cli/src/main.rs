//! CourierTrack CLI - Command-line interface
//!
//! This binary provides a command-line interface to the CourierTrack library.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use couriertrack::geo::Position;

use commands::common::parse_position;
use commands::config::ConfigCommands;
use commands::session::SessionCommands;
use commands::simulate::SimulateArgs;
use commands::track::TrackArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "couriertrack")]
#[command(version = couriertrack::VERSION)]
#[command(about = "Follow a delivery courier in real time", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a delivery order live
    Track {
        /// Order to track
        order_id: String,

        /// Tracking server (host:port), overrides server.url
        #[arg(long)]
        server: Option<String>,

        /// Bearer token, overrides the stored session
        #[arg(long)]
        token: Option<String>,

        /// Store location as LAT,LON
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
        store: Option<Position>,

        /// Customer location as LAT,LON
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
        customer: Option<Position>,

        /// Compute a route from the courier to the customer
        #[arg(long)]
        route: bool,

        /// Map provider key, overrides map.api_key
        #[arg(long)]
        map_key: Option<String>,

        /// Enable debug logging to stderr
        #[arg(long)]
        debug: bool,
    },

    /// Run a demo tracking server
    Simulate {
        /// Address to listen on (host:port)
        #[arg(long)]
        bind: Option<String>,

        /// Store location as LAT,LON
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
        store: Option<Position>,

        /// Customer location as LAT,LON
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
        customer: Option<Position>,

        /// Number of legs between store and customer
        #[arg(long)]
        steps: Option<u32>,

        /// Milliseconds between location updates
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Require clients to present this bearer token
        #[arg(long)]
        token: Option<String>,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Create the configuration file with defaults
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Manage the stored session token
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Track {
            order_id,
            server,
            token,
            store,
            customer,
            route,
            map_key,
            debug,
        } => {
            commands::track::run(TrackArgs {
                order_id,
                server,
                token,
                store,
                customer,
                route,
                map_key,
                debug,
            })
            .await
        }
        Commands::Simulate {
            bind,
            store,
            customer,
            steps,
            interval_ms,
            token,
        } => {
            commands::simulate::run(SimulateArgs {
                bind,
                store,
                customer,
                steps,
                interval_ms,
                token,
            })
            .await
        }
        Commands::Config { command } => commands::config::run(command),
        Commands::Init { force } => commands::init::run(force),
        Commands::Session { command } => commands::session::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
