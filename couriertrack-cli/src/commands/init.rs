//! Init command - write a default configuration file.

use couriertrack::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(force: bool) -> Result<(), CliError> {
    let path = config_file_path();

    if path.exists() && !force {
        println!("Configuration file already exists at {}", path.display());
        println!("Use 'couriertrack init --force' to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;

    println!("Created {}", path.display());
    println!();
    println!("Next steps:");
    println!("  couriertrack session set <TOKEN>         store your bearer token");
    println!("  couriertrack config set map.api_key <KEY>  enable the map view");
    println!("  couriertrack track <ORDER_ID>            follow a delivery");
    Ok(())
}
