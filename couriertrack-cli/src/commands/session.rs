//! Session commands - manage the stored bearer token.

use clap::Subcommand;
use couriertrack::config::ConfigFile;
use couriertrack::session::SessionStore;

use super::common::mask_secret;
use crate::error::CliError;

/// Session subcommands.
#[derive(Debug, Subcommand)]
pub enum SessionCommands {
    /// Show whether a token is stored (masked)
    Show,

    /// Store a bearer token
    Set {
        /// Token issued by the tracking service
        token: String,
    },

    /// Remove the stored token
    Clear,
}

/// Run a session subcommand.
pub fn run(command: SessionCommands) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let store = SessionStore::new(config.session.token_file);

    match command {
        SessionCommands::Show => match store.load()? {
            Some(token) => println!("Signed in ({})", mask_secret(&token)),
            None => println!("Not signed in"),
        },
        SessionCommands::Set { token } => {
            store.save(&token)?;
            println!("Token saved to {}", store.path().display());
        }
        SessionCommands::Clear => {
            store.clear()?;
            println!("Signed out");
        }
    }
    Ok(())
}
