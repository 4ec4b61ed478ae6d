//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`init`] - Configuration initialization
//! - [`session`] - Stored session token (show, set, clear)
//! - [`simulate`] - Demo tracking server
//! - [`track`] - Live tracking of one order

pub mod common;
pub mod config;
pub mod init;
pub mod session;
pub mod simulate;
pub mod track;
