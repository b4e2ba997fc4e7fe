//! CLI, configuration and command wiring
//!
//! This crate provides the `driveinvite` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod form;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
