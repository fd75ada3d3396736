//! Locus CLI Library
//!
//! Command-line front end for the Locus targeting and waiting engine:
//! score locators, generate candidate selectors from element descriptors,
//! inspect smart-wait mappings, validate wait requests and run them
//! against scripted page fixtures.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    CheckArgs, Cli, ColorArg, Commands, FormatArg, GenerateArgs, ScoreArgs, SmartArgs, WaitArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult, EXIT_FAILURE, EXIT_WAIT_FAILED};
pub use output::{OutputFormat, Renderer, WaitSpinner};
