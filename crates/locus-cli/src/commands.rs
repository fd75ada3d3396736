//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Locus: score selectors, generate robust candidates and run scripted waits
#[derive(Parser, Debug)]
#[command(name = "locus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Output format
    #[arg(long, default_value = "text", global = true)]
    pub format: FormatArg,

    /// Emit log records as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a locator for robustness
    Score(ScoreArgs),

    /// Generate and rank candidate selectors for an element descriptor
    Generate(GenerateArgs),

    /// Show the condition smart waiting uses for an action
    Smart(SmartArgs),

    /// Validate a wait request document
    Check(CheckArgs),

    /// Run a wait request against a scripted page fixture
    ///
    /// Exits 0 when the condition holds, 2 on timeout and 1 when the
    /// request or fixture is invalid.
    Wait(WaitArgs),
}

/// Arguments for the score command
#[derive(Parser, Debug)]
pub struct ScoreArgs {
    /// Locator strategy (id, name, css, xpath, link_text, tag, class, text)
    pub strategy: String,

    /// Locator value
    pub value: String,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Element descriptor (JSON or YAML)
    pub descriptor: PathBuf,
}

/// Arguments for the smart command
#[derive(Parser, Debug)]
pub struct SmartArgs {
    /// Action name, e.g. click, input, hover, drag_and_drop
    pub action: String,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Wait request (JSON or YAML)
    pub request: PathBuf,
}

/// Arguments for the wait command
#[derive(Parser, Debug)]
pub struct WaitArgs {
    /// Page fixture (JSON or YAML)
    pub page: PathBuf,

    /// Wait request (JSON or YAML)
    pub request: PathBuf,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}
