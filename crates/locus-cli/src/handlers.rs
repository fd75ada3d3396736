//! Subcommand handlers
//!
//! Each handler writes its rendered result to `out` and returns an error
//! whose [`CliError::exit_code`] decides the process status.

use locus::{
    parse_document, ActionKind, ElementDescriptor, ElementWaiter, Locator, MockPage,
    SelectorGenerator, Strategy, WaitOutcome, WaitRequest,
};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::commands::{CheckArgs, GenerateArgs, ScoreArgs, SmartArgs, WaitArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, Renderer, WaitSpinner};

fn renderer(config: &CliConfig) -> Renderer {
    Renderer::new(config.format, config.color.should_color())
}

fn read_input(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Quiet mode drops successful text output; JSON is always written
fn emit<W: Write>(config: &CliConfig, out: &mut W, rendered: &str, failed: bool) -> CliResult<()> {
    if config.verbosity.is_quiet() && config.format == OutputFormat::Text && !failed {
        return Ok(());
    }
    writeln!(out, "{rendered}")?;
    Ok(())
}

/// `locus score <strategy> <value>`
pub fn score<W: Write>(config: &CliConfig, args: &ScoreArgs, out: &mut W) -> CliResult<()> {
    let strategy: Strategy = args.strategy.parse()?;
    let locator = Locator::new(strategy, args.value.as_str())?;
    let scored = locus::score_locator(&locator);
    debug!(locator = %locator, score = scored.score, "scored locator");
    emit(config, out, &renderer(config).score(&scored)?, false)
}

/// `locus generate <descriptor>`
pub fn generate<W: Write>(config: &CliConfig, args: &GenerateArgs, out: &mut W) -> CliResult<()> {
    let descriptor: ElementDescriptor = parse_document(&read_input(&args.descriptor)?)?;
    let set = SelectorGenerator::new().generate(&descriptor);
    info!(candidates = set.len(), "generated selectors");
    emit(config, out, &renderer(config).selectors(&set)?, set.is_empty())
}

/// `locus smart <action>`
pub fn smart<W: Write>(config: &CliConfig, args: &SmartArgs, out: &mut W) -> CliResult<()> {
    let kind = ActionKind::from_name(&args.action);
    emit(config, out, &renderer(config).smart(&args.action, kind)?, false)
}

/// `locus check <request>`
pub fn check<W: Write>(config: &CliConfig, args: &CheckArgs, out: &mut W) -> CliResult<()> {
    let plan = WaitRequest::from_document(&read_input(&args.request)?)?.plan()?;
    emit(config, out, &renderer(config).plan(&plan)?, false)
}

/// `locus wait <page> <request>`
pub fn wait<W: Write>(config: &CliConfig, args: &WaitArgs, out: &mut W) -> CliResult<()> {
    let page = MockPage::from_fixture(&read_input(&args.page)?)?;
    let plan = WaitRequest::from_document(&read_input(&args.request)?)?.plan()?;
    info!(
        page = %args.page.display(),
        condition = %plan.condition,
        "starting wait"
    );

    let spinner = WaitSpinner::start(
        &format!("waiting for {}", plan.condition),
        config.format == OutputFormat::Text && !config.verbosity.is_quiet(),
    );
    let outcome = plan.run(&ElementWaiter::new(&page));
    spinner.finish();

    let rendered = renderer(config).outcome(&outcome)?;
    emit(config, out, &rendered, !outcome.is_success())?;
    match outcome {
        WaitOutcome::Success(..) => Ok(()),
        WaitOutcome::Timeout(report) => Err(CliError::wait_failed(report.timeout_message())),
        WaitOutcome::Cancelled(report) => Err(CliError::wait_failed(format!(
            "cancelled waiting for {}",
            report.waited_for
        ))),
        WaitOutcome::ConfigError(message) => Err(CliError::config(message)),
    }
}
