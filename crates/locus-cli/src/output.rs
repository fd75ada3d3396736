//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use locus::{
    ActionKind, ElementHandle, Locator, ScoredSelector, SelectorSet, Target, WaitOutcome,
    WaitPlan,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CliResult;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

#[derive(Serialize)]
struct CandidateReport<'a> {
    recommended: Option<&'a ScoredSelector>,
    candidates: Vec<&'a ScoredSelector>,
}

#[derive(Serialize)]
struct SmartReport<'a> {
    action: &'a str,
    family: ActionKind,
    condition: &'static str,
    waits_for: String,
}

#[derive(Serialize)]
struct PlanReport<'a> {
    valid: bool,
    target: &'static str,
    locators: Vec<&'a Locator>,
    condition: String,
    timeout_ms: u64,
    poll_interval_ms: u64,
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    status: &'static str,
    message: String,
    waited_for: Option<&'a str>,
    attempts: u32,
    elapsed_ms: u64,
    elements: Vec<&'a str>,
}

/// Renders command results as text or JSON
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
    use_color: bool,
}

impl Renderer {
    /// Create a renderer
    #[must_use]
    pub const fn new(format: OutputFormat, use_color: bool) -> Self {
        Self { format, use_color }
    }

    fn styled(&self, style: Style) -> Style {
        style.force_styling(self.use_color)
    }

    fn pass(&self) -> String {
        if self.use_color {
            style("✓").green().bold().force_styling(true).to_string()
        } else {
            "PASS".to_string()
        }
    }

    fn fail(&self) -> String {
        if self.use_color {
            style("✗").red().bold().force_styling(true).to_string()
        } else {
            "FAIL".to_string()
        }
    }

    fn score_line(&self, scored: &ScoredSelector) -> String {
        let score = self.styled(Style::new().cyan().bold());
        format!(
            "{:>3}  {}  {}",
            score.apply_to(scored.score),
            scored.locator,
            self.styled(Style::new().dim()).apply_to(&scored.rationale)
        )
    }

    /// Render a single scored locator
    pub fn score(&self, scored: &ScoredSelector) -> CliResult<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(scored)?),
            OutputFormat::Text => Ok(self.score_line(scored)),
        }
    }

    /// Render a candidate set, best first
    pub fn selectors(&self, set: &SelectorSet) -> CliResult<String> {
        let ranked = set.ranked();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&CandidateReport {
                recommended: set.recommend(),
                candidates: ranked,
            })?),
            OutputFormat::Text => {
                let mut lines: Vec<String> = ranked.iter().map(|s| self.score_line(s)).collect();
                match set.recommend() {
                    Some(best) => lines.push(format!(
                        "{} recommended: {}",
                        self.pass(),
                        self.styled(Style::new().bold()).apply_to(&best.locator)
                    )),
                    None => lines.push(format!("{} no candidates", self.fail())),
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Render the smart-wait mapping for an action name
    pub fn smart(&self, action: &str, kind: ActionKind) -> CliResult<String> {
        let condition = kind.required_condition();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&SmartReport {
                action,
                family: kind,
                condition: condition.kind().as_str(),
                waits_for: condition.to_string(),
            })?),
            OutputFormat::Text => Ok(format!(
                "{action}: waits for the element {}",
                self.styled(Style::new().bold()).apply_to(condition)
            )),
        }
    }

    /// Render a validated wait plan
    pub fn plan(&self, plan: &WaitPlan) -> CliResult<String> {
        let (target, locators): (&'static str, Vec<&Locator>) = match &plan.target {
            Target::One(locator) => ("one", vec![locator]),
            Target::All(locators) => ("all", locators.iter().collect()),
            Target::Any(locators) => ("any", locators.iter().collect()),
        };
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&PlanReport {
                valid: true,
                target,
                locators,
                condition: plan.condition.to_string(),
                timeout_ms: plan.options.timeout_ms,
                poll_interval_ms: plan.options.poll_interval_ms,
            })?),
            OutputFormat::Text => Ok(format!(
                "{} {} of [{}] {} (timeout {}ms, every {}ms)",
                self.pass(),
                target,
                locators
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                plan.condition,
                plan.options.timeout_ms,
                plan.options.poll_interval_ms
            )),
        }
    }

    /// Render the outcome of a plan run
    pub fn outcome(&self, outcome: &WaitOutcome<Vec<ElementHandle>>) -> CliResult<String> {
        let status = match outcome {
            WaitOutcome::Success(..) => "success",
            WaitOutcome::Timeout(_) => "timeout",
            WaitOutcome::Cancelled(_) => "cancelled",
            WaitOutcome::ConfigError(_) => "config_error",
        };
        let report = outcome.report();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&OutcomeReport {
                status,
                message: outcome.to_string(),
                waited_for: report.map(|r| r.waited_for.as_str()),
                attempts: report.map_or(0, |r| r.attempts),
                elapsed_ms: report.map_or(0, |r| r.elapsed.as_millis() as u64),
                elements: outcome
                    .value()
                    .map(|elements| elements.iter().map(|e| e.id.as_str()).collect())
                    .unwrap_or_default(),
            })?),
            OutputFormat::Text => {
                let prefix = if outcome.is_success() {
                    self.pass()
                } else {
                    self.fail()
                };
                Ok(format!("{prefix} {outcome}"))
            }
        }
    }
}

/// Spinner shown on stderr while a wait polls
#[derive(Debug)]
pub struct WaitSpinner {
    bar: Option<ProgressBar>,
}

impl WaitSpinner {
    /// Start a spinner unless output is quiet or not a terminal
    #[must_use]
    pub fn start(message: &str, enabled: bool) -> Self {
        if !enabled || !Term::stderr().is_term() {
            return Self { bar: None };
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    /// Remove the spinner
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
