//! `intake check` command - evaluate a submission against a form

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::load_registry;
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::ledger::MemoryLedger;
use crate::core::submission::{CapabilityFlags, Submission};
use crate::engine::evaluate::evaluate;
use crate::engine::validate::{FieldOutcome, ValidatorRegistry};

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Form name
    pub form: String,

    /// Submission file (YAML mapping of field name to value)
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Treat the submission as carrying an authenticated identity
    #[arg(long)]
    pub authenticated: bool,

    /// Identity tag for the submission
    #[arg(long, env = "INTAKE_IDENTITY")]
    pub identity: Option<String>,

    /// Override the form's repeat-submission policy for this attempt
    #[arg(long)]
    pub allow_repeat: bool,
}

pub fn run(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let registry = load_registry(global).into_diagnostic()?;
    let form = registry.get(&args.form).into_diagnostic()?;

    let content = std::fs::read_to_string(&args.input).into_diagnostic()?;
    let submission: Submission = serde_yml::from_str(&content)
        .map_err(|e| miette::miette!("invalid submission file {}: {}", args.input.display(), e))?;

    let identity = args.identity.or_else(|| Config::load().identity);

    let caps = CapabilityFlags {
        is_authenticated: args.authenticated || identity.is_some(),
        is_repeat_attempt_allowed_override: args.allow_repeat,
    };

    // One-shot evaluation: a fresh ledger, so only schema and policy
    // decisions are exercised, never cross-run duplicate state
    let ledger = MemoryLedger::new();
    let validators = ValidatorRegistry::new();

    let report = evaluate(
        &form,
        &submission,
        &caps,
        identity.as_deref(),
        &ledger,
        &validators,
    )
    .map_err(|e| miette::miette!("{}", e))?;

    for (name, outcome) in &report.fields {
        match outcome {
            FieldOutcome::Accepted(value) => {
                if !global.quiet {
                    println!("{} {} = {}", style("✓").green(), name, value);
                }
            }
            FieldOutcome::Rejected(reasons) => {
                for reason in reasons {
                    println!("{} {} - {}", style("✗").red(), name, reason);
                }
            }
        }
    }

    if !global.quiet {
        println!();
    }

    if report.is_accepted() {
        if !global.quiet {
            println!(
                "{} Submission accepted ({} field(s) evaluated)",
                style("✓").green().bold(),
                report.fields.len()
            );
        }
        Ok(())
    } else {
        Err(miette::miette!(
            "submission rejected: {} field(s) failed",
            report.rejections().len()
        ))
    }
}
