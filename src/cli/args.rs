//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    check::CheckArgs, completions::CompletionsArgs, lint::LintArgs, list::ListArgs,
    show::ShowArgs, template::TemplateArgs,
};

#[derive(Parser)]
#[command(name = "intake")]
#[command(author, version, about = "Intake form engine")]
#[command(
    long_about = "A schema-driven form engine: form definitions as plain text YAML files, \
                  with validation, inter-field dependencies, and submission evaluation."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Directory holding *.form.yaml definitions (default: ./forms)
    #[arg(long, global = true, env = "INTAKE_FORMS_DIR")]
    pub forms_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate form schema files
    Lint(LintArgs),

    /// List registered forms
    List(ListArgs),

    /// Show the fields of one form
    Show(ShowArgs),

    /// Evaluate a submission against a form
    Check(CheckArgs),

    /// Generate a CSV entry template for a form
    Template(TemplateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pick a format based on the terminal
    Auto,
    /// Aligned columns for humans
    Tsv,
    /// RFC 4180 CSV for pipelines
    Csv,
    /// JSON for pipelines
    Json,
    /// Markdown tables
    Md,
}
