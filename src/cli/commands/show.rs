//! `intake show` command - show the fields of one form

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{load_registry, truncate_str};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Form name
    pub form: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let registry = load_registry(global).into_diagnostic()?;
    let form = registry.get(&args.form).into_diagnostic()?;

    println!("{}", style(&form.name).cyan().bold());
    if !form.description.is_empty() {
        println!("{}", form.description);
    }
    println!();

    println!(
        "{:<20} {:<10} {:<8} {:<9} {:<24} {}",
        style("FIELD").bold(),
        style("KIND").bold(),
        style("OUTPUT").bold(),
        style("REQUIRED").bold(),
        style("DEPENDS ON").bold(),
        style("VALIDATORS").bold()
    );
    println!("{}", "-".repeat(90));

    for field in &form.fields {
        let depends = field
            .depends_on
            .as_ref()
            .map(|d| format!("{} == {}", d.field, d.value))
            .unwrap_or_else(|| "-".to_string());
        let validators = if field.validators.is_empty() {
            "-".to_string()
        } else {
            field
                .validators
                .iter()
                .map(|v| v.rule_name())
                .collect::<Vec<_>>()
                .join(", ")
        };

        println!(
            "{:<20} {:<10} {:<8} {:<9} {:<24} {}",
            style(truncate_str(&field.name, 20)).cyan(),
            field.input_kind,
            field.output_type,
            if field.required { "yes" } else { "no" },
            truncate_str(&depends, 24),
            truncate_str(&validators, 40)
        );
    }

    if let Some(dashboard) = &form.dashboard {
        println!();
        println!(
            "{} {} chart: {}",
            style("Dashboard:").bold(),
            dashboard.chart,
            dashboard
                .roles
                .iter()
                .map(|(role, target)| format!("{}={}", role, target))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if !global.quiet {
        println!();
        println!("{} field(s).", style(form.fields.len()).cyan());
    }

    Ok(())
}
