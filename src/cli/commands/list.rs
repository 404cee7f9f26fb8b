//! `intake list` command - list registered forms

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, load_registry, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ListArgs {}

pub fn run(_args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let registry = load_registry(global).into_diagnostic()?;

    let names = registry.names();
    if names.is_empty() {
        if !global.quiet {
            println!("No forms found. Put *.form.yaml files in the forms directory.");
        }
        return Ok(());
    }

    match global.format {
        OutputFormat::Csv => {
            println!("name,fields,repeat,anonymous,uploads,csv_templates,description");
            for name in &names {
                let form = registry.get(name).into_diagnostic()?;
                println!(
                    "{},{},{},{},{},{},{}",
                    escape_csv(name),
                    form.fields.len(),
                    form.flags.allow_repeat,
                    form.flags.allow_anonymous_access,
                    form.flags.allow_uploads,
                    form.flags.allow_csv_templates,
                    escape_csv(&form.description)
                );
            }
        }
        OutputFormat::Json => {
            let mut entries = Vec::new();
            for name in &names {
                let form = registry.get(name).into_diagnostic()?;
                entries.push(serde_json::json!({
                    "name": name,
                    "fields": form.fields.len(),
                    "allow_repeat": form.flags.allow_repeat,
                    "allow_anonymous_access": form.flags.allow_anonymous_access,
                    "allow_uploads": form.flags.allow_uploads,
                    "allow_csv_templates": form.flags.allow_csv_templates,
                    "description": form.description,
                }));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).into_diagnostic()?
            );
        }
        OutputFormat::Md => {
            println!("| Name | Fields | Repeat | Anonymous | Uploads | Description |");
            println!("|---|---|---|---|---|---|");
            for name in &names {
                let form = registry.get(name).into_diagnostic()?;
                println!(
                    "| {} | {} | {} | {} | {} | {} |",
                    name,
                    form.fields.len(),
                    yes_no(form.flags.allow_repeat),
                    yes_no(form.flags.allow_anonymous_access),
                    yes_no(form.flags.allow_uploads),
                    form.description.replace('|', "\\|")
                );
            }
        }
        _ => {
            println!(
                "{:<24} {:>6} {:<7} {:<5} {:<8} {}",
                style("NAME").bold(),
                style("FIELDS").bold(),
                style("REPEAT").bold(),
                style("ANON").bold(),
                style("UPLOADS").bold(),
                style("DESCRIPTION").bold()
            );
            println!("{}", "-".repeat(80));
            for name in &names {
                let form = registry.get(name).into_diagnostic()?;
                println!(
                    "{:<24} {:>6} {:<7} {:<5} {:<8} {}",
                    style(truncate_str(name, 24)).cyan(),
                    form.fields.len(),
                    yes_no(form.flags.allow_repeat),
                    yes_no(form.flags.allow_anonymous_access),
                    yes_no(form.flags.allow_uploads),
                    truncate_str(&form.description, 40)
                );
            }
            if !global.quiet {
                println!();
                println!("{} form(s) found.", style(names.len()).cyan());
            }
        }
    }

    Ok(())
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}
