//! `intake template` command - generate a CSV entry template

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::load_registry;
use crate::cli::GlobalOpts;
use crate::schema::model::InputKind;

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Form name
    pub form: String,

    /// Write the template to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: TemplateArgs, global: &GlobalOpts) -> Result<()> {
    let registry = load_registry(global).into_diagnostic()?;
    let form = registry.get(&args.form).into_diagnostic()?;

    if !form.flags.allow_csv_templates {
        return Err(miette::miette!(
            "form '{}' does not allow CSV templates",
            form.name
        ));
    }

    // File fields cannot be populated through a CSV round-trip
    let fields: Vec<_> = form
        .fields
        .iter()
        .filter(|f| f.input_kind != InputKind::File)
        .collect();

    let mut writer: csv::Writer<Box<dyn std::io::Write>> = match &args.output {
        Some(path) => csv::Writer::from_writer(Box::new(
            std::fs::File::create(path).into_diagnostic()?,
        )),
        None => csv::Writer::from_writer(Box::new(std::io::stdout())),
    };

    writer
        .write_record(fields.iter().map(|f| f.name.as_str()))
        .into_diagnostic()?;

    if !form.flags.suppress_default_values {
        writer
            .write_record(fields.iter().map(|f| f.default_value().unwrap_or("")))
            .into_diagnostic()?;
    }

    writer.flush().into_diagnostic()?;

    if let Some(path) = &args.output {
        if !global.quiet {
            println!(
                "{} Wrote template for '{}' to {}",
                style("✓").green(),
                form.name,
                path.display()
            );
        }
    }

    Ok(())
}
