//! `intake lint` command - validate form schema files

use console::style;
use miette::Result;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::cli::helpers::forms_dir;
use crate::cli::GlobalOpts;
use crate::schema::load::load_file;

#[derive(clap::Args, Debug)]
pub struct LintArgs {
    /// Paths to lint (default: the forms directory)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Continue after the first failing file
    #[arg(long)]
    pub keep_going: bool,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,
}

/// Lint statistics
#[derive(Default)]
struct LintStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
    forms_found: usize,
}

pub fn run(args: LintArgs, global: &GlobalOpts) -> Result<()> {
    let files = if args.paths.is_empty() {
        collect_form_files(&[forms_dir(global)])
    } else {
        collect_form_files(&args.paths)
    };

    if files.is_empty() {
        return Err(miette::miette!(
            "no *.form.yaml files found (looked in {})",
            if args.paths.is_empty() {
                forms_dir(global).display().to_string()
            } else {
                args.paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        ));
    }

    if !global.quiet {
        println!(
            "{} Linting {} file(s)...\n",
            style("→").blue(),
            files.len()
        );
    }

    let mut stats = LintStats::default();
    let mut had_error = false;

    for path in &files {
        stats.files_checked += 1;

        match load_file(path) {
            Ok(forms) => {
                stats.files_passed += 1;
                stats.forms_found += forms.len();
                if !args.summary && !global.quiet {
                    println!(
                        "{} {} ({} form(s))",
                        style("✓").green(),
                        path.display(),
                        forms.len()
                    );
                }
            }
            Err(e) => {
                stats.files_failed += 1;
                stats.total_errors += e.violation_count();
                had_error = true;

                if !args.summary {
                    println!(
                        "{} {} - {} error(s)",
                        style("✗").red(),
                        path.display(),
                        e.violation_count()
                    );
                    let report = miette::Report::new(e);
                    println!("{:?}", report);
                }

                if !args.keep_going {
                    break;
                }
            }
        }
    }

    if !global.quiet {
        println!();
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", style("Lint Summary").bold());
        println!("{}", style("─".repeat(60)).dim());
        println!("  Files checked:  {}", style(stats.files_checked).cyan());
        println!("  Files passed:   {}", style(stats.files_passed).green());
        println!("  Files failed:   {}", style(stats.files_failed).red());
        println!("  Forms found:    {}", style(stats.forms_found).cyan());
        println!("  Total errors:   {}", style(stats.total_errors).red());
        println!();
    }

    if had_error {
        if stats.files_failed == 1 {
            Err(miette::miette!("lint failed: 1 file has errors"))
        } else {
            Err(miette::miette!(
                "lint failed: {} files have errors",
                stats.files_failed
            ))
        }
    } else {
        if !global.quiet {
            println!("{} All files passed!", style("✓").green().bold());
        }
        Ok(())
    }
}

/// Expand paths - directories are walked for *.form.yaml files
fn collect_form_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if entry.path().to_string_lossy().ends_with(".form.yaml") {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.exists() {
            files.push(path.clone());
        }
    }

    files.sort();
    files
}
