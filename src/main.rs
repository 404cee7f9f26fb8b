use clap::Parser;
use intake::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Lint(args) => intake::cli::commands::lint::run(args, &global),
        Commands::List(args) => intake::cli::commands::list::run(args, &global),
        Commands::Show(args) => intake::cli::commands::show::run(args, &global),
        Commands::Check(args) => intake::cli::commands::check::run(args, &global),
        Commands::Template(args) => intake::cli::commands::template::run(args, &global),
        Commands::Completions(args) => intake::cli::commands::completions::run(args),
    }
}
