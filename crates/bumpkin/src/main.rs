//! bumpkin binary entry point.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use bumpkin::cli::{self, CliError, Commands, EXIT_OK, exit_code_for, render_error};
use bumpkin::commands::{self, Context};
use bumpkin::logging;

fn main() {
    let cli = cli::parse();

    // A subscriber may already be installed when embedded; keep going without one.
    let _ = logging::init(cli.level);

    let exit_code = match run(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            EXIT_OK
        }
        Err(err) => {
            render_error(&err);
            exit_code_for(&err)
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &cli::Cli) -> Result<String, CliError> {
    let ctx = Context::load(&cli.root, cli.config.as_deref())?;

    match &cli.command {
        Commands::Info { version, json } => commands::execute_info(&ctx, version.as_deref(), *json),
        Commands::Plan { json } => commands::execute_plan(&ctx, *json),
        Commands::Header { version } => commands::execute_header(&ctx, version.as_deref()),
        Commands::Changelog {
            version,
            input,
            date,
        } => commands::execute_changelog(&ctx, version.as_deref(), input.as_deref(), *date),
        Commands::Link => commands::execute_link(&ctx),
        Commands::Bump {
            dry_run,
            input,
            date,
        } => commands::execute_bump(&ctx, *dry_run, input.as_deref(), *date),
    }
}
