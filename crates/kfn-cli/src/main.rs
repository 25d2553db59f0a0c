//! kfn CLI binary entrypoint.

use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kfn_cli::cli::{Cli, Commands};
use kfn_cli::commands::{DescriptorCommand, EnrichCommand};
use kfn_cli::{CliError, load_config};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Enrich(args) => {
            let cmd = EnrichCommand::new(&config, &config.priority_classes);
            let mode = args.mode.as_deref();
            if args.reads_stdin() {
                cmd.execute(io::stdin().lock(), &mut stdout, mode)?;
            } else {
                let input = BufReader::new(File::open(&args.input)?);
                cmd.execute(input, &mut stdout, mode)?;
            }
        }
        Commands::Descriptor => {
            DescriptorCommand::new(&config).execute(&mut stdout)?;
        }
    }

    Ok(())
}
