// ABOUTME: Entry point for the hatch CLI application.
// ABOUTME: Parses arguments, sets up logging and maps results to exit codes.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::{RuntimeOverrides, exec_command};
use hatch::config::Config;
use hatch::error::{Error, Result};
use hatch::output::Output;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs share stderr with hatch's own messages; stdout is the remote's.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output.into());

    match run(cli, &output).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output.error(&e.to_string());
            if let Error::Runtime(runtime) = &e {
                output.info(&runtime.hint());
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, output: &Output) -> Result<i32> {
    let cwd = env::current_dir()?;
    let config = Config::discover(&cwd)?.with_env_overrides()?;
    let overrides = RuntimeOverrides {
        socket: cli.socket,
        runtime: cli.runtime,
    };

    match cli.command {
        Commands::Exec(args) => exec_command(config, overrides, args, output).await,
    }
}
