//! Fubber CLI entry point: a thin dispatcher over the core verbs.

use std::process::ExitCode;

use clap::Parser;

mod args;
mod commands;
mod exit_status;

use args::Arguments;
use exit_status::ExitStatus;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match Arguments::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Help and version requests are not failures.
            if err.use_stderr() {
                eprintln!("{err}");
                return ExitStatus::InvalidArguments.into();
            }
            let _ = err.print();
            return ExitStatus::Success.into();
        }
    };

    commands::run(args).into()
}
