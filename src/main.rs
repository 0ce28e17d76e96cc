//! Storefront CLI

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use storefront::observability;

mod cli;

#[tokio::main]
pub async fn main() -> ExitCode {
    _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = observability::init_tracing(cli.logging()) {
        _ = writeln!(io::stderr(), "failed to initialise logging: {error}");
        return ExitCode::FAILURE;
    }

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            _ = writeln!(io::stderr(), "{error}");
            ExitCode::FAILURE
        }
    }
}
