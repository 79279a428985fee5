//! `mergebot`: ingest payloads, transform them into records and publish the
//! artifacts that changed.

mod args;
mod commands;
mod context;
mod error;
mod logging;

use crate::args::Cli;
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use mergebot_config::AppConfig;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, retryable = e.is_retryable(), "Command failed");
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let ctx = Context::open(config).await?;
    let result = commands::execute(&ctx, cli.command).await;
    ctx.close().await;
    result
}
