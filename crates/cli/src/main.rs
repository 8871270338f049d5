//! `azsecrets` kustomize exec generator

mod cli;
mod tracing;

use crate::cli::parse;
use crate::tracing::{TracingConfig, init_tracing};
use azsecrets_generator::{Backend, Error, Generator, ResolutionMode, render_documents};
use std::io::Write;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = parse();

    let raw = tokio::fs::read_to_string(&cli.config)
        .await
        .map_err(|e| Error::io(e, &cli.config, "read"))?;
    let mode = if cli.sequential {
        ResolutionMode::Sequential
    } else {
        ResolutionMode::Concurrent
    };
    let generator = Generator::configure(&raw, Backend::from_env())?.with_mode(mode);

    init_tracing(
        TracingConfig {
            format: cli.log_format,
            level: cli.log_level.into(),
        }
        .verbose(cli.verbose || generator.config().verbose),
    )?;

    let documents = generator.generate().await?;
    let manifests = render_documents(&documents)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(manifests.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| Error::io_no_path(e, "write"))?;
    Ok(())
}
