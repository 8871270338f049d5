use crate::tracing::{LogLevel, TracingFormat};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "azsecrets")]
#[command(about = "Generate Kubernetes Secrets and ConfigMaps from Azure Key Vault")]
#[command(
    long_about = "Kustomize exec generator. Reads an AzureSecrets generator resource, \
                  fetches every referenced Key Vault secret and writes the resulting \
                  manifests to stdout."
)]
#[command(version)]
pub struct Cli {
    /// Path to the AzureSecrets generator configuration
    pub config: PathBuf,

    /// Fetch secrets one at a time instead of concurrently
    #[arg(long)]
    pub sequential: bool,

    /// Log progress at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(
        short = 'l',
        long,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub log_level: LogLevel,

    #[arg(long, help = "Log output format", default_value = "compact", value_enum)]
    pub log_format: TracingFormat,
}

pub fn parse() -> Cli {
    Cli::parse()
}
