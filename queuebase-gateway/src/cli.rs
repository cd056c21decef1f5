use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "queuebase-gateway", version, about)]
pub struct CliArgs {
    /// Path to configuration file (overrides QUEUEBASE_CONFIG_PATH env var).
    #[arg(short = 'c', long = "config-path", env = "QUEUEBASE_CONFIG_PATH")]
    pub config_path: Option<String>,

    /// Load and validate the configuration, then exit without serving.
    #[arg(long)]
    pub check_config: bool,
}
