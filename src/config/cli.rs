use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::dataset::DatasetKind;

/// Command-line arguments for the dataset-cache binary.
#[derive(Debug, Parser)]
#[command(
    name = "dataset-cache",
    version,
    about = "Dataset-scoped cache namespaces and invalidation"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "DATASET_CACHE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the resolved settings.
    #[command(name = "show-config")]
    ShowConfig,
    /// Print the namespace a cached operation resolves to.
    #[command(name = "namespace")]
    Namespace(NamespaceArgs),
}

#[derive(Debug, Args, Clone)]
pub struct NamespaceArgs {
    /// Dataset kind (study|adhoc).
    #[arg(long, value_name = "KIND")]
    pub kind: DatasetKind,

    /// Owning service name, e.g. `LabService`.
    #[arg(long, value_name = "NAME")]
    pub owner: String,

    /// Operation name, e.g. `summary`.
    #[arg(long, value_name = "NAME")]
    pub operation: String,
}
