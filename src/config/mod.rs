//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::prefixes_overlap;

mod cli;

pub use cli::{CliArgs, Command, NamespaceArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "dataset-cache";
const ENV_PREFIX: &str = "DATASET_CACHE";
pub(crate) const DEFAULT_STUDY_PREFIX: &str = "study-";
pub(crate) const DEFAULT_ADHOC_PREFIX: &str = "adhoc-";
pub(crate) const DEFAULT_PRIMED_OWNER: &str = "DatasetMetadataService";
pub(crate) const DEFAULT_PRIMED_OPERATION: &str = "compute_metadata";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggingSettings {
    #[serde(serialize_with = "serialize_level")]
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSettings {
    pub study_prefix: String,
    pub adhoc_prefix: String,
    pub primed_owner: String,
    pub primed_operation: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_logging_overrides(cli);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, cli: &CliArgs) {
        if let Some(level) = cli.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = cli.log_json {
            self.logging.json = Some(json);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    study_prefix: Option<String>,
    adhoc_prefix: Option<String>,
    primed_owner: Option<String>,
    primed_operation: Option<String>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, cache } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self { logging, cache })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let study_prefix = non_empty(
        cache.study_prefix,
        DEFAULT_STUDY_PREFIX,
        "cache.study_prefix",
    )?;
    let adhoc_prefix = non_empty(
        cache.adhoc_prefix,
        DEFAULT_ADHOC_PREFIX,
        "cache.adhoc_prefix",
    )?;

    if prefixes_overlap(&study_prefix, &adhoc_prefix) {
        return Err(LoadError::invalid(
            "cache.adhoc_prefix",
            format!(
                "prefixes `{study_prefix}` and `{adhoc_prefix}` overlap; neither may start with the other"
            ),
        ));
    }

    let primed_owner = non_empty(
        cache.primed_owner,
        DEFAULT_PRIMED_OWNER,
        "cache.primed_owner",
    )?;
    let primed_operation = non_empty(
        cache.primed_operation,
        DEFAULT_PRIMED_OPERATION,
        "cache.primed_operation",
    )?;

    Ok(CacheSettings {
        study_prefix,
        adhoc_prefix,
        primed_owner,
        primed_operation,
    })
}

fn non_empty(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(LoadError::invalid(key, "must not be empty")),
        Some(value) => Ok(value),
        None => Ok(default.to_string()),
    }
}

fn serialize_level<S: serde::Serializer>(
    level: &LevelFilter,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(level)
}
