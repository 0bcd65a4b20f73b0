use std::process;

use dataset_cache::{
    application::error::AppError,
    cache::{CacheConfig, resolve_namespace},
    config::{self, Command, NamespaceArgs},
    domain::dataset::DatasetIdentity,
    infra::telemetry,
};
use tracing::{Dispatch, Level, debug, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(source = report.source, chain = ?report.messages, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(source = report.source, chain = ?report.messages, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    debug!(format = ?settings.logging.format, "Telemetry initialised");

    match cli_args.command.unwrap_or(Command::ShowConfig) {
        Command::ShowConfig => show_config(&settings),
        Command::Namespace(args) => print_namespace(&settings, args),
    }
}

fn show_config(settings: &config::Settings) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(settings)
        .map_err(|err| AppError::unexpected(format!("failed to render settings: {err}")))?;
    println!("{rendered}");
    Ok(())
}

fn print_namespace(settings: &config::Settings, args: NamespaceArgs) -> Result<(), AppError> {
    let cache_config = CacheConfig::try_from(&settings.cache)?;
    let identity = DatasetIdentity::sentinel(args.kind);
    println!(
        "{}",
        resolve_namespace(&cache_config, &identity, &args.owner, &args.operation)
    );
    Ok(())
}
