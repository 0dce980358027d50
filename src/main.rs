use std::{process, sync::Arc};

use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

use rubrica::{
    api::ApiClient,
    cache::ResourceCache,
    config,
    console::{self, AppContext, ConsoleError},
    infra::{error::InfraError, telemetry},
};

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("invalid API client configuration: {0}")]
    Client(#[from] rubrica::api::ApiError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let client = ApiClient::new(
        &settings.api.base_url,
        settings.api.api_key.clone(),
        settings.api.timeout_secs,
    )?;
    let cache = Arc::new(ResourceCache::new(settings.cache.clone()));
    let ctx = AppContext::new(cache, client.into_gateway(), &settings.query);

    console::dispatch(&ctx, cli_args.command).await?;
    Ok(())
}
