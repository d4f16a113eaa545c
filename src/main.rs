use std::{process, sync::Arc};

use bloglane::{
    application::{
        error::AppError, export, fast_category::FastCategoryLoader, repos::ContentSource,
        syndication::SyndicationService,
    },
    cache::{FastCache, FastCacheConfig},
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        local::LocalContentSource,
        strapi::StrapiClient,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Export(args) => run_export(settings, args).await,
    }
}

/// Strapi when a base URL is configured, the local archive otherwise.
fn build_content_source(settings: &config::Settings) -> Result<Arc<dyn ContentSource>, AppError> {
    match settings.content.strapi_url.as_ref() {
        Some(url) => {
            info!(target = "bloglane::content", strapi_url = %url, "using Strapi content source");
            Ok(Arc::new(StrapiClient::new(&settings.content)?))
        }
        None => {
            let archive = settings.content.local_archive.clone();
            info!(
                target = "bloglane::content",
                archive = ?archive,
                "no Strapi URL configured, using local content"
            );
            Ok(Arc::new(LocalContentSource::new(archive)))
        }
    }
}

fn build_http_state(
    settings: &config::Settings,
    source: Arc<dyn ContentSource>,
) -> HttpState {
    let cache_config = FastCacheConfig::from_settings(settings.site.mode, &settings.cache);
    let fast_cache = Arc::new(FastCache::new(&cache_config));
    info!(
        target = "bloglane::cache",
        ttl_ms = cache_config.ttl.as_millis() as u64,
        capacity = fast_cache.capacity(),
        "fast category cache ready"
    );
    let fast = FastCategoryLoader::new(fast_cache, source.clone(), settings.site.mode);
    let syndication = SyndicationService::new(source.clone(), settings.site.clone());

    HttpState {
        source,
        fast: Arc::new(fast),
        syndication: Arc::new(syndication),
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let source = build_content_source(&settings)?;
    let state = build_http_state(&settings, source);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "bloglane::serve",
        addr = %settings.server.addr,
        mode = ?settings.site.mode,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_export(settings: config::Settings, args: config::ExportArgs) -> Result<(), AppError> {
    let source = build_content_source(&settings)?;
    let syndication = SyndicationService::new(source.clone(), settings.site.clone());

    info!(
        target = "bloglane::export",
        path = %args.out_dir.display(),
        "Starting export"
    );

    let summary = export::export_site(source, &syndication, &args.out_dir).await?;
    info!(
        target = "bloglane::export",
        categories = summary.categories,
        posts = summary.posts,
        "Export completed"
    );
    Ok(())
}
