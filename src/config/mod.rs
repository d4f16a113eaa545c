//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_DEVELOPMENT_TTL, DEFAULT_PRODUCTION_TTL};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "bloglane";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4321;
const DEFAULT_SITE_URL: &str = "http://localhost:4321/";
const DEFAULT_SITE_TITLE: &str = "Bloglane";
const DEFAULT_SITE_DESCRIPTION: &str = "Notes and articles";
const DEFAULT_SITE_AUTHOR: &str = "Bloglane";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONTENT_PAGE_SIZE: u32 = 100;

/// Command-line arguments for the bloglane binary.
#[derive(Debug, Parser)]
#[command(name = "bloglane", version, about = "Blog data and feed server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BLOGLANE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve page data, the RSS feed and the browser error filter over HTTP.
    Serve(ServeArgs),
    /// Write page data and the RSS feed into a directory.
    #[command(name = "export")]
    Export(ExportArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Directory the export is written into; created when missing.
    #[arg(value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the site mode (development|production).
    #[arg(long = "mode", value_name = "MODE", global = true)]
    pub mode: Option<SiteMode>,

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

    /// Override the Strapi base URL.
    #[arg(long = "strapi-url", value_name = "URL", global = true)]
    pub strapi_url: Option<String>,

    /// Override the local content archive used when no Strapi URL is set.
    #[arg(long = "local-archive", value_name = "PATH", global = true)]
    pub local_archive: Option<PathBuf>,
}

/// Deployment mode. Controls cache lifetimes and diagnostic verbosity only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    Development,
    #[default]
    Production,
}

impl SiteMode {
    pub fn is_development(&self) -> bool {
        matches!(self, SiteMode::Development)
    }
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub content: ContentSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Static site identity, used whenever the CMS cannot supply it.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub mode: SiteMode,
    pub url: Url,
    pub title: String,
    pub description: String,
    pub author: String,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub strapi_url: Option<Url>,
    pub strapi_token: Option<String>,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub local_archive: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub development_ttl: Duration,
    pub production_ttl: Duration,
    /// Maximum number of fast-path entries.
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            development_ttl: DEFAULT_DEVELOPMENT_TTL,
            production_ttl: DEFAULT_PRODUCTION_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
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

    builder = builder.add_source(Environment::with_prefix("BLOGLANE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_global_overrides(&cli.overrides);
    if let Some(Command::Serve(args)) = cli.command.as_ref() {
        raw.apply_serve_overrides(args);
    }

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
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    content: RawContentSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_global_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(mode) = overrides.mode {
            self.site.mode = Some(mode);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.strapi_url.as_ref() {
            self.content.strapi_url = Some(url.clone());
        }
        if let Some(path) = overrides.local_archive.as_ref() {
            self.content.local_archive = Some(path.clone());
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeArgs) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            content,
            cache,
        } = raw;

        let site = build_site_settings(site)?;
        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging, site.mode)?;
        let content = build_content_settings(content)?;
        let cache = build_cache_settings(cache);

        Ok(Self {
            server,
            logging,
            site,
            content,
            cache,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let candidate = format!("{host}:{port}");
    let addr = candidate.parse().map_err(|err| {
        LoadError::invalid("server.addr", format!("invalid address `{candidate}`: {err}"))
    })?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(
    logging: RawLoggingSettings,
    mode: SiteMode,
) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None if mode.is_development() => LevelFilter::DEBUG,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let raw_url = site.url.unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    let url = parse_base_url(&raw_url).map_err(|reason| LoadError::invalid("site.url", reason))?;

    Ok(SiteSettings {
        mode: site.mode.unwrap_or_default(),
        url,
        title: non_blank(site.title).unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        description: non_blank(site.description)
            .unwrap_or_else(|| DEFAULT_SITE_DESCRIPTION.to_string()),
        author: non_blank(site.author).unwrap_or_else(|| DEFAULT_SITE_AUTHOR.to_string()),
    })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let strapi_url = non_blank(content.strapi_url)
        .map(|value| parse_base_url(&value))
        .transpose()
        .map_err(|reason| LoadError::invalid("content.strapi_url", reason))?;

    let timeout_secs = content
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "content.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let page_size = content.page_size.unwrap_or(DEFAULT_CONTENT_PAGE_SIZE);
    if page_size == 0 {
        return Err(LoadError::invalid(
            "content.page_size",
            "must be greater than zero",
        ));
    }

    Ok(ContentSettings {
        strapi_url,
        strapi_token: non_blank(content.strapi_token),
        request_timeout: Duration::from_secs(timeout_secs),
        page_size,
        local_archive: content
            .local_archive
            .filter(|path| !path.as_os_str().is_empty()),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> CacheSettings {
    let defaults = CacheSettings::default();
    CacheSettings {
        development_ttl: cache
            .development_ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.development_ttl),
        production_ttl: cache
            .production_ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.production_ttl),
        capacity: cache.capacity.unwrap_or(defaults.capacity),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    mode: Option<SiteMode>,
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    strapi_url: Option<String>,
    strapi_token: Option<String>,
    request_timeout_seconds: Option<u64>,
    page_size: Option<u32>,
    local_archive: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    development_ttl_seconds: Option<u64>,
    production_ttl_seconds: Option<u64>,
    capacity: Option<usize>,
}

/// Parse an absolute base URL, normalizing it to end with `/` so joins keep the path.
fn parse_base_url(value: &str) -> Result<Url, String> {
    let trimmed = value.trim().trim_end_matches('/');
    Url::parse(&format!("{trimmed}/")).map_err(|err| format!("invalid url `{value}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_production() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.site.mode, SiteMode::Production);
        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert_eq!(settings.cache, CacheSettings::default());
        assert!(settings.content.strapi_url.is_none());
    }

    fn shipped_defaults() -> RawSettings {
        Config::builder()
            .add_source(File::from_str(
                include_str!("../../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .expect("default config parses")
            .try_deserialize()
            .expect("default config deserializes")
    }

    #[test]
    fn shipped_defaults_keep_mode_based_log_level() {
        let mut raw = shipped_defaults();
        raw.site.mode = Some(SiteMode::Development);
        let development = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(development.logging.level, LevelFilter::DEBUG);

        let production = Settings::from_raw(shipped_defaults()).expect("valid settings");
        assert_eq!(production.logging.level, LevelFilter::INFO);
        assert_eq!(production.cache, CacheSettings::default());
    }

    #[test]
    fn development_mode_defaults_to_debug_logging() {
        let mut raw = RawSettings::default();
        raw.site.mode = Some(SiteMode::Development);

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        raw.apply_global_overrides(&GlobalOverrides {
            log_level: Some("warn".to_string()),
            log_json: Some(true),
            ..Default::default()
        });
        raw.apply_serve_overrides(&ServeArgs {
            server_port: Some(8080),
            ..Default::default()
        });

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.server.addr.port(), 8080);
        assert_eq!(settings.logging.level, LevelFilter::WARN);
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn strapi_url_is_normalized_with_trailing_slash() {
        let mut raw = RawSettings::default();
        raw.content.strapi_url = Some("https://cms.example.com/base".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        let url = settings.content.strapi_url.expect("strapi url");
        assert_eq!(url.as_str(), "https://cms.example.com/base/");
    }

    #[test]
    fn blank_strapi_url_means_local_mode() {
        let mut raw = RawSettings::default();
        raw.content.strapi_url = Some("   ".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.content.strapi_url.is_none());
    }

    #[test]
    fn invalid_site_url_is_rejected() {
        let mut raw = RawSettings::default();
        raw.site.url = Some("not a url".to_string());

        let err = Settings::from_raw(raw).expect_err("site url should be rejected");
        assert!(matches!(err, LoadError::Invalid { key: "site.url", .. }));
    }

    #[test]
    fn cache_ttls_can_be_overridden() {
        let mut raw = RawSettings::default();
        raw.cache.development_ttl_seconds = Some(0);
        raw.cache.production_ttl_seconds = Some(120);
        raw.cache.capacity = Some(32);

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.cache.development_ttl, Duration::ZERO);
        assert_eq!(settings.cache.production_ttl, Duration::from_secs(120));
        assert_eq!(settings.cache.capacity, 32);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut raw = RawSettings::default();
        raw.content.request_timeout_seconds = Some(0);

        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["bloglane"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(ServeArgs::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_export_arguments() {
        let args = CliArgs::parse_from([
            "bloglane",
            "export",
            "--mode",
            "development",
            "/tmp/site-export",
        ]);

        assert_eq!(args.overrides.mode, Some(SiteMode::Development));
        match args.command.expect("export command") {
            Command::Export(export) => {
                assert_eq!(export.out_dir, std::path::Path::new("/tmp/site-export"));
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "bloglane",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--strapi-url",
            "https://cms.example.com",
        ]);

        assert_eq!(
            args.overrides.strapi_url.as_deref(),
            Some("https://cms.example.com")
        );
        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.server_host.as_deref(), Some("0.0.0.0"));
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
