use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use feeds::{Endpoints, DEFAULT_AGROMET_BASE_URL, DEFAULT_DMC_BASE_URL, DEFAULT_FIRMS_BASE_URL};
use log::LevelFilter;
use meteorg_core::{
    find_config_file, load_config, ConfigSource, APP_NAME, DEFAULT_ALLOWED_ORIGIN,
    DEFAULT_CACHE_TTL, DEFAULT_FIRMS_AREA, DEFAULT_PORT, DEFAULT_UPSTREAM_TIMEOUT,
};
use std::{env, time::Duration};
use time::{format_description::well_known::Iso8601, OffsetDateTime};

use crate::secrets::SecretsBackend;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "MeteoRG - cached GeoJSON feeds of Chilean weather stations and active fires"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $METEORG_CONFIG, ./meteorg.toml,
    /// $XDG_CONFIG_HOME/meteorg/meteorg.toml, /etc/meteorg/meteorg.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "METEORG_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(short, long, env = "METEORG_HOST")]
    #[serde(alias = "host")]
    pub domain: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "METEORG_PORT")]
    pub port: Option<String>,

    /// Browser origin allowed to call the API, or `*` for any
    #[arg(long, env = "METEORG_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// FIRMS bounding box as west,south,east,north
    #[arg(long, env = "METEORG_FIRMS_AREA")]
    pub firms_area: Option<String>,

    /// Seconds a feed is served from memory before it is fetched again
    #[arg(long, env = "METEORG_CACHE_TTL")]
    pub cache_ttl: Option<u64>,

    /// Timeout in seconds for every upstream request
    #[arg(long, env = "METEORG_UPSTREAM_TIMEOUT")]
    pub upstream_timeout: Option<u64>,

    /// User-Agent sent to the upstream services
    #[arg(long, env = "METEORG_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Where credentials come from: gcp (Secret Manager) or env
    #[arg(long, env = "METEORG_SECRETS_BACKEND")]
    pub secrets_backend: Option<String>,

    /// Google Cloud project holding the secrets
    #[arg(long, env = "GCP_PROJECT")]
    pub gcp_project: Option<String>,

    /// Base URL of the DMC climatology service
    #[arg(long, env = "METEORG_DMC_URL")]
    pub dmc_url: Option<String>,

    /// Base URL of the Agromet network site
    #[arg(long, env = "METEORG_AGROMET_URL")]
    pub agromet_url: Option<String>,

    /// Base URL of the NASA FIRMS API
    #[arg(long, env = "METEORG_FIRMS_URL")]
    pub firms_url: Option<String>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn host(&self) -> String {
        self.domain
            .clone()
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> String {
        self.port
            .clone()
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
    }

    pub fn allowed_origin(&self) -> String {
        self.allowed_origin
            .clone()
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string())
    }

    pub fn firms_area(&self) -> String {
        self.firms_area
            .clone()
            .unwrap_or_else(|| DEFAULT_FIRMS_AREA.to_string())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout.unwrap_or(DEFAULT_UPSTREAM_TIMEOUT))
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
    }

    pub fn secrets_backend(&self) -> Result<SecretsBackend, anyhow::Error> {
        match &self.secrets_backend {
            Some(name) => name.parse().map_err(anyhow::Error::msg),
            None => Ok(SecretsBackend::default()),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            dmc: self
                .dmc_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DMC_BASE_URL.to_string()),
            agromet: self
                .agromet_url
                .clone()
                .unwrap_or_else(|| DEFAULT_AGROMET_BASE_URL.to_string()),
            firms: self
                .firms_url
                .clone()
                .unwrap_or_else(|| DEFAULT_FIRMS_BASE_URL.to_string()),
        }
    }

    /// Fills every unset field from `file`.
    pub fn merge(self, file: Cli) -> Cli {
        Cli {
            config: self.config,
            level: self.level.or(file.level),
            domain: self.domain.or(file.domain),
            port: self.port.or(file.port),
            allowed_origin: self.allowed_origin.or(file.allowed_origin),
            firms_area: self.firms_area.or(file.firms_area),
            cache_ttl: self.cache_ttl.or(file.cache_ttl),
            upstream_timeout: self.upstream_timeout.or(file.upstream_timeout),
            user_agent: self.user_agent.or(file.user_agent),
            secrets_backend: self.secrets_backend.or(file.secrets_backend),
            gcp_project: self.gcp_project.or(file.gcp_project),
            dmc_url: self.dmc_url.or(file.dmc_url),
            agromet_url: self.agromet_url.or(file.agromet_url),
            firms_url: self.firms_url.or(file.firms_url),
        }
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Result<(Cli, ConfigSource), anyhow::Error> {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("METEORG_CONFIG", "meteorg.toml")
    };

    let file_config: Cli = load_config(&source)?;

    // CLI args override file config (env vars are handled by clap)
    Ok((cli_args.merge(file_config), source))
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}: {}",
                OffsetDateTime::now_utc()
                    .format(&Iso8601::DEFAULT)
                    .unwrap_or_default(),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
