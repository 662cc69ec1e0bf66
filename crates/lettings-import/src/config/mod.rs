use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::property_list::AmountOrder;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

pub const DEFAULT_PAGE_MARKER: &str = r"=== Page (\d+) ===";
pub const DEFAULT_MIN_PAGE_CHARS: usize = 10;
pub const DEFAULT_PREVIEW_COUNT: usize = 3;
pub const DEFAULT_DATABASE_PATH: &str = "lettings.sqlite";

/// Top-level configuration for the importer and its HTTP surface.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub import: ImportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            import: ImportConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Knobs for the property list import pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub database_path: PathBuf,
    /// Regex matching the page boundary; the first capture group, when present, is the page number.
    pub page_marker: String,
    pub min_page_chars: usize,
    pub preview_count: usize,
    pub amount_order: AmountOrder,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            page_marker: DEFAULT_PAGE_MARKER.to_string(),
            min_page_chars: DEFAULT_MIN_PAGE_CHARS,
            preview_count: DEFAULT_PREVIEW_COUNT,
            amount_order: AmountOrder::default(),
        }
    }
}

impl ImportConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_path = env::var("IMPORT_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);
        let page_marker = env::var("IMPORT_PAGE_MARKER").unwrap_or(defaults.page_marker);
        let min_page_chars = parse_count("IMPORT_MIN_PAGE_CHARS", defaults.min_page_chars)?;
        let preview_count = parse_count("IMPORT_PREVIEW_COUNT", defaults.preview_count)?;
        let amount_order = match env::var("IMPORT_AMOUNT_ORDER") {
            Ok(raw) => raw
                .parse::<AmountOrder>()
                .map_err(|_| ConfigError::InvalidAmountOrder { value: raw })?,
            Err(_) => defaults.amount_order,
        };

        Ok(Self {
            database_path,
            page_marker,
            min_page_chars,
            preview_count,
            amount_order,
        })
    }
}

fn parse_count(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidCount { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCount { key: &'static str, value: String },
    InvalidAmountOrder { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCount { key, value } => {
                write!(f, "{key} must be a non-negative integer (got '{value}')")
            }
            ConfigError::InvalidAmountOrder { value } => write!(
                f,
                "IMPORT_AMOUNT_ORDER must be 'deposit-first' or 'rent-first' (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCount { .. }
            | ConfigError::InvalidAmountOrder { .. } => None,
        }
    }
}
