use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::matching::{SampleConfig, ScoringConfig};

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub matching: MatchingConfig,
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
            telemetry: TelemetryConfig { log_level },
            matching: MatchingConfig::from_env()?,
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
}

/// Tunables for scoring, sample fallback, and reputation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    pub scoring: ScoringConfig,
    pub samples: SampleConfig,
    pub honor_multiplier: u8,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            samples: SampleConfig::default(),
            honor_multiplier: 20,
        }
    }
}

impl MatchingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let score_min = parse_u8("MATCH_SAMPLE_SCORE_MIN", defaults.samples.score_min)?;
        let score_max = parse_u8("MATCH_SAMPLE_SCORE_MAX", defaults.samples.score_max)?;
        if score_min > score_max {
            return Err(ConfigError::InvalidSampleBand {
                min: score_min,
                max: score_max,
            });
        }

        let honor_multiplier = parse_u8("MATCH_HONOR_MULTIPLIER", defaults.honor_multiplier)?;

        Ok(Self {
            scoring: defaults.scoring,
            samples: SampleConfig {
                score_min,
                score_max,
            },
            honor_multiplier,
        })
    }
}

fn parse_u8(key: &'static str, default: u8) -> Result<u8, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u8>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidSampleBand { min: u8, max: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be an integer between 0 and 255")
            }
            ConfigError::InvalidSampleBand { min, max } => write!(
                f,
                "MATCH_SAMPLE_SCORE_MIN ({min}) must not exceed MATCH_SAMPLE_SCORE_MAX ({max})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidSampleBand { .. } => None,
        }
    }
}
