use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::advisor::config::{AdvisorConfig, AdvisorConfigError};

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
    pub advisor: AdvisorSettings,
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
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw)?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            advisor: AdvisorSettings::load()?,
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
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" | "pretty" => Ok(Self::Full),
            _ => Err(ConfigError::InvalidLogFormat(value.to_string())),
        }
    }
}

/// Engine tuning plus the optional data files that replace the built-in question bank.
#[derive(Debug, Clone)]
pub struct AdvisorSettings {
    pub config: AdvisorConfig,
    pub question_bank_path: Option<PathBuf>,
    pub choice_stats_path: Option<PathBuf>,
}

impl AdvisorSettings {
    fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var("ADVISOR_CONFIG_PATH") {
            Ok(path) => read_advisor_config(PathBuf::from(path))?,
            Err(_) => AdvisorConfig::default(),
        };

        if let Some(value) = env_number("ADVISOR_MIN_QUESTIONS")? {
            config.stopping.min_questions = value;
        }
        if let Some(value) = env_number("ADVISOR_MAX_QUESTIONS")? {
            config.stopping.max_questions = value;
        }
        if let Some(value) = env_number("ADVISOR_ENTROPY_THRESHOLD")? {
            config.stopping.entropy_threshold = value;
        }
        if let Some(value) = env_number("ADVISOR_DIMINISHING_RETURNS_THRESHOLD")? {
            config.stopping.diminishing_returns_threshold = value;
        }
        if let Some(value) = env_number("ADVISOR_SESSION_TTL_MINUTES")? {
            config.session_ttl_minutes = value;
        }

        config.validate().map_err(ConfigError::Advisor)?;

        Ok(Self {
            config,
            question_bank_path: env::var("ADVISOR_QUESTION_BANK").ok().map(PathBuf::from),
            choice_stats_path: env::var("ADVISOR_CHOICE_STATS").ok().map(PathBuf::from),
        })
    }
}

fn read_advisor_config(path: PathBuf) -> Result<AdvisorConfig, ConfigError> {
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::AdvisorFile {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::AdvisorDocument { path, source })
}

fn env_number<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidLogFormat(String),
    InvalidNumber {
        var: &'static str,
        value: String,
    },
    AdvisorFile {
        path: PathBuf,
        source: std::io::Error,
    },
    AdvisorDocument {
        path: PathBuf,
        source: serde_json::Error,
    },
    Advisor(AdvisorConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'full' (found '{value}')")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be numeric (found '{value}')")
            }
            ConfigError::AdvisorFile { path, .. } => {
                write!(f, "unable to read advisor config {}", path.display())
            }
            ConfigError::AdvisorDocument { path, .. } => {
                write!(f, "advisor config {} is not valid JSON", path.display())
            }
            ConfigError::Advisor(err) => write!(f, "advisor config rejected: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat(_)
            | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::AdvisorFile { source, .. } => Some(source),
            ConfigError::AdvisorDocument { source, .. } => Some(source),
            ConfigError::Advisor(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "ADVISOR_CONFIG_PATH",
            "ADVISOR_QUESTION_BANK",
            "ADVISOR_CHOICE_STATS",
            "ADVISOR_MIN_QUESTIONS",
            "ADVISOR_MAX_QUESTIONS",
            "ADVISOR_ENTROPY_THRESHOLD",
            "ADVISOR_DIMINISHING_RETURNS_THRESHOLD",
            "ADVISOR_SESSION_TTL_MINUTES",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.advisor.config, AdvisorConfig::default());
        assert!(config.advisor.question_bank_path.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn advisor_overrides_apply_on_top_of_defaults() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADVISOR_MAX_QUESTIONS", "8");
        env::set_var("ADVISOR_ENTROPY_THRESHOLD", "1.5");
        env::set_var("ADVISOR_SESSION_TTL_MINUTES", "15");
        env::set_var("APP_LOG_FORMAT", "full");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.advisor.config.stopping.max_questions, 8);
        assert_eq!(config.advisor.config.stopping.entropy_threshold, 1.5);
        assert_eq!(config.advisor.config.session_ttl_minutes, 15);
        assert_eq!(config.telemetry.format, LogFormat::Full);
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_and_inconsistent_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADVISOR_MAX_QUESTIONS", "many");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                var: "ADVISOR_MAX_QUESTIONS",
                ..
            })
        ));

        env::set_var("ADVISOR_MAX_QUESTIONS", "2");
        env::set_var("ADVISOR_MIN_QUESTIONS", "5");
        assert!(matches!(AppConfig::load(), Err(ConfigError::Advisor(_))));
        reset_env();
    }

    #[test]
    fn reads_advisor_config_file() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let path = env::temp_dir().join(format!("advisor-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"stopping": {"max_questions": 12}, "session_ttl_minutes": 30}"#)
            .expect("write config");
        env::set_var("ADVISOR_CONFIG_PATH", &path);

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.advisor.config.stopping.max_questions, 12);
        assert_eq!(config.advisor.config.session_ttl_minutes, 30);
        assert_eq!(
            config.advisor.config.stopping.min_questions,
            AdvisorConfig::default().stopping.min_questions
        );

        std::fs::remove_file(&path).ok();
        reset_env();
    }
}
