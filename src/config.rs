use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_SEMRUSH_API_BASE: &str = "https://api.semrush.com/";
pub const DEFAULT_SERPER_API_BASE: &str = "https://google.serper.dev/";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

pub const SEMRUSH_DISPLAY_LIMIT: u32 = 50;
pub const SEMRUSH_COMPETITORS_DISPLAY_LIMIT: u32 = 20;
pub const SEMRUSH_DATABASE: &str = "it";

/// Serper search parameters: Italian geolocation and language
pub const SERPER_GL: &str = "it";
pub const SERPER_HL: &str = "it";
pub const SERPER_NUM_RESULTS: u32 = 20;

pub const SOCIAL_PLATFORMS: [&str; 6] = [
    "instagram",
    "facebook",
    "linkedin",
    "youtube",
    "tiktok",
    "twitter",
];

pub const FINANCIAL_SOURCES: [&str; 4] = [
    "https://www.registroimprese.it/",
    "https://www.ufficiocamerale.it/",
    "https://www.reportaziende.it/",
    "https://www.aida.bvdinfo.com/",
];

/// Errors raised while reading configuration at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("required environment variable {0} is empty")]
    Empty(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Secret credential. Never printed in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// External services the analyzer talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    OpenAi,
    Semrush,
    Serper,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::OpenAi, Service::Semrush, Service::Serper];

    pub fn env_key(&self) -> &'static str {
        match self {
            Service::OpenAi => "OPENAI_API_KEY",
            Service::Semrush => "SEMRUSH_API_KEY",
            Service::Serper => "SERPER_API_KEY",
        }
    }

    /// Requests allowed per one-minute window
    pub fn rate_limit_per_minute(&self) -> u32 {
        match self {
            Service::OpenAi => 50,
            Service::Semrush => 10,
            Service::Serper => 100,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Service::OpenAi => "openai",
            Service::Semrush => "semrush",
            Service::Serper => "serper",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" | "CRITICAL" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// SEMRush report families used by the SEO agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemrushReport {
    Organic,
    Backlinks,
    Competitors,
    Paid,
}

impl SemrushReport {
    pub fn key(&self) -> &'static str {
        match self {
            SemrushReport::Organic => "organic",
            SemrushReport::Backlinks => "backlinks",
            SemrushReport::Competitors => "competitors",
            SemrushReport::Paid => "paid",
        }
    }

    pub fn api_type(&self) -> &'static str {
        match self {
            SemrushReport::Organic => "domain_organic",
            SemrushReport::Backlinks => "backlinks_overview",
            SemrushReport::Competitors => "domain_organic_organic",
            SemrushReport::Paid => "domain_adwords",
        }
    }

    pub fn export_columns(&self) -> &'static str {
        match self {
            SemrushReport::Organic => "Dn,Cr,Np,Or,Ot,Oc,Ad,At,Ac",
            SemrushReport::Backlinks => "target_url,source_url,anchor,last_seen",
            SemrushReport::Competitors => "Dn,Cr,Np,Or",
            SemrushReport::Paid => "Dn,Cr,Np,Ad,At,Ac",
        }
    }

    pub fn display_limit(&self) -> u32 {
        match self {
            SemrushReport::Competitors => SEMRUSH_COMPETITORS_DISPLAY_LIMIT,
            _ => SEMRUSH_DISPLAY_LIMIT,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: ApiKey,
    pub semrush_api_key: ApiKey,
    pub serper_api_key: ApiKey,
    pub debug: bool,
    pub log_level: LogLevel,
    pub cache_duration_hours: u64,
    pub max_retries: u32,
    pub api_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    pub semrush_api_base: String,
    pub serper_api_base: String,
    pub openai_api_base: String,
    pub openai_model: String,
}

impl Config {
    /// Loads `.env` when present, then reads the process environment.
    /// Variables already set in the process take precedence over the file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_retries = parse_number(&lookup, "MAX_RETRIES", 3u32)?;
        if max_retries == 0 {
            return Err(invalid("MAX_RETRIES", "0", "must be at least 1"));
        }
        let api_timeout_secs = parse_number(&lookup, "API_TIMEOUT", 30u64)?;
        if api_timeout_secs == 0 {
            return Err(invalid("API_TIMEOUT", "0", "must be greater than 0"));
        }
        let analysis_timeout_secs = parse_number(&lookup, "ANALYSIS_TIMEOUT", 300u64)?;
        if analysis_timeout_secs == 0 {
            return Err(invalid("ANALYSIS_TIMEOUT", "0", "must be greater than 0"));
        }

        let log_level = match non_empty(&lookup, "LOG_LEVEL") {
            Some(raw) => LogLevel::parse(&raw).ok_or_else(|| {
                invalid(
                    "LOG_LEVEL",
                    &raw,
                    "expected one of TRACE, DEBUG, INFO, WARNING, ERROR, CRITICAL",
                )
            })?,
            None => LogLevel::Info,
        };

        Ok(Self {
            openai_api_key: required(&lookup, Service::OpenAi.env_key())?,
            semrush_api_key: required(&lookup, Service::Semrush.env_key())?,
            serper_api_key: required(&lookup, Service::Serper.env_key())?,
            debug: parse_bool(&lookup, "DEBUG")?,
            log_level,
            cache_duration_hours: parse_number(&lookup, "CACHE_DURATION_HOURS", 24u64)?,
            max_retries,
            api_timeout_secs,
            analysis_timeout_secs,
            host: non_empty(&lookup, "STREAMLIT_SERVER_ADDRESS")
                .unwrap_or_else(|| "localhost".to_string()),
            port: parse_number(&lookup, "STREAMLIT_SERVER_PORT", 8501u16)?,
            semrush_api_base: non_empty(&lookup, "SEMRUSH_API_BASE")
                .unwrap_or_else(|| DEFAULT_SEMRUSH_API_BASE.to_string()),
            serper_api_base: non_empty(&lookup, "SERPER_API_BASE")
                .unwrap_or_else(|| DEFAULT_SERPER_API_BASE.to_string()),
            openai_api_base: non_empty(&lookup, "OPENAI_API_BASE")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            openai_model: non_empty(&lookup, "OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        })
    }

    pub fn api_key(&self, service: Service) -> &ApiKey {
        match service {
            Service::OpenAi => &self.openai_api_key,
            Service::Semrush => &self.semrush_api_key,
            Service::Serper => &self.serper_api_key,
        }
    }

    /// Effective log level; `DEBUG=true` forces debug output
    pub fn effective_log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_duration_hours * 3600)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<ApiKey, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or(ConfigError::Missing(key))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Empty(key));
    }
    Ok(ApiKey::new(value))
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| invalid(key, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(invalid(key, &raw, "expected a boolean")),
        },
        None => Ok(false),
    }
}
