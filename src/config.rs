use crate::service::budget_warning::DEFAULT_WARNING_THRESHOLD_PERCENT;
use chrono_tz::Tz;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_PATH: &str = "/api";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub budgets: BudgetsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_path: String,
    pub enable_swagger: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub ttl_hours: i64,
}

/// Settings of the budget-warning computation.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BudgetsConfig {
    /// IANA timezone name used to decide where a calendar month starts and ends.
    pub timezone: String,
    /// Spend level, in percent of the limit, at which a budget is flagged.
    pub warning_threshold_percent: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/spendsense".to_string(),
            max_connections: 16,
            min_connections: 4,
            acquire_timeout: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            enable_swagger: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_hours: 24 }
    }
}

impl Default for BudgetsConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            warning_threshold_percent: DEFAULT_WARNING_THRESHOLD_PERCENT,
        }
    }
}

impl BudgetsConfig {
    pub fn timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| format!("Invalid budgets.timezone '{}': {}", self.timezone, e))
    }

    pub fn threshold_percent(&self) -> Result<u32, String> {
        match self.warning_threshold_percent {
            1..=100 => Ok(self.warning_threshold_percent),
            other => Err(format!("budgets.warning_threshold_percent must be between 1 and 100, got {}", other)),
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Spendsense.toml (base configuration file)
    /// 2. Environment variables (prefixed with SPENDSENSE_, `__` separates sections)
    /// 3. DATABASE_URL environment variable
    pub fn load() -> Result<Self, figment::Error> {
        let defaults = toml::to_string(&Config::default()).map_err(|e| figment::Error::from(e.to_string()))?;

        let figment = Figment::new()
            .merge(Toml::string(&defaults))
            .merge(Toml::file("Spendsense.toml"))
            // e.g. SPENDSENSE_BUDGETS__TIMEZONE=Europe/Lisbon
            .merge(Env::prefixed("SPENDSENSE_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()));

        figment.extract()
    }
}
