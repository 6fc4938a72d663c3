// src/config.rs
use crate::domain::catalog::{Catalog, Product};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::models::UserId;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Delivery bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Messaging platform access
    pub telegram: TelegramConfig,

    /// Chat id of the operator who manages orders
    pub admin_id: i64,

    /// Order storage
    pub storage: StorageConfig,

    /// Draft expiry
    pub session: SessionConfig,

    /// Optional JSON price list; the built-in menu is used when absent
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Telegram Bot API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token
    pub token: String,

    /// Bot API base URL
    pub api_url: String,

    /// Long-poll timeout in seconds
    pub poll_timeout_secs: u64,

    /// Drop updates queued while the bot was offline
    pub skip_pending_updates: bool,

    /// Photo URL or file id shown with the greeting
    #[serde(default)]
    pub welcome_photo: Option<String>,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("skip_pending_updates", &self.skip_pending_updates)
            .field("welcome_photo", &self.welcome_photo)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(AppError::Config(format!(
                "Unsupported storage backend: {}",
                other
            ))),
        }
    }
}

/// Order storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend (e.g., "sqlite", "memory")
    pub backend: StorageBackend,

    /// SQLite database URL
    pub database_url: String,
}

/// Draft expiry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity before a draft is dropped; 0 keeps drafts forever
    pub draft_ttl_minutes: u64,

    /// Seconds between expiry sweeps
    pub sweep_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let telegram_config = TelegramConfig {
            token: env::var("BOT_TOKEN").map_err(|_| {
                AppError::Config("Missing BOT_TOKEN environment variable".to_string())
            })?,
            api_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            poll_timeout_secs: env_or("POLL_TIMEOUT_SECS", 30),
            skip_pending_updates: env_or("SKIP_PENDING_UPDATES", true),
            welcome_photo: env::var("WELCOME_PHOTO").ok().filter(|s| !s.is_empty()),
        };

        let admin_id = env::var("ADMIN_ID")
            .map_err(|_| AppError::Config("Missing ADMIN_ID environment variable".to_string()))?
            .trim()
            .parse::<i64>()
            .map_err(|e| AppError::Config(format!("Invalid ADMIN_ID: {}", e)))?;

        let storage_config = StorageConfig {
            backend: env::var("STORAGE_BACKEND")
                .unwrap_or_else(|_| "sqlite".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://orders.db".to_string()),
        };

        let session_config = SessionConfig {
            draft_ttl_minutes: env_or("DRAFT_TTL_MINUTES", 180),
            sweep_interval_secs: env_or("DRAFT_SWEEP_SECS", 300),
        };

        let logging_config = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            to_file: env_or("LOG_TO_FILE", false),
            file_path: env::var("LOG_FILE_PATH").ok(),
        };

        let config = Config {
            telegram: telegram_config,
            admin_id,
            storage: storage_config,
            session: session_config,
            catalog_path: env::var("CATALOG_PATH").ok().filter(|s| !s.is_empty()),
            logging: logging_config,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path)
            .map_err(|e| AppError::Config(format!("Failed to open config file: {}", e)))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Uses the file named by `CONFIG_PATH` when set, the environment otherwise
    pub fn load() -> AppResult<Self> {
        dotenv().ok();
        match env::var("CONFIG_PATH") {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Self::from_env(),
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(AppError::Config("Bot token is empty".to_string()));
        }
        if self.session.sweep_interval_secs == 0 {
            return Err(AppError::Config(
                "Draft sweep interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn operator(&self) -> UserId {
        UserId(self.admin_id)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.poll_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session.sweep_interval_secs)
    }

    /// `None` when drafts never expire
    pub fn draft_ttl(&self) -> Option<chrono::Duration> {
        match self.session.draft_ttl_minutes {
            0 => None,
            minutes => i64::try_from(minutes).ok().map(chrono::Duration::minutes),
        }
    }

    /// Built-in menu, or the JSON price list at `catalog_path`
    pub fn load_catalog(&self) -> AppResult<Catalog> {
        let Some(path) = &self.catalog_path else {
            return Ok(Catalog::default());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read catalog {}: {}", path, e)))?;
        let products: Vec<Product> = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse catalog {}: {}", path, e)))?;
        Catalog::new(products)
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        // Set log level
        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);
        // The HTTP and database stacks are noisy below warn
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("sqlx", log::LevelFilter::Warn);

        // Configure output
        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path).map_err(|e| {
                    AppError::Config(format!("Failed to create log file: {}", e))
                })?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        // Initialize the logger
        builder.init();

        Ok(())
    }
}
