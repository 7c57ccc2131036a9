use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `storage.json`; `None` means `$HOME/.config/tcg/console`
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("TCG_API_BASE_URL") {
            self.api.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("TCG_API_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("TCG_CONFIG_DIR") {
            self.storage.dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("TCG_LOG_FILTER") {
            self.logging.filter = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
                timeout_secs: 600,
            },
            storage: StorageConfig { dir: None },
            logging: LoggingConfig {
                filter: "tcg_console=debug,info".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.example.com/api".to_string(),
                timeout_secs: 600,
            },
            storage: StorageConfig { dir: None },
            logging: LoggingConfig {
                filter: "info".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://app.example.com/api".to_string(),
                timeout_secs: 600,
            },
            storage: StorageConfig { dir: None },
            logging: LoggingConfig {
                filter: "warn".to_string(),
            },
        }
    }

    /// Resolve the storage directory, falling back to the per-user config dir
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage.dir.clone().or_else(|| {
            env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config").join("tcg").join("console"))
        })
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<ConsoleConfig> = Lazy::new(ConsoleConfig::from_env);

pub fn config() -> &'static ConsoleConfig {
    &CONFIG
}
