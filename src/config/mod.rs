use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub mod validation;

pub use validation::ConfigValidator;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_feed_timeout_seconds() -> u64 {
    12
}

fn default_provider_timeout_seconds() -> u64 {
    10
}

fn default_country() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Song database file path
    pub database_path: PathBuf,

    /// Chart feed instance URL
    pub chart_instance: String,

    /// Lyrist provider instance URL
    pub lyrist_instance: String,

    /// lyrics.ovh provider instance URL
    pub lyrics_ovh_instance: String,

    /// some-random-api provider instance URL
    pub some_random_api_instance: String,

    /// Country code used when a trending request does not specify one
    #[serde(default = "default_country")]
    pub default_country: String,

    /// Timeout for the chart feed request (seconds)
    #[serde(default = "default_feed_timeout_seconds")]
    pub feed_timeout_seconds: u64,

    /// Timeout for each lyrics provider request (seconds)
    #[serde(default = "default_provider_timeout_seconds")]
    pub provider_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        let default_data_path = match ProjectDirs::from("net", "trendlyrics", "trendlyrics") {
            Some(project_dirs) => project_dirs.data_dir().to_path_buf(),
            None => {
                // Graceful fallback to current directory if project dirs unavailable
                warn!("ProjectDirs unavailable; falling back to current directory for data path");
                PathBuf::from(".")
            }
        };

        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_data_path.join("trendlyrics.db"),
            chart_instance: "https://itunes.apple.com".to_string(),
            lyrist_instance: "https://lyrist.vercel.app".to_string(),
            lyrics_ovh_instance: "https://api.lyrics.ovh".to_string(),
            some_random_api_instance: "https://some-random-api.com".to_string(),
            default_country: default_country(),
            feed_timeout_seconds: default_feed_timeout_seconds(),
            provider_timeout_seconds: default_provider_timeout_seconds(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Try to load .env file if it exists (for Docker and development)
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        // Override with file configuration if available
        let config_file = if let Some(path) = config_path {
            PathBuf::from(path)
        } else {
            Self::default_config_path()?
        };

        if config_file.exists() {
            let content = fs::read_to_string(&config_file)?;
            let file_config: Config = toml::from_str(&content)?;
            config = file_config;
        }

        // Override with environment variables (highest priority)
        config.load_from_env();

        config.validate()?;

        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Save config file if it doesn't exist
        if !config_file.exists() {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            config.save(&config_file)?;
        }

        Ok(config)
    }

    /// Load configuration from environment variables
    fn load_from_env(&mut self) {
        if let Ok(host) = env::var("TRENDLYRICS_HOST") {
            self.host = host;
        }

        // PORT is the deployment contract; TRENDLYRICS_PORT wins if both are set
        if let Ok(port) = env::var("PORT") {
            if let Ok(value) = port.parse::<u16>() {
                self.port = value;
            }
        }

        if let Ok(port) = env::var("TRENDLYRICS_PORT") {
            if let Ok(value) = port.parse::<u16>() {
                self.port = value;
            }
        }

        if let Ok(db_path) = env::var("TRENDLYRICS_DATABASE_PATH") {
            self.database_path = PathBuf::from(db_path);
        }

        if let Ok(instance) = env::var("TRENDLYRICS_CHART_INSTANCE") {
            self.chart_instance = instance;
        }

        if let Ok(instance) = env::var("TRENDLYRICS_LYRIST_INSTANCE") {
            self.lyrist_instance = instance;
        }

        if let Ok(instance) = env::var("TRENDLYRICS_LYRICS_OVH_INSTANCE") {
            self.lyrics_ovh_instance = instance;
        }

        if let Ok(instance) = env::var("TRENDLYRICS_SOME_RANDOM_API_INSTANCE") {
            self.some_random_api_instance = instance;
        }

        if let Ok(country) = env::var("TRENDLYRICS_DEFAULT_COUNTRY") {
            let trimmed = country.trim().to_string();
            if !trimmed.is_empty() {
                self.default_country = trimmed;
            }
        }

        if let Ok(timeout) = env::var("TRENDLYRICS_FEED_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.feed_timeout_seconds = value;
            }
        }

        if let Ok(timeout) = env::var("TRENDLYRICS_PROVIDER_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.provider_timeout_seconds = value;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        ConfigValidator::validate_url(&self.chart_instance, "chart instance")?;
        ConfigValidator::validate_url(&self.lyrist_instance, "lyrist instance")?;
        ConfigValidator::validate_url(&self.lyrics_ovh_instance, "lyrics.ovh instance")?;
        ConfigValidator::validate_url(&self.some_random_api_instance, "some-random-api instance")?;
        ConfigValidator::validate_range(self.feed_timeout_seconds, 1, 120, "feed timeout")?;
        ConfigValidator::validate_range(self.provider_timeout_seconds, 1, 120, "provider timeout")?;
        ConfigValidator::validate_db_path(&self.database_path)?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("net", "trendlyrics", "trendlyrics")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
