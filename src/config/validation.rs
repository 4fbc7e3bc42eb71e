use std::path::Path;
use url::Url;

/// Centralized configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a URL string
    pub fn validate_url(url: &str, field_name: &str) -> anyhow::Result<()> {
        Url::parse(url)
            .map_err(|e| anyhow::anyhow!("Invalid {} URL '{}': {}", field_name, url, e))?;
        Ok(())
    }

    /// Validate numeric range
    pub fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> anyhow::Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            anyhow::bail!(
                "{} must be between {} and {}, got {}",
                field_name,
                min,
                max,
                value
            );
        }
        Ok(())
    }

    /// Validate database file extension
    pub fn validate_db_path(path: &Path) -> anyhow::Result<()> {
        match path.extension() {
            Some(ext) if ext == "db" || ext == "sqlite" || ext == "sqlite3" => Ok(()),
            _ => anyhow::bail!(
                "Database file should have .db, .sqlite, or .sqlite3 extension, got: {}",
                path.display()
            ),
        }
    }
}
