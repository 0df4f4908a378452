//! Configuration module

use std::env;
use std::path::PathBuf;

use sentinel_core::constants::get_artifact_dir;
use sentinel_core::Theme;

/// Service and CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory holding model.json / feature_columns.json / report.json
    pub artifact_dir: PathBuf,

    /// Default theme for `generate` and `train`
    pub theme: Theme,

    /// Refuse to start the service without artifacts
    pub require_model: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            artifact_dir: get_artifact_dir(),

            theme: env::var("THEME")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(Theme::Flows),

            require_model: env::var("REQUIRE_MODEL")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}
