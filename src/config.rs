//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `config/hub.toml`.
//!     loads configuration from file or falls back to defaults, then applies
//!     environment overrides (API_KEY, PORT) so deployments never need to
//!     edit the file.
//!
//! structure:
//!     - ServerConfig: listening port.
//!     - AuthConfig: shared secret the devices must present on ingestion.
//!     - LoggingConfig: tracing filter level.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::Path;

/// shared secret used when nothing is configured
///
/// insecure on purpose: existing firmware ships with this value baked in and
/// must keep working against a freshly started hub. set API_KEY in production.
pub const DEFAULT_API_KEY: &str = "change-me";

const DEFAULT_PORT: u16 = 5000;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { api_key: default_api_key() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HubConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: HubConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// Load with default fallback, then apply environment overrides
    pub fn load_or_default() -> Self {
        let paths = [
            std::path::PathBuf::from("config").join("hub.toml"),
            std::path::PathBuf::from("..").join("config").join("hub.toml"),
        ];

        let mut config = None;
        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(c) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        config = Some(c);
                        break;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            println!("[CONFIG] Warning: No config file found - using defaults");
            Self::default()
        });
        config.apply_env();
        config
    }

    /// environment beats file: API_KEY for the secret, PORT for the listener
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("API_KEY") {
            if !key.is_empty() {
                self.auth.api_key = key;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => println!("[CONFIG] Warning: ignoring non-numeric PORT={}", port),
            }
        }
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│           HUB CONFIGURATION             │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Port: {}                              │", self.server.port);
        println!("│ Log Level: {}                        │", self.logging.level);
        if self.auth.api_key == DEFAULT_API_KEY {
            println!("│ API Key: DEFAULT (set API_KEY env!)     │");
        } else {
            println!("│ API Key: (configured)                   │");
        }
        println!("└─────────────────────────────────────────┘");
    }
}
