//! Configuration management for memorial-plaque.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::qr::{ErrorCorrection, DEFAULT_WIDTH_PX};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "memorial-plaque";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "orders.db";

/// Largest raster width accepted for QR artwork.
const MAX_WIDTH_PX: u32 = 8192;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PLAQUE_`, `__` between sections)
/// 2. TOML config file at `~/.config/memorial-plaque/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Public site configuration.
    pub site: SiteConfig,
    /// QR artwork configuration.
    pub qr: QrConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Checkout configuration.
    pub checkout: CheckoutConfig,
}

/// Public site configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin memorial URLs are built on, e.g. `https://plaques.example`.
    pub origin: String,
}

/// QR artwork configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Error-correction level for engraved codes.
    pub error_correction: ErrorCorrection,
    /// Raster width of the PNG rendering, in pixels.
    pub width_px: u32,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/memorial-plaque/orders.db`
    pub database_path: Option<PathBuf>,
}

/// Checkout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// ISO 4217 currency code orders are priced in.
    pub currency: String,
    /// Plaques per order when none is given.
    pub default_quantity: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::H,
            width_px: DEFAULT_WIDTH_PX,
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            default_quantity: 1,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("PLAQUE_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let origin = &self.site.origin;
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(Error::ConfigValidation {
                message: format!("site origin must start with http:// or https://: {origin}"),
            });
        }
        if origin.trim_end_matches('/').contains(['?', '#']) {
            return Err(Error::ConfigValidation {
                message: format!("site origin must not carry a query or fragment: {origin}"),
            });
        }

        if self.qr.width_px == 0 || self.qr.width_px > MAX_WIDTH_PX {
            return Err(Error::ConfigValidation {
                message: format!(
                    "qr width_px must be between 1 and {MAX_WIDTH_PX}, got {}",
                    self.qr.width_px
                ),
            });
        }

        let currency_code = Regex::new("^[A-Z]{3}$").expect("Invalid currency pattern");
        if !currency_code.is_match(&self.checkout.currency) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "currency must be a three-letter ISO code: {}",
                    self.checkout.currency
                ),
            });
        }

        if self
            .storage
            .database_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "storage database_path must not be empty".to_string(),
            });
        }

        if self.checkout.default_quantity == 0 {
            return Err(Error::ConfigValidation {
                message: "default_quantity must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.site.origin, "http://localhost:3000");
        assert_eq!(config.qr.error_correction, ErrorCorrection::H);
        assert_eq!(config.qr.width_px, 1000);
        assert_eq!(config.checkout.currency, "USD");
        assert_eq!(config.checkout.default_quantity, 1);
        assert!(config.storage.database_path.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_origin_without_scheme() {
        let mut config = Config::default();
        config.site.origin = "plaques.example".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("origin"));
    }

    #[test]
    fn test_validate_rejects_origin_with_query() {
        let mut config = Config::default();
        config.site.origin = "https://plaques.example/?ref=1".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let mut config = Config::default();
        config.qr.width_px = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("width_px"));
    }

    #[test]
    fn test_validate_rejects_bad_currency() {
        let mut config = Config::default();
        config.checkout.currency = "usd".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("currency"));
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let mut config = Config::default();
        config.checkout.default_quantity = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("orders.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("memorial-plaque"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[site]
origin = "https://plaques.example"

[qr]
error_correction = "Q"
width_px = 600

[checkout]
currency = "EUR"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.site.origin, "https://plaques.example");
        assert_eq!(config.qr.error_correction, ErrorCorrection::Q);
        assert_eq!(config.qr.width_px, 600);
        assert_eq!(config.checkout.currency, "EUR");
        assert_eq!(config.checkout.default_quantity, 1);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[site]\norigin = \"ftp://plaques.example\"\n").unwrap();

        assert!(matches!(
            Config::load_from(Some(path)),
            Err(Error::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_database_path() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::new());
        assert!(config.validate().is_err());

        config.storage.database_path = Some(PathBuf::from("/tmp/orders.db"));
        assert!(config.validate().is_ok());
        assert_eq!(config.database_path(), PathBuf::from("/tmp/orders.db"));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("origin"));
        assert!(json.contains("error_correction"));
    }

    #[test]
    fn test_checkout_config_deserialize() {
        let json = r#"{"currency": "GBP"}"#;
        let checkout: CheckoutConfig = serde_json::from_str(json).unwrap();
        assert_eq!(checkout.currency, "GBP");
        assert_eq!(checkout.default_quantity, 1);
    }
}
