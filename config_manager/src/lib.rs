use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use timeline_core::{IntervalGranularity, MergeStrategy, MintedFrom};
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] ConfigError),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// General system settings
    pub system: SystemSettings,

    /// OpenSea API configuration (events and collections)
    pub opensea: OpenSeaSettings,

    /// ENS name resolution
    pub ens: EnsSettings,

    /// Timeline assembly and display
    pub timeline: TimelineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Enable debug mode
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSeaSettings {
    /// OpenSea API key, sent as X-API-KEY when set
    pub api_key: Option<String>,

    /// OpenSea API base URL
    pub api_base_url: String,

    /// Public marketplace site for asset and collection links
    pub marketplace_url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Events per timeline page
    pub page_size: u32,

    /// Page size for the held-collections and recent-events lookups
    pub collections_limit: u32,

    /// Username of the account that settles marketplace orders
    pub settlement_username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsSettings {
    /// Ethereum mainnet JSON-RPC endpoint
    pub rpc_url: String,

    /// Maximum reverse-lookup entries kept in memory
    pub cache_capacity: usize,

    /// Reverse-lookup entry lifetime in seconds
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSettings {
    /// "independent" (default) or "fused"
    pub merge_strategy: String,

    /// "transfer_sender" (default) or "asset_contract"
    pub minted_from: String,

    /// Groups with more events than this are shown collapsed
    pub collapse_threshold: usize,

    /// Block explorer used for transaction links
    pub explorer_base_url: String,

    /// "day" or "month"
    pub interval_granularity: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            system: SystemSettings { debug_mode: false },
            opensea: OpenSeaSettings {
                api_key: None, // Set via config.toml or TIMELINE__OPENSEA__API_KEY
                api_base_url: "https://api.opensea.io/api/v1".to_string(),
                marketplace_url: "https://opensea.io".to_string(),
                request_timeout_seconds: 30,
                page_size: 20,
                collections_limit: 300,
                settlement_username: "OpenSea-Orders".to_string(),
            },
            ens: EnsSettings {
                rpc_url: "https://eth.llamarpc.com".to_string(),
                cache_capacity: 1000,
                cache_ttl_seconds: 3600,
            },
            timeline: TimelineSettings {
                merge_strategy: "independent".to_string(),
                minted_from: "transfer_sender".to_string(),
                collapse_threshold: 3,
                explorer_base_url: "https://etherscan.io".to_string(),
                interval_granularity: "month".to_string(),
            },
        }
    }
}

impl OpenSeaSettings {
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_seconds == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.page_size == 0 || self.page_size > 300 {
            return Err(ConfigurationError::InvalidValue(format!(
                "OpenSea page size must be between 1 and 300, got {}",
                self.page_size
            )));
        }

        if self.collections_limit == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Collections limit must be greater than 0".to_string(),
            ));
        }

        if self.api_base_url.is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "OpenSea API base URL is required".to_string(),
            ));
        }

        Ok(())
    }
}

impl EnsSettings {
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "ENS RPC URL is required".to_string(),
            ));
        }

        if self.cache_capacity == 0 {
            return Err(ConfigurationError::InvalidValue(
                "ENS cache capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl TimelineSettings {
    pub fn merge_strategy(&self) -> Result<MergeStrategy> {
        MergeStrategy::from_str(&self.merge_strategy)
            .map_err(|e| ConfigurationError::InvalidValue(e.to_string()))
    }

    pub fn minted_from(&self) -> Result<MintedFrom> {
        MintedFrom::from_str(&self.minted_from)
            .map_err(|e| ConfigurationError::InvalidValue(e.to_string()))
    }

    pub fn interval_granularity(&self) -> Result<IntervalGranularity> {
        IntervalGranularity::from_str(&self.interval_granularity)
            .map_err(|e| ConfigurationError::InvalidValue(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.merge_strategy()?;
        self.minted_from()?;
        self.interval_granularity()?;

        if self.collapse_threshold == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Collapse threshold must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl SystemConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config_builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&SystemConfig::default())?);

        if config_path.as_ref().exists() {
            info!(
                "Loading configuration from: {}",
                config_path.as_ref().display()
            );
            config_builder = config_builder.add_source(File::from(config_path.as_ref()));
        } else {
            debug!("Config file not found, using defaults and environment variables");
        }

        // e.g. TIMELINE__OPENSEA__API_KEY
        config_builder = config_builder.add_source(
            Environment::with_prefix("TIMELINE")
                .try_parsing(true)
                .separator("__"),
        );

        let system_config: SystemConfig = config_builder.build()?.try_deserialize()?;
        system_config.validate()?;

        debug!(
            "OpenSea API key {}",
            if system_config.opensea.api_key.is_some() {
                "configured"
            } else {
                "not set"
            }
        );
        Ok(system_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.opensea.validate()?;
        self.ens.validate()?;
        self.timeline.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.timeline.merge_strategy().unwrap(),
            MergeStrategy::IndependentPages
        );
        assert_eq!(config.timeline.minted_from().unwrap(), MintedFrom::TransferSender);
        assert_eq!(config.opensea.settlement_username, "OpenSea-Orders");
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let mut config = SystemConfig::default();
        config.timeline.merge_strategy = "sticky".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = SystemConfig::default();
        config.opensea.page_size = 0;
        assert!(config.validate().is_err());
        config.opensea.page_size = 301;
        assert!(config.validate().is_err());
        config.opensea.page_size = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = SystemConfig::load_from_path("does/not/exist/config.toml").unwrap();
        assert_eq!(config.opensea.page_size, SystemConfig::default().opensea.page_size);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!(
            "wallet_timeline_config_{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[timeline]\nmerge_strategy = \"fused\"\ncollapse_threshold = 5\n\n[opensea]\napi_key = \"test-key\""
        )
        .unwrap();

        let config = SystemConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            config.timeline.merge_strategy().unwrap(),
            MergeStrategy::FusedBoundary
        );
        assert_eq!(config.timeline.collapse_threshold, 5);
        assert_eq!(config.opensea.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.timeline.minted_from, "transfer_sender");
    }
}
