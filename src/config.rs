use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::ethereum::Chain;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub explorer: ExplorerConfig,
    pub chains: ChainsConfig,
    pub tables: TablesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Upper bound on a single explorer request
    pub timeout_secs: u64,
}

/// Per-chain explorer settings; a partial `[chains.<name>]` table only
/// overrides the keys it sets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ChainsOverrides")]
pub struct ChainsConfig {
    pub ethereum: ChainConfig,
    pub polygon: ChainConfig,
    #[serde(rename = "binance-smart-chain")]
    pub binance_smart_chain: ChainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is not set
    pub api_key_env: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChainsOverrides {
    ethereum: ChainOverride,
    polygon: ChainOverride,
    #[serde(rename = "binance-smart-chain")]
    binance_smart_chain: ChainOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChainOverride {
    base_url: Option<String>,
    api_key: Option<String>,
    api_key_env: Option<String>,
}

/// Placeholders written into every generated table definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub dataset_name: String,
    pub table_prefix: String,
    pub table_description: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl ExplorerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            ethereum: ChainConfig::new("https://api.etherscan.io", "ETHERSCAN_API_KEY"),
            polygon: ChainConfig::new("https://api.polygonscan.com", "POLYGONSCAN_API_KEY"),
            binance_smart_chain: ChainConfig::new("https://api.bscscan.com", "BSCSCAN_API_KEY"),
        }
    }
}

impl ChainsConfig {
    pub fn get(&self, chain: Chain) -> &ChainConfig {
        match chain {
            Chain::Ethereum => &self.ethereum,
            Chain::Polygon => &self.polygon,
            Chain::BinanceSmartChain => &self.binance_smart_chain,
        }
    }

    fn get_mut(&mut self, chain: Chain) -> &mut ChainConfig {
        match chain {
            Chain::Ethereum => &mut self.ethereum,
            Chain::Polygon => &mut self.polygon,
            Chain::BinanceSmartChain => &mut self.binance_smart_chain,
        }
    }
}

impl From<ChainsOverrides> for ChainsConfig {
    fn from(overrides: ChainsOverrides) -> Self {
        let mut chains = ChainsConfig::default();
        overrides.ethereum.apply(&mut chains.ethereum);
        overrides.polygon.apply(&mut chains.polygon);
        overrides.binance_smart_chain.apply(&mut chains.binance_smart_chain);
        chains
    }
}

impl ChainOverride {
    fn apply(self, chain: &mut ChainConfig) {
        if let Some(base_url) = self.base_url {
            chain.base_url = base_url;
        }
        if self.api_key.is_some() {
            chain.api_key = self.api_key;
        }
        if let Some(api_key_env) = self.api_key_env {
            chain.api_key_env = api_key_env;
        }
    }
}

impl ChainConfig {
    fn new(base_url: &str, api_key_env: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
            api_key_env: api_key_env.to_string(),
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            dataset_name: "<INSERT_DATASET_NAME>".to_string(),
            table_prefix: "<TABLE_PREFIX>".to_string(),
            table_description: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Load configuration with fallback to default
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut config = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(config) => {
                    tracing::info!("Loaded configuration from file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        config.apply_env_vars();
        config
    }

    /// Fill in missing API keys from each chain's environment variable
    fn apply_env_vars(&mut self) {
        for chain in Chain::ALL {
            let chain_config = self.chains.get_mut(chain);
            if chain_config.api_key.is_some() {
                continue;
            }

            match std::env::var(&chain_config.api_key_env) {
                Ok(key) if !key.is_empty() => {
                    tracing::debug!("Using {} for {}", chain_config.api_key_env, chain);
                    chain_config.api_key = Some(key);
                }
                _ => {
                    tracing::warn!(
                        "No API key for {}, set {} for reliable explorer lookups",
                        chain,
                        chain_config.api_key_env
                    );
                }
            }
        }
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("abi2bq").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# abi2bq configuration file

[server]
host = "127.0.0.1"
port = 3000

[explorer]
timeout_secs = 30

# Block explorer per chain. `api_key` may be set inline; otherwise the
# variable named by `api_key_env` is read (a .env file is honoured).
[chains.ethereum]
base_url = "https://api.etherscan.io"
api_key_env = "ETHERSCAN_API_KEY"

[chains.polygon]
base_url = "https://api.polygonscan.com"
api_key_env = "POLYGONSCAN_API_KEY"

[chains.binance-smart-chain]
base_url = "https://api.bscscan.com"
api_key_env = "BSCSCAN_API_KEY"

# Written into every generated BigQuery table definition
[tables]
dataset_name = "<INSERT_DATASET_NAME>"
table_prefix = "<TABLE_PREFIX>"
table_description = ""
"#;
        sample_config.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.chains.get(Chain::Ethereum).base_url, "https://api.etherscan.io");
        assert_eq!(
            config.chains.get(Chain::BinanceSmartChain).api_key_env,
            "BSCSCAN_API_KEY"
        );
        assert_eq!(config.tables.table_prefix, "<TABLE_PREFIX>");
        assert_eq!(config.explorer.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.chains.get(Chain::Polygon).base_url, "https://api.polygonscan.com");
        assert_eq!(config.tables.dataset_name, "<INSERT_DATASET_NAME>");
        assert!(config.chains.get(Chain::Ethereum).api_key.is_none());
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[tables]
dataset_name = "ethereum_decoded"
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.tables.dataset_name, "ethereum_decoded");
        assert_eq!(config.tables.table_prefix, "<TABLE_PREFIX>");
        assert_eq!(config.chains.get(Chain::Ethereum).api_key_env, "ETHERSCAN_API_KEY");
    }

    #[tokio::test]
    async fn test_inline_api_key_is_kept() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[chains.ethereum]
base_url = "http://localhost:9999"
api_key = "inline-key"

[chains.polygon]
api_key_env = "ABI2BQ_TEST_UNSET_VAR"
"#,
        )
        .unwrap();

        let config = Config::load_or_default(Some(&path)).await;
        assert_eq!(config.chains.get(Chain::Ethereum).base_url, "http://localhost:9999");
        assert_eq!(
            config.chains.get(Chain::Ethereum).api_key.as_deref(),
            Some("inline-key")
        );
        assert!(config.chains.get(Chain::Polygon).api_key.is_none());
    }

    #[tokio::test]
    async fn test_partial_chain_section_keeps_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[chains.ethereum]
api_key = "k"
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.port, 8080);

        let ethereum = config.chains.get(Chain::Ethereum);
        assert_eq!(ethereum.api_key.as_deref(), Some("k"));
        assert_eq!(ethereum.base_url, "https://api.etherscan.io");
        assert_eq!(ethereum.api_key_env, "ETHERSCAN_API_KEY");
        assert_eq!(
            config.chains.get(Chain::BinanceSmartChain).base_url,
            "https://api.bscscan.com"
        );
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = Config::load_or_default(Some(temp_dir.path().join("absent.toml"))).await;
        assert_eq!(config.server.port, 3000);
    }
}
