use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{abi::parse_abi_json, utils, Chain};
use crate::config::{ChainsConfig, Config};
use crate::error::ApiError;

/// Block-explorer lookups needed to resolve a contract
#[async_trait]
pub trait ExplorerClient: Send + Sync {
    /// Raw ABI entries published for `address`
    async fn fetch_abi(&self, chain: Chain, address: &str) -> Result<Vec<Value>, ApiError>;

    /// First source-code record for `address` that carries a `ContractName`
    async fn fetch_source_metadata(&self, chain: Chain, address: &str) -> Result<Value, ApiError>;
}

/// Etherscan-compatible API response envelope
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    result: Value,
}

/// Client for Etherscan-family explorers (etherscan, polygonscan, bscscan)
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    client: Client,
    chains: ChainsConfig,
}

impl EtherscanClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.explorer.timeout())
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            chains: config.chains.clone(),
        })
    }

    /// Issue one `module=contract` request and unwrap the response envelope
    async fn contract_action(
        &self,
        chain: Chain,
        action: &str,
        address: &str,
    ) -> Result<ExplorerResponse, ApiError> {
        let chain_config = self.chains.get(chain);
        let url = format!("{}/api", chain_config.base_url.trim_end_matches('/'));

        let mut query = vec![
            ("module", "contract"),
            ("action", action),
            ("address", address),
        ];
        if let Some(api_key) = &chain_config.api_key {
            query.push(("apikey", api_key.as_str()));
        }

        debug!("GET {} action={} address={}", url, action, address);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                ApiError::UpstreamFetch(format!("Failed to reach {} explorer: {}", chain, e))
            })?;

        if !response.status().is_success() {
            return Err(ApiError::UpstreamFetch(format!(
                "{} explorer returned HTTP {}",
                chain,
                response.status()
            )));
        }

        response.json::<ExplorerResponse>().await.map_err(|e| {
            ApiError::UpstreamFetch(format!("Failed to parse {} explorer response: {}", chain, e))
        })
    }
}

#[async_trait]
impl ExplorerClient for EtherscanClient {
    async fn fetch_abi(&self, chain: Chain, address: &str) -> Result<Vec<Value>, ApiError> {
        let address = utils::normalize_address(address);
        info!("Fetching ABI from {} explorer for {}", chain, address);

        let response = self.contract_action(chain, "getabi", &address).await?;

        // `result` is itself JSON text on success and a plain message on failure
        let accepted = response.status == "1";
        match response.result.as_str() {
            Some(abi_text) => parse_abi_json(abi_text).map_err(|e| {
                if accepted {
                    e
                } else {
                    ApiError::UpstreamFetch(utils::interpret_explorer_error(
                        &response.message,
                        abi_text,
                        &address,
                    ))
                }
            }),
            None if accepted => Err(ApiError::AbiParse(format!(
                "explorer result for {} is not a string",
                address
            ))),
            None => Err(ApiError::UpstreamFetch(utils::interpret_explorer_error(
                &response.message,
                &response.result.to_string(),
                &address,
            ))),
        }
    }

    async fn fetch_source_metadata(&self, chain: Chain, address: &str) -> Result<Value, ApiError> {
        let address = utils::normalize_address(address);
        info!("Fetching source metadata from {} explorer for {}", chain, address);

        let response = self.contract_action(chain, "getsourcecode", &address).await?;

        let records = match response.result {
            Value::Array(records) => records,
            Value::String(result) => {
                return Err(ApiError::UpstreamFetch(utils::interpret_explorer_error(
                    &response.message,
                    &result,
                    &address,
                )))
            }
            other => {
                return Err(ApiError::UpstreamFetch(format!(
                    "unexpected source metadata result: {}",
                    other
                )))
            }
        };

        records
            .into_iter()
            .find(|record| record.get("ContractName").is_some())
            .ok_or_else(|| ApiError::ContractNotFound(address))
    }
}
