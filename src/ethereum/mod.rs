pub mod abi;
pub mod explorer;
pub mod selector;
pub mod utils;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// Chains with a supported block explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Chain {
    Ethereum,
    Polygon,
    BinanceSmartChain,
}

impl Chain {
    pub const ALL: [Chain; 3] = [Chain::Ethereum, Chain::Polygon, Chain::BinanceSmartChain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Polygon => "polygon",
            Chain::BinanceSmartChain => "binance-smart-chain",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_str() == s)
            .ok_or_else(|| ApiError::UnsupportedChain(s.to_string()))
    }
}

/// What the caller passed as `{contract}`: an address to look up, or the ABI itself
#[derive(Debug, Clone, PartialEq)]
pub enum ContractRef {
    /// Lower-cased `0x` address
    Address(String),
    InlineAbi(Vec<Value>),
}

impl ContractRef {
    /// Address reported for inline ABIs, which have no on-chain location
    pub const UNKNOWN_ADDRESS: &'static str = "unknown";

    pub fn parse(contract: &str) -> Result<Self, ApiError> {
        if utils::is_address_like(contract) {
            return Ok(ContractRef::Address(utils::normalize_address(contract)));
        }

        let abi: Vec<Value> = serde_json::from_str(contract)
            .map_err(|e| ApiError::AbiParse(format!("inline ABI: {}", e)))?;
        Ok(ContractRef::InlineAbi(abi))
    }

    pub fn contract_address(&self) -> &str {
        match self {
            ContractRef::Address(address) => address,
            ContractRef::InlineAbi(_) => Self::UNKNOWN_ADDRESS,
        }
    }
}

/// ABI entry kinds that produce artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiKind {
    Event,
    Function,
}

impl AbiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiKind::Event => "event",
            AbiKind::Function => "function",
        }
    }
}

/// A single ABI parameter; `components` is only set for tuple types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<AbiParam>>,
}

/// An event or function from an ABI, plus the verbatim JSON it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct AbiEntry {
    pub kind: AbiKind,
    pub name: String,
    pub inputs: Vec<AbiParam>,
    pub raw: Value,
}
