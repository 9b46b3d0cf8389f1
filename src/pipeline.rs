//! Resolve a contract's ABI and turn every event and function into an artifact.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::bigquery::{
    schema::{build_table_definition, TableDefinition},
    sql::{render_sql, SqlTemplate},
};
use crate::config::TablesConfig;
use crate::error::ApiError;
use crate::ethereum::{
    abi::filter_by_kind, explorer::ExplorerClient, AbiEntry, AbiKind, Chain, ContractRef,
};

/// Artifacts keyed by ABI entry name. Insertion-ordered; a repeated name keeps
/// its first position and the last value.
pub type ArtifactMap<T> = IndexMap<String, T>;

/// An ABI together with the address artifacts should refer to
#[derive(Debug, Clone)]
pub struct ResolvedAbi {
    pub contract_address: String,
    pub entries: Vec<Value>,
}

/// Fetch the ABI for an address, or take an inline ABI as-is.
///
/// `chain` is only interpreted when a lookup is needed.
pub async fn resolve_abi(
    contract: ContractRef,
    chain: &str,
    explorer: &dyn ExplorerClient,
) -> Result<ResolvedAbi, ApiError> {
    let contract_address = contract.contract_address().to_string();
    let entries = match contract {
        ContractRef::Address(address) => {
            let chain: Chain = chain.parse()?;
            explorer.fetch_abi(chain, &address).await?
        }
        ContractRef::InlineAbi(entries) => entries,
    };

    debug!(
        "Resolved ABI for {} with {} entries",
        contract_address,
        entries.len()
    );
    Ok(ResolvedAbi {
        contract_address,
        entries,
    })
}

/// Events in ABI order, then functions in ABI order
fn artifact_entries(abi: &[Value]) -> impl Iterator<Item = Result<AbiEntry, ApiError>> + '_ {
    filter_by_kind(abi, AbiKind::Event).chain(filter_by_kind(abi, AbiKind::Function))
}

pub fn contract_to_sqls(resolved: &ResolvedAbi) -> Result<ArtifactMap<String>, ApiError> {
    let mut result = ArtifactMap::new();
    for entry in artifact_entries(&resolved.entries) {
        let entry = entry?;
        let sql = render_sql(
            &entry,
            SqlTemplate::for_kind(entry.kind),
            &resolved.contract_address,
        )?;
        result.insert(entry.name, sql);
    }
    Ok(result)
}

pub fn contract_to_table_definitions(
    resolved: &ResolvedAbi,
    tables: &TablesConfig,
) -> Result<ArtifactMap<TableDefinition>, ApiError> {
    let mut result = ArtifactMap::new();
    for entry in artifact_entries(&resolved.entries) {
        let entry = entry?;
        let definition = build_table_definition(&entry, &resolved.contract_address, tables);
        result.insert(entry.name, definition);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigquery::schema::ParserKind;
    use serde_json::json;

    fn inline(abi: Value) -> ResolvedAbi {
        ResolvedAbi {
            contract_address: ContractRef::UNKNOWN_ADDRESS.to_string(),
            entries: serde_json::from_value(abi).unwrap(),
        }
    }

    #[test]
    fn test_events_then_functions() {
        let resolved = inline(json!([
            {"type": "function", "name": "mint", "inputs": [{"name": "to", "type": "address"}]},
            {"type": "event", "name": "Minted", "inputs": [{"name": "to", "type": "address"}]},
            {"type": "constructor", "inputs": []},
            {"type": "error", "name": "Unauthorized", "inputs": []}
        ]));

        let sqls = contract_to_sqls(&resolved).unwrap();
        let names: Vec<&str> = sqls.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Minted", "mint"]);
        assert!(sqls["Minted"].contains("WHERE address = 'unknown'"));
        assert!(sqls["mint"].contains("WHERE to_address = 'unknown'"));
    }

    #[test]
    fn test_duplicate_names_keep_last_value() {
        let resolved = inline(json!([
            {"type": "function", "name": "transfer", "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ]},
            {"type": "function", "name": "balanceOf", "inputs": [{"name": "who", "type": "address"}]},
            {"type": "function", "name": "transfer", "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"},
                {"name": "data", "type": "bytes"}
            ]}
        ]));

        let tables = contract_to_table_definitions(&resolved, &TablesConfig::default()).unwrap();
        let names: Vec<&str> = tables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["transfer", "balanceOf"]);
        assert_eq!(tables["transfer"].table.schema.len(), 3);
        assert_eq!(tables["transfer"].parser.kind, ParserKind::Trace);
    }

    #[test]
    fn test_malformed_entry_fails_whole_request() {
        let resolved = inline(json!([
            {"type": "event", "name": "Ok", "inputs": []},
            {"type": "event", "inputs": []}
        ]));
        assert!(matches!(
            contract_to_sqls(&resolved),
            Err(ApiError::MalformedAbiEntry(_))
        ));
    }
}
