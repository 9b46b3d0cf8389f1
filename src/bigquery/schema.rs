use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::TablesConfig;
use crate::ethereum::{AbiEntry, AbiKind, AbiParam};

/// Parser settings plus the destination table for one ABI entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub parser: ParserDefinition,
    pub table: TableSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserDefinition {
    #[serde(rename = "type")]
    pub kind: ParserKind,
    pub contract_address: String,
    pub abi: Value,
    pub field_mapping: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    Log,
    Trace,
}

impl From<AbiKind> for ParserKind {
    fn from(kind: AbiKind) -> Self {
        match kind {
            AbiKind::Event => ParserKind::Log,
            AbiKind::Function => ParserKind::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub dataset_name: String,
    pub table_name: String,
    pub table_description: String,
    pub schema: Vec<SchemaField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SchemaField>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Record,
}

pub fn table_name(tables: &TablesConfig, entry: &AbiEntry) -> String {
    format!("{}_event_{}", tables.table_prefix, entry.name)
}

/// Map parameters to schema fields; a plain `tuple` with components becomes a
/// RECORD, everything else (tuple arrays included) is stored as STRING.
pub fn transform_params(params: &[AbiParam]) -> Vec<SchemaField> {
    params
        .iter()
        .map(|param| match (&param.components, param.ty.as_str()) {
            (Some(components), "tuple") => SchemaField {
                name: param.name.clone(),
                description: String::new(),
                field_type: FieldType::Record,
                fields: Some(transform_params(components)),
            },
            _ => SchemaField {
                name: param.name.clone(),
                description: String::new(),
                field_type: FieldType::String,
                fields: None,
            },
        })
        .collect()
}

pub fn build_table_definition(
    entry: &AbiEntry,
    contract_address: &str,
    tables: &TablesConfig,
) -> TableDefinition {
    TableDefinition {
        parser: ParserDefinition {
            kind: entry.kind.into(),
            contract_address: contract_address.to_lowercase(),
            abi: entry.raw.clone(),
            field_mapping: Map::new(),
        },
        table: TableSpec {
            dataset_name: tables.dataset_name.clone(),
            table_name: table_name(tables, entry),
            table_description: tables.table_description.clone(),
            schema: transform_params(&entry.inputs),
        },
    }
}
