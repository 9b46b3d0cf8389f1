//! BigQuery artifacts generated from ABI entries: decoding SQL and table schemas

pub mod schema;
pub mod sql;

/// BigQuery column type for a Solidity type.
///
/// Decoded values are kept as STRING; numeric types in particular overflow or
/// fail to parse too often to be typed more narrowly.
const SOLIDITY_TO_BQ_TYPES: &[(&str, &str)] = &[("address", "STRING")];

pub const DEFAULT_BQ_TYPE: &str = "STRING";

pub fn solidity_to_bq_type(solidity_type: &str) -> &'static str {
    SOLIDITY_TO_BQ_TYPES
        .iter()
        .find(|(sol, _)| *sol == solidity_type)
        .map(|(_, bq)| *bq)
        .unwrap_or(DEFAULT_BQ_TYPE)
}
