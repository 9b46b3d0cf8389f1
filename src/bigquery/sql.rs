//! SQL that decodes raw logs or traces for one ABI entry inside BigQuery.
//!
//! Decoding happens at query time in a JavaScript UDF, so the rendered query
//! embeds the ABI entry itself and filters the public dataset down to rows
//! emitted by (or sent to) the contract with a matching selector.

use super::solidity_to_bq_type;
use crate::error::ApiError;
use crate::ethereum::{selector::selector, AbiEntry, AbiKind};

/// UDF library providing `abi.decodeEvent`
pub const EVENT_DECODER_LIBRARY: &str =
    "https://storage.googleapis.com/ethlab-183014.appspot.com/ethjs-abi.js";

/// UDF library providing `ethers.utils.Interface`
pub const TRACE_DECODER_LIBRARY: &str = "gs://blockchain-etl-bigquery/ethers.js";

const LOGS_TABLE: &str = "bigquery-public-data.crypto_ethereum.logs";
const TRACES_TABLE: &str = "bigquery-public-data.crypto_ethereum.traces";

const TRACE_DECODER_BODY: &str = r#"    var interface_instance = new ethers.utils.Interface([abi]);

    var result = {};
    try {
        var parsedTransaction = interface_instance.parseTransaction({data: data});
        var parsedArgs = parsedTransaction.args;

        if (parsedArgs && parsedArgs.length >= abi.inputs.length) {
            for (var i = 0; i < abi.inputs.length; i++) {
                var paramName = abi.inputs[i].name;
                var paramValue = parsedArgs[i];
                if (abi.inputs[i].type === 'address' && typeof paramValue === 'string') {
                    // For consistency all addresses are lowercase.
                    paramValue = paramValue.toLowerCase();
                }
                result[paramName] = paramValue;
            }
        } else {
            result['error'] = 'Parsed transaction args is empty or has too few values.';
        }
    } catch (e) {
        result['error'] = e.message;
    }

    return result;
"#;

/// The two fixed query shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlTemplate {
    /// Filters `logs` by address and topic 0, decodes `data`/`topics`
    EventLog,
    /// Filters `traces` by `to_address` and input prefix, decodes call input
    FunctionTrace,
}

impl SqlTemplate {
    pub fn for_kind(kind: AbiKind) -> Self {
        match kind {
            AbiKind::Event => SqlTemplate::EventLog,
            AbiKind::Function => SqlTemplate::FunctionTrace,
        }
    }
}

/// `` `name` TYPE `` pairs for the UDF's return struct, top-level inputs only
pub fn struct_fields(entry: &AbiEntry) -> String {
    entry
        .inputs
        .iter()
        .map(|param| format!("`{}` {}", param.name, solidity_to_bq_type(&param.ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn columns(entry: &AbiEntry) -> Vec<&str> {
    entry.inputs.iter().map(|param| param.name.as_str()).collect()
}

/// Render the decoding query for `entry`. `contract_address` is lower-cased here.
pub fn render_sql(
    entry: &AbiEntry,
    template: SqlTemplate,
    contract_address: &str,
) -> Result<String, ApiError> {
    let selector = selector(entry)?;
    let contract_address = contract_address.to_lowercase();
    let abi = entry.raw.to_string();
    let struct_fields = struct_fields(entry);
    let columns = columns(entry);

    let sql = match template {
        SqlTemplate::EventLog => {
            let projections: String = columns
                .iter()
                .map(|column| format!("\n    ,parsed.{column} AS `{column}`"))
                .collect();

            format!(
                r#"
CREATE TEMP FUNCTION
  PARSE_LOG(data STRING, topics ARRAY<STRING>)
  RETURNS STRUCT<{struct_fields}>
  LANGUAGE js AS """
    var parsedEvent = {abi}
    return abi.decodeEvent(parsedEvent, data, topics, false);
"""
OPTIONS
  ( library="{EVENT_DECODER_LIBRARY}" );

WITH parsed_logs AS
(SELECT
    logs.block_timestamp AS block_timestamp
    ,logs.block_number AS block_number
    ,logs.transaction_hash AS transaction_hash
    ,logs.log_index AS log_index
    ,PARSE_LOG(logs.data, logs.topics) AS parsed
FROM `{LOGS_TABLE}` AS logs
WHERE address = '{contract_address}'
  AND topics[SAFE_OFFSET(0)] = '{selector}'
)
SELECT
     block_timestamp
     ,block_number
     ,transaction_hash
     ,log_index{projections}
FROM parsed_logs"#
            )
        }
        SqlTemplate::FunctionTrace => {
            let projections: String = columns
                .iter()
                .map(|column| format!("\n    ,parsed.{column} AS `{column}`\n    "))
                .collect();
            // The trailing error column must not leave a dangling comma behind
            let return_fields = if struct_fields.is_empty() {
                "error STRING".to_string()
            } else {
                format!("{struct_fields}, error STRING")
            };

            format!(
                r#"
CREATE TEMP FUNCTION
    PARSE_TRACE(data STRING)
    RETURNS STRUCT<{return_fields}>
    LANGUAGE js AS """
    var abi = {abi};
{TRACE_DECODER_BODY}"""
OPTIONS
  ( library="{TRACE_DECODER_LIBRARY}" );

WITH parsed_traces AS
(SELECT
    traces.block_timestamp AS block_timestamp
    ,traces.block_number AS block_number
    ,traces.transaction_hash AS transaction_hash
    ,traces.trace_address AS trace_address
    ,PARSE_TRACE(traces.input) AS parsed
FROM `{TRACES_TABLE}` AS traces
WHERE to_address = '{contract_address}'
  AND STARTS_WITH(traces.input, '{selector}')
  )
SELECT
     block_timestamp
     ,block_number
     ,transaction_hash
     ,trace_address
     ,parsed.error AS error
     {projections}
FROM parsed_traces"#
            )
        }
    };

    Ok(sql)
}
