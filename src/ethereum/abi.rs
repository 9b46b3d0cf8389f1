use serde_json::Value;

use super::{AbiEntry, AbiKind, AbiParam};
use crate::error::ApiError;

/// Deepest tuple nesting accepted from an ABI
pub const MAX_TUPLE_DEPTH: usize = 32;

/// Parse ABI JSON text into its raw entries
pub fn parse_abi_json(text: &str) -> Result<Vec<Value>, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::AbiParse(e.to_string()))
}

/// Lazily yields the entries of `abi` whose `type` equals `kind`, in source order.
///
/// Entries of other kinds are skipped without being inspected further, so
/// constructors, fallbacks and errors never need a name.
pub fn filter_by_kind(
    abi: &[Value],
    kind: AbiKind,
) -> impl Iterator<Item = Result<AbiEntry, ApiError>> + '_ {
    abi.iter().filter_map(move |value| {
        let Some(ty) = value.get("type") else {
            return Some(Err(ApiError::MalformedAbiEntry(format!(
                "entry has no 'type': {}",
                value
            ))));
        };

        if ty.as_str() == Some(kind.as_str()) {
            Some(AbiEntry::from_value(value, kind))
        } else {
            None
        }
    })
}

impl AbiEntry {
    /// Build an entry from its verbatim JSON object
    pub fn from_value(value: &Value, kind: AbiKind) -> Result<Self, ApiError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::MalformedAbiEntry(format!("{} has no 'name'", kind.as_str()))
            })?
            .to_string();

        let inputs = value.get("inputs").ok_or_else(|| {
            ApiError::MalformedAbiEntry(format!("{} '{}' has no 'inputs'", kind.as_str(), name))
        })?;

        let inputs: Vec<AbiParam> = serde_json::from_value(inputs.clone()).map_err(|e| {
            ApiError::MalformedAbiEntry(format!(
                "{} '{}' has invalid inputs: {}",
                kind.as_str(),
                name,
                e
            ))
        })?;

        let owner = format!("{} '{}'", kind.as_str(), name);
        check_tuples(&inputs, MAX_TUPLE_DEPTH, &owner)?;

        Ok(Self {
            kind,
            name,
            inputs,
            raw: value.clone(),
        })
    }
}

/// Reject tuples nested more than `levels_left` deep and tuples with no components
fn check_tuples(params: &[AbiParam], levels_left: usize, owner: &str) -> Result<(), ApiError> {
    for param in params {
        let Some(components) = &param.components else {
            continue;
        };
        if levels_left == 0 {
            return Err(ApiError::MalformedAbiEntry(format!(
                "{} nests tuples deeper than {} levels",
                owner, MAX_TUPLE_DEPTH
            )));
        }
        if components.is_empty() && param.ty.starts_with("tuple") {
            return Err(ApiError::MalformedAbiEntry(format!(
                "{} has tuple '{}' with no components",
                owner, param.name
            )));
        }
        check_tuples(components, levels_left - 1, owner)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn erc20_abi() -> Vec<Value> {
        serde_json::from_value(json!([
            {"type": "constructor", "inputs": [], "stateMutability": "nonpayable"},
            {"anonymous": false, "type": "event", "name": "Transfer", "inputs": [
                {"indexed": true, "name": "from", "type": "address"},
                {"indexed": true, "name": "to", "type": "address"},
                {"indexed": false, "name": "value", "type": "uint256"}
            ]},
            {"type": "function", "name": "transfer", "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ], "outputs": [{"name": "", "type": "bool"}], "stateMutability": "nonpayable"},
            {"anonymous": false, "type": "event", "name": "Approval", "inputs": [
                {"indexed": true, "name": "owner", "type": "address"},
                {"indexed": true, "name": "spender", "type": "address"},
                {"indexed": false, "name": "value", "type": "uint256"}
            ]},
            {"type": "fallback", "stateMutability": "payable"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_filter_preserves_source_order() {
        let abi = erc20_abi();

        let events: Vec<String> = filter_by_kind(&abi, AbiKind::Event)
            .map(|entry| entry.unwrap().name)
            .collect();
        assert_eq!(events, vec!["Transfer", "Approval"]);

        let functions: Vec<AbiEntry> = filter_by_kind(&abi, AbiKind::Function)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "transfer");
        assert_eq!(functions[0].inputs[1].ty, "uint256");
        assert_eq!(functions[0].raw, abi[2]);
    }

    #[test]
    fn test_entry_without_type_is_malformed() {
        let abi = vec![json!({"name": "Orphan", "inputs": []})];
        let result: Result<Vec<_>, _> = filter_by_kind(&abi, AbiKind::Event).collect();
        assert!(matches!(result, Err(ApiError::MalformedAbiEntry(_))));
    }

    #[test]
    fn test_entry_without_inputs_is_malformed() {
        let abi = vec![json!({"type": "event", "name": "NoInputs"})];
        let result: Result<Vec<_>, _> = filter_by_kind(&abi, AbiKind::Event).collect();
        assert!(matches!(result, Err(ApiError::MalformedAbiEntry(_))));
    }

    #[test]
    fn test_tuple_components_are_parsed() {
        let value = json!({"type": "function", "name": "fill", "inputs": [
            {"name": "order", "type": "tuple", "components": [
                {"name": "maker", "type": "address"},
                {"name": "amounts", "type": "tuple[]", "components": [
                    {"name": "token", "type": "address"},
                    {"name": "amount", "type": "uint256"}
                ]}
            ]}
        ]});
        let entry = AbiEntry::from_value(&value, AbiKind::Function).unwrap();
        let order = &entry.inputs[0];
        assert_eq!(order.ty, "tuple");
        let components = order.components.as_ref().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[1].components.as_ref().unwrap().len(), 2);
    }

    fn nested_entry(levels: usize) -> Value {
        let mut param = json!({"name": "leaf", "type": "uint256"});
        for _ in 0..levels {
            param = json!({"name": "t", "type": "tuple", "components": [param]});
        }
        json!({"type": "event", "name": "Deep", "inputs": [param]})
    }

    #[test]
    fn test_nesting_at_limit_is_accepted() {
        let entry = AbiEntry::from_value(&nested_entry(MAX_TUPLE_DEPTH), AbiKind::Event).unwrap();
        assert_eq!(entry.inputs[0].ty, "tuple");
    }

    #[test]
    fn test_excessive_nesting_is_rejected() {
        let result = AbiEntry::from_value(&nested_entry(MAX_TUPLE_DEPTH + 1), AbiKind::Event);
        match result {
            Err(ApiError::MalformedAbiEntry(message)) => assert!(message.contains("deeper")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_tuple_is_rejected() {
        let value = json!({"type": "function", "name": "noop", "inputs": [
            {"name": "outer", "type": "tuple", "components": [
                {"name": "inner", "type": "tuple", "components": []}
            ]}
        ]});
        match AbiEntry::from_value(&value, AbiKind::Function) {
            Err(ApiError::MalformedAbiEntry(message)) => assert!(message.contains("'inner'")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_abi_json_error() {
        assert!(matches!(
            parse_abi_json("Contract source code not verified"),
            Err(ApiError::AbiParse(_))
        ));
        assert_eq!(parse_abi_json("[]").unwrap().len(), 0);
    }
}
