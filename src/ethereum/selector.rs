//! Canonical signatures and on-chain selectors for ABI entries.
//!
//! Events are identified by the full keccak-256 hash of their signature (the
//! first log topic), functions by its first four bytes.

use alloy::primitives::keccak256;

use super::{AbiEntry, AbiKind, AbiParam};
use crate::error::ApiError;

/// Canonical type of a parameter, with tuples expanded to `(t1,t2,...)`
pub fn canonical_type(param: &AbiParam) -> Result<String, ApiError> {
    if let Some(array_suffix) = param.ty.strip_prefix("tuple") {
        let components = param.components.as_ref().ok_or_else(|| {
            ApiError::MalformedAbiEntry(format!(
                "tuple parameter '{}' has no components",
                param.name
            ))
        })?;
        let inner = components
            .iter()
            .map(canonical_type)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(format!("({}){}", inner.join(","), array_suffix));
    }

    let (base, array_suffix) = match param.ty.find('[') {
        Some(idx) => param.ty.split_at(idx),
        None => (param.ty.as_str(), ""),
    };
    let base = match base {
        "uint" => "uint256",
        "int" => "int256",
        "fixed" => "fixed128x18",
        "ufixed" => "ufixed128x18",
        other => other,
    };
    Ok(format!("{}{}", base, array_suffix))
}

/// `name(type1,type2,...)`; parameter names never appear
pub fn signature(entry: &AbiEntry) -> Result<String, ApiError> {
    let types = entry
        .inputs
        .iter()
        .map(canonical_type)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{}({})", entry.name, types.join(",")))
}

/// `0x`-prefixed lowercase hex: the log topic for events, the call selector for functions
pub fn selector(entry: &AbiEntry) -> Result<String, ApiError> {
    let hash = keccak256(signature(entry)?.as_bytes());
    let bytes: &[u8] = match entry.kind {
        AbiKind::Event => hash.as_slice(),
        AbiKind::Function => &hash[..4],
    };
    Ok(format!("0x{}", hex::encode(bytes)))
}
