/// Whether a `{contract}` path segment should be treated as an address.
///
/// Only the `0x` prefix is checked; anything else is expected to be an inline ABI.
pub fn is_address_like(contract: &str) -> bool {
    contract.starts_with("0x")
}

/// Lower-cases an address for use in URLs, SQL literals and table definitions
pub fn normalize_address(address: &str) -> String {
    address.to_lowercase()
}

/// Creates user-friendly error messages for explorer failures
pub fn interpret_explorer_error(message: &str, result: &str, contract_address: &str) -> String {
    let combined = format!("{} {}", message, result).to_lowercase();

    if combined.contains("not verified") {
        format!(
            "Contract source code not verified: the contract at {} has no published ABI on this explorer.",
            contract_address
        )
    } else if combined.contains("rate limit") {
        "Explorer rate limit reached. Try again in a few moments or configure an API key.".to_string()
    } else if combined.contains("invalid api key") || combined.contains("missing/invalid api key") {
        "Explorer rejected the API key. Check the API key configured for this chain.".to_string()
    } else if combined.contains("invalid address") {
        format!("Explorer rejected the address {}", contract_address)
    } else {
        format!("Explorer error: {} ({})", message, result)
    }
}
