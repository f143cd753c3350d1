//! Parsing of address values out of the loosely-typed JSON shapes used by crash reports.
//!
//! Reports in the wild represent addresses as JSON numbers, decimal strings, or `0x`-prefixed
//! hex strings depending on which tool produced them. [`parse_address`] accepts all three and
//! treats `null`/absent as zero.

use crate::error::ValueError;

/// Parses an address out of a `serde_json::Value`.
///
/// `Value::Null` (and the absence of a field, represented the same way by callers) is treated
/// as address zero. Numbers are taken as-is; strings are parsed as decimal unless they carry a
/// `0x`/`0X` prefix, in which case they are parsed as hex.
pub fn parse_address(value: &serde_json::Value) -> Result<u64, ValueError> {
    match value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(number) => number
            .as_u64()
            .ok_or_else(|| ValueError::InvalidAddress(number.to_string())),
        serde_json::Value::String(string) => parse_address_str(string),
        other => Err(ValueError::InvalidAddressType(json_type_name(other))),
    }
}

/// Parses an address out of a decimal or `0x`-prefixed hex string.
pub fn parse_address_str(value: &str) -> Result<u64, ValueError> {
    let trimmed = value.trim();
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|_| ValueError::InvalidAddress(value.to_string()))
    } else {
        trimmed
            .parse::<u64>()
            .map_err(|_| ValueError::InvalidAddress(value.to_string()))
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_decimal_and_hex_strings() {
        assert_eq!(parse_address(&json!("4096")).unwrap(), 4096);
        assert_eq!(parse_address(&json!("0x1000")).unwrap(), 4096);
        assert_eq!(parse_address(&json!("0X1000")).unwrap(), 4096);
    }

    #[test]
    fn parses_numbers_and_null() {
        assert_eq!(parse_address(&json!(4096)).unwrap(), 4096);
        assert_eq!(parse_address(&json!(null)).unwrap(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_address(&json!("not an address")).is_err());
        assert!(parse_address(&json!(true)).is_err());
    }
}
