//! Coercions from wire fields to payload primitives.
//!
//! Money-like fields arrive as decimal strings and become JSON numbers;
//! absent optional fields become null, with one deliberate exception
//! (`money_or_zero`). Timestamps pass through as strings.

use crate::error::ToolError;
use serde_json::Value;

/// Parse a required decimal string into a JSON number.
pub fn money(field: &'static str, raw: &str) -> Result<Value, ToolError> {
    let parsed: f64 = raw.trim().parse().map_err(|_| ToolError::Malformed {
        field,
        value: raw.to_string(),
    })?;
    Ok(Value::from(parsed))
}

/// Optional decimal string; absent maps to null, not zero.
pub fn money_opt(field: &'static str, raw: Option<&String>) -> Result<Value, ToolError> {
    match raw {
        Some(value) => money(field, value),
        None => Ok(Value::Null),
    }
}

/// Optional decimal string that maps to 0 when absent. Only
/// daytrading_buying_power behaves this way.
pub fn money_or_zero(field: &'static str, raw: Option<&String>) -> Result<Value, ToolError> {
    match raw {
        Some(value) => money(field, value),
        None => Ok(Value::from(0)),
    }
}

/// Optional timestamp; absent maps to null.
pub fn timestamp_opt(raw: Option<&String>) -> Value {
    match raw {
        Some(value) => Value::from(value.as_str()),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_money_parses_decimal_strings() {
        assert_eq!(money("cash", "100000.25").unwrap(), json!(100000.25));
        assert_eq!(money("qty", "1").unwrap(), json!(1.0));
        assert_eq!(money("change_today", "-0.0153").unwrap(), json!(-0.0153));
    }

    #[test]
    fn test_money_rejects_garbage() {
        let err = money("cash", "not-a-number").unwrap_err();
        assert!(matches!(err, ToolError::Malformed { field: "cash", .. }));
    }

    #[test]
    fn test_absent_money_is_null_not_zero() {
        assert_eq!(money_opt("current_price", None).unwrap(), Value::Null);
        let price = "172.5".to_string();
        assert_eq!(money_opt("current_price", Some(&price)).unwrap(), json!(172.5));
    }

    #[test]
    fn test_daytrading_buying_power_asymmetry() {
        // The one field where absent means 0 rather than null.
        assert_eq!(money_or_zero("daytrading_buying_power", None).unwrap(), json!(0));
        let power = "400000".to_string();
        assert_eq!(
            money_or_zero("daytrading_buying_power", Some(&power)).unwrap(),
            json!(400000.0)
        );
    }

    #[test]
    fn test_timestamp_opt() {
        assert_eq!(timestamp_opt(None), Value::Null);
        let at = "2024-03-04T09:30:00Z".to_string();
        assert_eq!(timestamp_opt(Some(&at)), json!("2024-03-04T09:30:00Z"));
    }
}
