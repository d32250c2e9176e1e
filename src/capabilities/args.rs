//! Argument extraction for tool and resource handlers.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::registry::{Arguments, HandlerError};

/// Page size used when the caller gives no `limit`
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest page Linear returns in one request
pub const MAX_LIMIT: u32 = 250;

/// Present and non-null
fn present<'a>(args: &'a Arguments, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|v| !v.is_null())
}

/// A required, non-empty string argument
pub fn required_str<'a>(args: &'a Arguments, name: &str) -> Result<&'a str, HandlerError> {
    match optional_str(args, name)? {
        Some(value) => Ok(value),
        None => Err(HandlerError::MissingArgument(name.to_string())),
    }
}

/// An optional string argument; empty strings count as absent
pub fn optional_str<'a>(args: &'a Arguments, name: &str) -> Result<Option<&'a str>, HandlerError> {
    match present(args, name) {
        None => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(HandlerError::invalid_argument(name, "expected a string")),
    }
}

/// An optional non-negative integer; numeric strings are accepted
pub fn optional_u64(args: &Arguments, name: &str) -> Result<Option<u64>, HandlerError> {
    match present(args, name) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| HandlerError::invalid_argument(name, "expected a non-negative integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HandlerError::invalid_argument(name, "expected a non-negative integer")),
        Some(_) => Err(HandlerError::invalid_argument(
            name,
            "expected a non-negative integer",
        )),
    }
}

pub fn optional_f64(args: &Arguments, name: &str) -> Result<Option<f64>, HandlerError> {
    match present(args, name) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HandlerError::invalid_argument(name, "expected a number")),
        Some(_) => Err(HandlerError::invalid_argument(name, "expected a number")),
    }
}

/// An optional boolean; `"true"`/`"false"` strings are accepted
pub fn optional_bool(args: &Arguments, name: &str) -> Result<Option<bool>, HandlerError> {
    match present(args, name) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(HandlerError::invalid_argument(name, "expected a boolean")),
        },
        Some(_) => Err(HandlerError::invalid_argument(name, "expected a boolean")),
    }
}

/// An optional `YYYY-MM-DD` date
pub fn optional_date(args: &Arguments, name: &str) -> Result<Option<NaiveDate>, HandlerError> {
    optional_str(args, name)?
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| HandlerError::invalid_argument(name, "expected a date as YYYY-MM-DD"))
        })
        .transpose()
}

/// An optional list of strings, given as an array or a comma-separated string
pub fn optional_string_list(
    args: &Arguments,
    name: &str,
) -> Result<Option<Vec<String>>, HandlerError> {
    match present(args, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(String::from)
                    .ok_or_else(|| HandlerError::invalid_argument(name, "expected strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(HandlerError::invalid_argument(
            name,
            "expected an array of strings",
        )),
    }
}

/// Issue priority, 0 (none) through 4 (low)
pub fn optional_priority(args: &Arguments) -> Result<Option<u8>, HandlerError> {
    match optional_u64(args, "priority")? {
        None => Ok(None),
        Some(p) if p <= 4 => Ok(Some(p as u8)),
        Some(_) => Err(HandlerError::invalid_argument(
            "priority",
            "must be between 0 (none) and 4 (low)",
        )),
    }
}

/// `limit`, clamped to `1..=MAX_LIMIT`
pub fn limit(args: &Arguments) -> Result<u32, HandlerError> {
    Ok(optional_u64(args, "limit")?
        .map(|l| l.clamp(1, u64::from(MAX_LIMIT)) as u32)
        .unwrap_or(DEFAULT_LIMIT))
}

/// JSON Schema for an object with the given properties
pub fn object_schema(properties: Value, required: &[&str]) -> Value {
    if required.is_empty() {
        json!({ "type": "object", "properties": properties })
    } else {
        json!({ "type": "object", "properties": properties, "required": required })
    }
}

/// Schema fragment for the common `limit` argument
pub fn limit_property() -> Value {
    json!({
        "type": "integer",
        "description": "Maximum number of results",
        "default": DEFAULT_LIMIT,
        "minimum": 1,
        "maximum": MAX_LIMIT
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_required_str() {
        let a = args(json!({"id": "ENG-1", "blank": "  ", "num": 3}));
        assert_eq!(required_str(&a, "id").unwrap(), "ENG-1");
        assert!(matches!(
            required_str(&a, "missing"),
            Err(HandlerError::MissingArgument(name)) if name == "missing"
        ));
        assert!(matches!(
            required_str(&a, "blank"),
            Err(HandlerError::MissingArgument(_))
        ));
        assert!(matches!(
            required_str(&a, "num"),
            Err(HandlerError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_numbers_accept_strings() {
        let a = args(json!({"limit": "20", "estimate": 2.5, "bad": "x"}));
        assert_eq!(optional_u64(&a, "limit").unwrap(), Some(20));
        assert_eq!(optional_f64(&a, "estimate").unwrap(), Some(2.5));
        assert!(optional_u64(&a, "bad").is_err());
        assert_eq!(optional_u64(&a, "absent").unwrap(), None);
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(limit(&Arguments::new()).unwrap(), DEFAULT_LIMIT);
        assert_eq!(limit(&args(json!({"limit": 0}))).unwrap(), 1);
        assert_eq!(limit(&args(json!({"limit": 10_000}))).unwrap(), MAX_LIMIT);
    }

    #[test]
    fn test_priority_range() {
        assert_eq!(optional_priority(&args(json!({"priority": 2}))).unwrap(), Some(2));
        assert!(optional_priority(&args(json!({"priority": 7}))).is_err());
    }

    #[test]
    fn test_string_list_forms() {
        let a = args(json!({"csv": "a, b,,c", "arr": ["x", "y"], "mixed": ["x", 1]}));
        assert_eq!(
            optional_string_list(&a, "csv").unwrap(),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(
            optional_string_list(&a, "arr").unwrap(),
            Some(vec!["x".to_string(), "y".to_string()])
        );
        assert!(optional_string_list(&a, "mixed").is_err());
    }

    #[test]
    fn test_date_and_bool() {
        let a = args(json!({"due": "2024-06-01", "bad": "June", "flag": "TRUE"}));
        assert_eq!(
            optional_date(&a, "due").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert!(optional_date(&a, "bad").is_err());
        assert_eq!(optional_bool(&a, "flag").unwrap(), Some(true));
    }

    #[test]
    fn test_object_schema() {
        let schema = object_schema(json!({"id": {"type": "string"}}), &["id"]);
        assert_eq!(schema["required"], json!(["id"]));
        assert!(object_schema(json!({}), &[]).get("required").is_none());
    }
}
