//! Field schemas and typed access to request data.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{Error, Result};

/// Type of a path or secret field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Plain string
    String,
    /// String folded to lowercase
    LowerCaseString,
    /// List of strings, given as a JSON array or a comma-separated string
    CommaStringSlice,
    /// Duration, given as whole seconds or a unit string such as `"5m"`
    DurationSecond,
}

impl FieldType {
    /// Name shown in help output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::LowerCaseString => "lowercase_string",
            Self::CommaStringSlice => "comma_string_slice",
            Self::DurationSecond => "duration_second",
        }
    }

    /// Value used by [`FieldData::get`] when the field was not supplied
    pub fn zero_value(&self) -> FieldValue {
        match self {
            Self::String | Self::LowerCaseString => FieldValue::String(String::new()),
            Self::CommaStringSlice => FieldValue::StringSlice(Vec::new()),
            Self::DurationSecond => FieldValue::Duration(Duration::ZERO),
        }
    }

    /// Parse a raw JSON value into this type
    pub fn parse(&self, name: &str, raw: &Value) -> Result<FieldValue> {
        match self {
            Self::String => Ok(FieldValue::String(parse_string(name, raw)?)),
            Self::LowerCaseString => {
                Ok(FieldValue::String(parse_string(name, raw)?.to_lowercase()))
            }
            Self::CommaStringSlice => Ok(FieldValue::StringSlice(parse_string_slice(name, raw)?)),
            Self::DurationSecond => Ok(FieldValue::Duration(parse_duration(name, raw)?)),
        }
    }
}

fn parse_string(name: &str, raw: &Value) -> Result<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(Error::validation(format!("field '{}' must be a string", name))),
    }
}

fn parse_string_slice(name: &str, raw: &Value) -> Result<Vec<String>> {
    let items: Vec<String> = match raw {
        Value::Null => Vec::new(),
        Value::String(s) => s.split(',').map(|item| item.trim().to_string()).collect(),
        Value::Array(values) => values
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(Error::validation(format!(
                    "field '{}' must be a list of strings",
                    name
                ))),
            })
            .collect::<Result<_>>()?,
        _ => {
            return Err(Error::validation(format!("field '{}' must be a list of strings", name)))
        }
    };

    Ok(items.into_iter().filter(|item| !item.is_empty()).collect())
}

/// Parse a duration given as integer seconds, a numeric string, or a unit
/// string understood by `humantime` (`"90s"`, `"1m"`, `"5h"`, `"1h 30m"`).
pub fn parse_duration(name: &str, raw: &Value) -> Result<Duration> {
    let invalid = || Error::validation(format!("field '{}' is not a valid duration", name));

    match raw {
        Value::Null => Ok(Duration::ZERO),
        Value::Number(n) => n.as_u64().map(Duration::from_secs).ok_or_else(invalid),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(Duration::ZERO);
            }
            if let Ok(secs) = s.parse::<u64>() {
                return Ok(Duration::from_secs(secs));
            }
            humantime::parse_duration(s).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

/// Schema for a single field
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub field_type: FieldType,
    pub description: &'static str,
    pub required: bool,
    /// Human-readable name for UIs
    pub display_name: Option<&'static str>,
    /// Value must be masked by UIs
    pub sensitive: bool,
}

impl FieldSchema {
    pub fn new(field_type: FieldType, description: &'static str) -> Self {
        Self { field_type, description, required: false, display_name: None, sensitive: false }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn display(mut self, name: &'static str) -> Self {
        self.display_name = Some(name);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// A parsed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    StringSlice(Vec<String>),
    Duration(Duration),
}

impl FieldValue {
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_string_slice(self) -> Option<Vec<String>> {
        match self {
            Self::StringSlice(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

/// Request data bound to the schema of the matched path.
#[derive(Debug, Clone, Default)]
pub struct FieldData {
    raw: Map<String, Value>,
    schema: Arc<HashMap<String, FieldSchema>>,
}

impl FieldData {
    pub fn new(raw: Map<String, Value>, schema: Arc<HashMap<String, FieldSchema>>) -> Self {
        Self { raw, schema }
    }

    /// Parse every supplied field that the schema knows about.
    ///
    /// Fields outside the schema are ignored.
    pub fn validate(&self) -> Result<()> {
        for (name, raw) in &self.raw {
            if let Some(schema) = self.schema.get(name) {
                schema.field_type.parse(name, raw)?;
            }
        }
        Ok(())
    }

    /// The parsed value if the field was supplied, `None` otherwise
    pub fn get_ok(&self, name: &str) -> Result<Option<FieldValue>> {
        let schema = self.schema_for(name)?;
        match self.raw.get(name) {
            Some(raw) => schema.field_type.parse(name, raw).map(Some),
            None => Ok(None),
        }
    }

    /// The parsed value, or the type's zero value when not supplied
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        let schema = self.schema_for(name)?;
        match self.raw.get(name) {
            Some(raw) => schema.field_type.parse(name, raw),
            None => Ok(schema.field_type.zero_value()),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        self.get(name)?.into_string().ok_or_else(|| self.type_mismatch(name))
    }

    pub fn get_ok_string(&self, name: &str) -> Result<Option<String>> {
        self.get_ok(name)?
            .map(|v| v.into_string().ok_or_else(|| self.type_mismatch(name)))
            .transpose()
    }

    pub fn get_ok_string_slice(&self, name: &str) -> Result<Option<Vec<String>>> {
        self.get_ok(name)?
            .map(|v| v.into_string_slice().ok_or_else(|| self.type_mismatch(name)))
            .transpose()
    }

    pub fn get_ok_duration(&self, name: &str) -> Result<Option<Duration>> {
        self.get_ok(name)?
            .map(|v| v.as_duration().ok_or_else(|| self.type_mismatch(name)))
            .transpose()
    }

    fn schema_for(&self, name: &str) -> Result<&FieldSchema> {
        self.schema
            .get(name)
            .ok_or_else(|| Error::internal(format!("field '{}' is not declared in the schema", name)))
    }

    fn type_mismatch(&self, name: &str) -> Error {
        Error::internal(format!("field '{}' was read with the wrong type", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(raw: Value) -> FieldData {
        let mut schema = HashMap::new();
        schema.insert("name".to_string(), FieldSchema::new(FieldType::LowerCaseString, "name"));
        schema.insert("scopes".to_string(), FieldSchema::new(FieldType::CommaStringSlice, "scopes"));
        schema.insert("ttl".to_string(), FieldSchema::new(FieldType::DurationSecond, "ttl"));
        schema.insert("api_key".to_string(), FieldSchema::new(FieldType::String, "key"));

        let raw = match raw {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        FieldData::new(raw, Arc::new(schema))
    }

    #[test]
    fn test_get_ok_distinguishes_missing_fields() {
        let d = data(json!({ "name": "CI-Role" }));

        assert_eq!(d.get_ok_string("name").unwrap(), Some("ci-role".to_string()));
        assert_eq!(d.get_ok_duration("ttl").unwrap(), None);
        assert_eq!(d.get("ttl").unwrap(), FieldValue::Duration(Duration::ZERO));
        assert_eq!(d.get_string("api_key").unwrap(), "");
    }

    #[test]
    fn test_comma_string_slice_accepts_both_forms() {
        let from_string = data(json!({ "scopes": "incident_read, usage_read,," }));
        let from_array = data(json!({ "scopes": ["incident_read", "usage_read"] }));

        let expected = Some(vec!["incident_read".to_string(), "usage_read".to_string()]);
        assert_eq!(from_string.get_ok_string_slice("scopes").unwrap(), expected);
        assert_eq!(from_array.get_ok_string_slice("scopes").unwrap(), expected);
    }

    #[test]
    fn test_duration_forms() {
        assert_eq!(parse_duration("ttl", &json!(120)).unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("ttl", &json!("3600")).unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("ttl", &json!("1m")).unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("ttl", &json!("5h")).unwrap(), Duration::from_secs(18000));
        assert_eq!(parse_duration("ttl", &json!("")).unwrap(), Duration::ZERO);

        assert!(parse_duration("ttl", &json!(-5)).is_err());
        assert!(parse_duration("ttl", &json!("soon")).is_err());
        assert!(parse_duration("ttl", &json!(["1m"])).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_types_and_ignores_unknown_fields() {
        assert!(data(json!({ "ttl": "forever" })).validate().is_err());
        assert!(data(json!({ "scopes": { "a": 1 } })).validate().is_err());
        assert!(data(json!({ "unknown": { "nested": true } })).validate().is_ok());
    }

    #[test]
    fn test_undeclared_field_is_an_internal_error() {
        let err = data(json!({})).get("missing").unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
