//! Conversions between raw document text and typed attribute values.
//!
//! A document only ever stores strings. Attributes declared with a [`Cast`]
//! are converted to a typed [`Value`] on first read and converted back to
//! text when the model is exported.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{ModelError, Result};

/// Declared conversion for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cast {
    /// Keep the raw text.
    #[default]
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// `true`/`false`, `1`/`0`, `yes`/`no` (case-insensitive).
    Boolean,
    /// The text is itself a JSON document.
    Json,
}

impl Cast {
    /// Converts raw document text into a typed value.
    ///
    /// `attribute` is only used to build the error.
    pub fn cast(self, attribute: &str, raw: &str) -> Result<Value> {
        let fail = || ModelError::Cast {
            attribute: attribute.to_string(),
            cast: self,
            value: raw.to_string(),
        };

        match self {
            Cast::String => Ok(Value::String(raw.to_string())),
            Cast::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| fail()),
            Cast::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(fail),
            Cast::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            Cast::Json => serde_json::from_str(raw).map_err(|_| fail()),
        }
    }

    /// Converts a typed value back into document text.
    ///
    /// Un-casting never fails: values written with a different shape than
    /// the declared cast are rendered by their own type.
    pub fn uncast(self, value: &Value) -> String {
        match (self, value) {
            (Cast::Json, Value::String(s)) => Value::String(s.clone()).to_string(),
            (_, value) => value_to_text(value),
        }
    }
}

impl fmt::Display for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cast::String => "string",
            Cast::Integer => "integer",
            Cast::Float => "float",
            Cast::Boolean => "boolean",
            Cast::Json => "json",
        };
        f.write_str(name)
    }
}

/// Default text form of a value.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cast_scalars() {
        assert_eq!(Cast::String.cast("a", " x ").unwrap(), json!(" x "));
        assert_eq!(Cast::Integer.cast("a", " 42").unwrap(), json!(42));
        assert_eq!(Cast::Float.cast("a", "2.5").unwrap(), json!(2.5));
        assert_eq!(Cast::Boolean.cast("a", "TRUE").unwrap(), json!(true));
        assert_eq!(Cast::Boolean.cast("a", "0").unwrap(), json!(false));
        assert_eq!(Cast::Json.cast("a", "[1,2]").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_cast_failures() {
        assert!(matches!(
            Cast::Integer.cast("age", "abc"),
            Err(ModelError::Cast { cast: Cast::Integer, .. })
        ));
        assert!(Cast::Float.cast("x", "NaN").is_err());
        assert!(Cast::Boolean.cast("x", "maybe").is_err());
        assert!(Cast::Json.cast("x", "{").is_err());
    }

    #[test]
    fn test_uncast() {
        assert_eq!(Cast::Integer.uncast(&json!(7)), "7");
        assert_eq!(Cast::Boolean.uncast(&json!(false)), "false");
        assert_eq!(Cast::String.uncast(&Value::Null), "");
        assert_eq!(Cast::String.uncast(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(Cast::Json.uncast(&json!("hi")), r#""hi""#);
    }
}
