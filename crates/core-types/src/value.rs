use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// A single cell of a result set, or a single bound parameter.
///
/// The shape of an ad-hoc result is only known once the statement has run, so
/// every cell carries its own type tag instead of living in a fixed struct.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact amounts from `NUMERIC` columns (payments, rental rates).
    Decimal(Decimal),
    Text(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Converts a JSON value into a bindable scalar. `name` is only used for
    /// the error message.
    pub fn from_json(name: &str, value: JsonValue) -> Result<Self, CoreError> {
        match value {
            JsonValue::Null => Ok(ScalarValue::Null),
            JsonValue::Bool(b) => Ok(ScalarValue::Bool(b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ScalarValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(ScalarValue::Float(f))
                } else {
                    Err(CoreError::InvalidInput(name.to_string(), n.to_string()))
                }
            }
            JsonValue::String(s) => Ok(ScalarValue::Text(s)),
            JsonValue::Array(_) | JsonValue::Object(_) => {
                Err(CoreError::UnsupportedValue(name.to_string()))
            }
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Null => serializer.serialize_unit(),
            ScalarValue::Bool(b) => serializer.serialize_bool(*b),
            ScalarValue::Int(i) => serializer.serialize_i64(*i),
            ScalarValue::Float(f) => serializer.serialize_f64(*f),
            ScalarValue::Decimal(d) => rust_decimal::serde::float::serialize(d, serializer),
            ScalarValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        ScalarValue::from_json("parameter", value).map_err(D::Error::custom)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("NULL"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Int(i) => write!(f, "{i}"),
            ScalarValue::Float(v) => write!(f, "{v}"),
            ScalarValue::Decimal(d) => write!(f, "{d}"),
            ScalarValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int(i64::from(value))
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<Decimal> for ScalarValue {
    fn from(value: Decimal) -> Self {
        ScalarValue::Decimal(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ScalarValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn decimals_serialize_as_json_numbers() {
        let json = serde_json::to_value(ScalarValue::Decimal(dec!(211.55))).unwrap();
        assert_eq!(json, json!(211.55));
    }

    #[test]
    fn parameters_deserialize_from_json_scalars() {
        let params: HashMap<String, ScalarValue> = serde_json::from_value(json!({
            "limit": 5,
            "ratio": 0.5,
            "title": "%CHOCOLAT%",
            "active": true,
            "missing": null
        }))
        .unwrap();

        assert_eq!(params["limit"], ScalarValue::Int(5));
        assert_eq!(params["ratio"], ScalarValue::Float(0.5));
        assert_eq!(params["title"], ScalarValue::Text("%CHOCOLAT%".into()));
        assert_eq!(params["active"], ScalarValue::Bool(true));
        assert!(params["missing"].is_null());
    }

    #[test]
    fn nested_parameters_are_rejected() {
        let err = serde_json::from_value::<HashMap<String, ScalarValue>>(json!({ "ids": [1, 2] }));
        assert!(err.is_err());

        let err = ScalarValue::from_json("ids", json!({ "a": 1 })).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedValue(name) if name == "ids"));
    }

    #[test]
    fn options_map_to_null() {
        assert_eq!(ScalarValue::from(None::<i64>), ScalarValue::Null);
        assert_eq!(ScalarValue::from(Some("x")), ScalarValue::Text("x".into()));
    }
}
