//! Lenient deserializers.
//!
//! Multipart forms and query strings deliver every value as text, while JSON
//! bodies carry real numbers, booleans and arrays. These helpers accept
//! either shape so one DTO serves both content types. Empty strings count as
//! absent.

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

fn non_empty(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        other => other,
    }
}

fn to_f64<E: Error>(value: Value) -> Result<f64, E> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| E::custom("expected a finite number")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| E::custom(format!("invalid number: {}", s))),
        other => Err(E::custom(format!("expected a number, got {}", other))),
    }
}

fn to_bool<E: Error>(value: Value) -> Result<bool, E> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(E::custom(format!("invalid boolean: {}", s))),
        },
        other => Err(E::custom(format!("expected a boolean, got {}", other))),
    }
}

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(Option::deserialize(deserializer)?) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected an integer")),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!("expected an integer, got {}", other))),
    }
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(Option::deserialize(deserializer)?) {
        None => Ok(None),
        Some(Value::String(s)) => Uuid::parse_str(s.trim()).map(Some).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!("expected a UUID, got {}", other))),
    }
}

pub fn deserialize_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    to_f64(Value::deserialize(deserializer)?)
}

pub fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    non_empty(Option::deserialize(deserializer)?)
        .map(to_f64)
        .transpose()
}

pub fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    to_bool(Value::deserialize(deserializer)?)
}

pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    non_empty(Option::deserialize(deserializer)?)
        .map(to_bool)
        .transpose()
}

/// Accepts a JSON value of `T`, or a string holding the JSON text of `T`.
pub fn deserialize_json_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => serde_json::from_str(&text).map_err(D::Error::custom),
        other => serde_json::from_value(other).map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(deserialize_with = "deserialize_f64")]
        price: f64,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        published: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        owner: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_json_or_string")]
        tags: Vec<String>,
    }

    #[test]
    fn test_form_text_values() {
        let form: Form = serde_json::from_value(json!({
            "price": "49.5",
            "published": "false",
            "owner": "",
            "tags": "[\"rust\",\"web\"]"
        }))
        .unwrap();

        assert_eq!(form.price, 49.5);
        assert_eq!(form.published, Some(false));
        assert_eq!(form.owner, None);
        assert_eq!(form.tags, vec!["rust", "web"]);
    }

    #[test]
    fn test_json_native_values() {
        let form: Form = serde_json::from_value(json!({
            "price": 10,
            "published": true,
            "tags": ["a"]
        }))
        .unwrap();

        assert_eq!(form.price, 10.0);
        assert_eq!(form.published, Some(true));
        assert_eq!(form.tags, vec!["a"]);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_value::<Form>(json!({"price": "ten"})).is_err());
        assert!(serde_json::from_value::<Form>(json!({"price": 1, "tags": "[oops"})).is_err());
        assert!(serde_json::from_value::<Form>(json!({"price": 1, "published": "maybe"})).is_err());
    }
}
