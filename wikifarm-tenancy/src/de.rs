//! Lenient decoders for values written by the cache rebuild job and the
//! backing store, which emit loosely-typed JSON (`0`/`1` flags, `[]` for
//! empty objects, sparse lists encoded as objects).

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Truthiness of a scalar, or `None` for arrays and objects
pub(crate) fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => Some(!(s.is_empty() || s == "0")),
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    truthy(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a boolean flag, found {}", value)))
}

/// `null`, `false` and `""` all mean "unset"
pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(de::Error::custom(format!(
            "expected a string or null, found {}",
            other
        ))),
    }
}

/// A list of strings, accepting `null` and objects (values taken in key order)
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => {
            return Err(de::Error::custom(format!(
                "expected a list of strings, found {}",
                other
            )));
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(de::Error::custom(format!(
                "expected a string list entry, found {}",
                other
            ))),
        })
        .collect()
}

/// An object keyed by string, also accepting `null` and the empty list `[]`
pub(crate) fn keyed_map<'de, D, T>(deserializer: D) -> Result<Option<BTreeMap<String, T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(Some(BTreeMap::new())),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| {
                serde_json::from_value(v)
                    .map(|v| (k.clone(), v))
                    .map_err(|e| de::Error::custom(format!("{}: {}", k, e)))
            })
            .collect::<Result<_, _>>()
            .map(Some),
        other => Err(de::Error::custom(format!(
            "expected an object, found {}",
            other
        ))),
    }
}

/// Namespace ids arrive as integers or numeric strings
pub(crate) fn namespace_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("namespace id out of range: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("invalid namespace id: {:?}", s))),
        other => Err(de::Error::custom(format!(
            "expected a namespace id, found {}",
            other
        ))),
    }
}
