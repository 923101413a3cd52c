//! Setting Values
//!
//! The settings schema is open-ended: extensions contribute arbitrary keys
//! through the cache documents, so values are a tagged variant rather than
//! a fixed struct.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One materialized setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<SettingValue>),
    Map(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SettingValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SettingValue]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, SettingValue>> {
        match self {
            SettingValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Nested lookup through maps
    ///
    /// # Examples
    ///
    /// ```
    /// use wikifarm_tenancy::SettingValue;
    ///
    /// let value = SettingValue::from(serde_json::json!({"sysop": {"delete": true}}));
    /// assert_eq!(value.pointer(&["sysop", "delete"]), Some(&SettingValue::Bool(true)));
    /// assert_eq!(value.pointer(&["user", "delete"]), None);
    /// ```
    pub fn pointer(&self, path: &[&str]) -> Option<&SettingValue> {
        path.iter()
            .try_fold(self, |current, key| current.as_map()?.get(*key))
    }

    /// Turn this value into a map unless it already is one
    ///
    /// A list becomes a map keyed by position (`"0"`, `"1"`, ...). Scalars
    /// are replaced by an empty map.
    pub(crate) fn ensure_map(&mut self) -> &mut BTreeMap<String, SettingValue> {
        match self {
            SettingValue::Map(_) => {}
            SettingValue::List(items) => {
                let map = std::mem::take(items)
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item))
                    .collect();
                *self = SettingValue::Map(map);
            }
            _ => *self = SettingValue::Map(BTreeMap::new()),
        }
        let SettingValue::Map(map) = self else {
            unreachable!("value was just replaced with a map")
        };
        map
    }

    /// Turn this value into a list unless it already is one
    ///
    /// A map keeps its values in key order. Scalars are replaced by an empty
    /// list.
    pub(crate) fn ensure_list(&mut self) -> &mut Vec<SettingValue> {
        match self {
            SettingValue::List(_) => {}
            SettingValue::Map(map) => {
                let items = std::mem::take(map).into_values().collect();
                *self = SettingValue::List(items);
            }
            _ => *self = SettingValue::List(Vec::new()),
        }
        let SettingValue::List(items) = self else {
            unreachable!("value was just replaced with a list")
        };
        items
    }

    /// Render as plain JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.clone())
    }
}

/// Append `value` unless an equal entry is already present
pub(crate) fn push_unique(list: &mut Vec<SettingValue>, value: SettingValue) -> bool {
    if list.contains(&value) {
        return false;
    }
    list.push(value);
    true
}

impl From<serde_json::Value> for SettingValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => SettingValue::Null,
            Value::Bool(b) => SettingValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SettingValue::Int(i),
                None => n.as_f64().map_or(SettingValue::Null, SettingValue::Float),
            },
            Value::String(s) => SettingValue::String(s),
            Value::Array(items) => {
                SettingValue::List(items.into_iter().map(SettingValue::from).collect())
            }
            Value::Object(map) => SettingValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, SettingValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<SettingValue> for serde_json::Value {
    fn from(value: SettingValue) -> Self {
        use serde_json::Value;

        match value {
            SettingValue::Null => Value::Null,
            SettingValue::Bool(b) => Value::Bool(b),
            SettingValue::Int(i) => Value::from(i),
            SettingValue::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
            SettingValue::String(s) => Value::String(s),
            SettingValue::List(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            SettingValue::Map(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Int(i)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::String(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::String(s)
    }
}

impl<T: Into<SettingValue>> From<Vec<T>> for SettingValue {
    fn from(items: Vec<T>) -> Self {
        SettingValue::List(items.into_iter().map(Into::into).collect())
    }
}
