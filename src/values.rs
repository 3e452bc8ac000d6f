/*
 *  values.rs
 *
 *  InkMonS - data on slow glass
 *	(c) 2023-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A single data-channel reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Parse a raw payload. Numeric payloads become `Number`, everything
    /// else stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    /// Convert a JSON leaf into a value; `Null` carries no reading.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::String(s) => Some(Value::parse(s)),
            serde_json::Value::Bool(b) => Some(Value::Text(b.to_string())),
            other => Some(Value::Text(other.to_string())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The value mapping shared between the data source (writer) and the
/// render loop (reader). Last write wins per key; no history is kept.
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    map: HashMap<String, Value>,
    revision: u64,
}

/// Guarded handle to the one store both sides work against. The lock is
/// only ever held for an insert or a snapshot clone, never across awaits.
pub type SharedValues = Arc<Mutex<ValueStore>>;

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedValues {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.map.insert(key.to_string(), value);
        self.revision += 1;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefers_numbers() {
        assert_eq!(Value::parse("21.37"), Value::Number(21.37));
        assert_eq!(Value::parse(" 42 "), Value::Number(42.0));
        assert_eq!(Value::parse("charging"), Value::Text("charging".into()));
        assert_eq!(Value::parse("NaN"), Value::Text("NaN".into()));
    }

    #[test]
    fn last_write_wins() {
        let mut store = ValueStore::new();
        store.insert("battery/load", Value::Number(80.0));
        store.insert("battery/load", Value::Number(81.0));

        assert_eq!(store.get("battery/load"), Some(&Value::Number(81.0)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn json_leaves_convert() {
        assert_eq!(
            Value::from_json(&serde_json::json!(12.5)),
            Some(Value::Number(12.5))
        );
        assert_eq!(
            Value::from_json(&serde_json::json!("13.5")),
            Some(Value::Number(13.5))
        );
        assert_eq!(
            Value::from_json(&serde_json::json!("idle")),
            Some(Value::Text("idle".into()))
        );
        assert_eq!(Value::from_json(&serde_json::Value::Null), None);
    }
}
