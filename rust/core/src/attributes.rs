// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loosely-typed attribute bags
//!
//! Authoring tools attach metadata in several shapes: plain key/value maps,
//! arrays of `[key, value]` pairs or `{key, value}` objects, and nested
//! user-text containers. [`AttributeBag`] keeps whatever the decoder found and
//! answers case-insensitive lookups across all of those shapes.

use serde_json::Value;

/// Container keys whose contents are searched as nested user text
pub const USER_TEXT_CONTAINERS: &[&str] = &[
    "userStrings",
    "user_strings",
    "userText",
    "user_text",
    "userData",
    "user_data",
];

/// A single attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<AttributeValue>),
    Map(AttributeBag),
}

impl AttributeValue {
    /// Non-empty trimmed text. Integral numbers are rendered without a fraction.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            AttributeValue::Number(n) if n.is_finite() => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            _ => None,
        }
    }

    /// Non-negative integer, from a number or numeric text
    pub fn as_index(&self) -> Option<usize> {
        match self {
            AttributeValue::Number(n) if n.is_finite() && *n >= 0.0 && n.fract() == 0.0 => {
                Some(*n as usize)
            }
            AttributeValue::Text(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&AttributeBag> {
        match self {
            AttributeValue::Map(bag) => Some(bag),
            _ => None,
        }
    }
}

impl From<&Value> for AttributeValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(AttributeValue::Number)
                .unwrap_or(AttributeValue::Null),
            Value::String(s) => AttributeValue::Text(s.clone()),
            Value::Array(items) => AttributeValue::List(items.iter().map(Into::into).collect()),
            Value::Object(_) => AttributeValue::Map(AttributeBag::from_json(value)),
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        AttributeValue::from(&value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

/// Ordered key/value attribute map with case-insensitive lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBag {
    entries: Vec<(String, AttributeValue)>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object; anything else gives an empty bag
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self {
                entries: map
                    .iter()
                    .map(|(k, v)| (k.clone(), AttributeValue::from(v)))
                    .collect(),
            },
            _ => Self::default(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Direct lookup, case-insensitive; first match wins
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Lookup inside any list of key/value pairs held by this bag
    pub fn get_in_pairs(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.iter().find_map(|(_, value)| match value {
            AttributeValue::List(items) => items.iter().find_map(|item| pair_value(item, key)),
            _ => None,
        })
    }

    /// Lookup inside nested user-text containers
    pub fn get_nested(&self, key: &str) -> Option<&AttributeValue> {
        USER_TEXT_CONTAINERS.iter().find_map(|container| {
            let nested = self.get(container)?;
            match nested {
                AttributeValue::Map(bag) => bag.get(key).or_else(|| bag.get_in_pairs(key)),
                AttributeValue::List(items) => items.iter().find_map(|item| pair_value(item, key)),
                _ => None,
            }
        })
    }

    /// All access shapes for a single key, in priority order
    pub fn lookup(&self, key: &str) -> impl Iterator<Item = &AttributeValue> {
        [self.get(key), self.get_in_pairs(key), self.get_nested(key)]
            .into_iter()
            .flatten()
    }

    /// First non-empty text for any of `keys`, tried in order
    pub fn find_text(&self, keys: &[impl AsRef<str>]) -> Option<String> {
        keys.iter()
            .find_map(|key| self.lookup(key.as_ref()).find_map(AttributeValue::as_text))
    }

    /// First non-negative integer for any of `keys`, tried in order
    pub fn find_index(&self, keys: &[impl AsRef<str>]) -> Option<usize> {
        keys.iter()
            .find_map(|key| self.lookup(key.as_ref()).find_map(AttributeValue::as_index))
    }
}

/// Match one element of a pair list: `[key, value]` or `{key|name: .., value: ..}`
fn pair_value<'a>(item: &'a AttributeValue, key: &str) -> Option<&'a AttributeValue> {
    match item {
        AttributeValue::List(pair) if pair.len() == 2 => match &pair[0] {
            AttributeValue::Text(k) if k.trim().eq_ignore_ascii_case(key) => Some(&pair[1]),
            _ => None,
        },
        AttributeValue::Map(bag) => {
            let name = bag.get("key").or_else(|| bag.get("name"))?;
            match name {
                AttributeValue::Text(k) if k.trim().eq_ignore_ascii_case(key) => bag.get("value"),
                _ => None,
            }
        }
        _ => None,
    }
}

/// The three places a mesh's metadata can live, searched in this order
#[derive(Debug, Clone, Copy)]
pub struct AttributeSources<'a> {
    pub object: &'a AttributeBag,
    pub geometry: &'a AttributeBag,
    pub node: &'a AttributeBag,
}

impl<'a> AttributeSources<'a> {
    pub fn resolve_text(&self, keys: &[impl AsRef<str>]) -> Option<String> {
        self.object
            .find_text(keys)
            .or_else(|| self.geometry.find_text(keys))
            .or_else(|| self.node.find_text(keys))
    }

    pub fn resolve_index(&self, keys: &[impl AsRef<str>]) -> Option<usize> {
        self.object
            .find_index(keys)
            .or_else(|| self.geometry.find_index(keys))
            .or_else(|| self.node.find_index(keys))
    }
}
