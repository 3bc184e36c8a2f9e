//! Insertion-ordered document model for the generated descriptor
//!
//! `OrderedMap` keeps its entries in a `Vec` and resolves keys through an
//! `AHashMap` index, the same layout the registry types use for O(1) lookup.
//! Re-inserting a key replaces the value in place, so the first insertion
//! decides where a key shows up in the serialized output.

use ahash::AHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// The assembled `plugin.yml` mapping
pub type ManifestDocument = OrderedMap<Value>;

/// A heterogeneous document value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bool(bool),
    List(Vec<String>),
    Map(OrderedMap<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OrderedMap<Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::List(value)
    }
}

impl From<OrderedMap<Value>> for Value {
    fn from(value: OrderedMap<Value>) -> Self {
        Value::Map(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::List(items) => items.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

/// Insertion-ordered map with unique string keys
#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    entries: Vec<(Arc<str>, V)>,
    index: AHashMap<Arc<str>, usize>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    ///
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        if let Some(&idx) = self.index.get(key) {
            return Some(std::mem::replace(&mut self.entries[idx].1, value));
        }
        let key: Arc<str> = Arc::from(key);
        self.index.insert(Arc::clone(&key), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Merge every entry of `other` into `self`, in `other`'s order.
    /// Colliding keys take `other`'s value.
    pub fn extend(&mut self, other: OrderedMap<V>) {
        for (key, value) in other.entries {
            self.insert(&key, value);
        }
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }
}

impl<V: PartialEq> PartialEq for OrderedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key.as_ref(), value)?;
        }
        map.end()
    }
}

impl<'a, V> FromIterator<(&'a str, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (&'a str, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}
