//! Generic documents and paths for the shared keyed store
//!
//! The store never interprets what it holds: a document is a flat map of
//! named fields, and a path is always `<collection>/<key>`. Typed records
//! such as players and coins convert to and from documents at the edges.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single field value inside a document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` has the wrong type")]
    WrongType(&'static str),
    #[error("field `{field}` has invalid value `{value}`")]
    InvalidValue { field: &'static str, value: String },
}

/// Flat field map stored at a single path
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Document(BTreeMap<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert, used when assembling documents and patches
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn int(&self, field: &'static str) -> Result<i64, DocumentError> {
        match self.0.get(field) {
            Some(Value::Int(v)) => Ok(*v),
            Some(_) => Err(DocumentError::WrongType(field)),
            None => Err(DocumentError::MissingField(field)),
        }
    }

    pub fn text(&self, field: &'static str) -> Result<&str, DocumentError> {
        match self.0.get(field) {
            Some(Value::Text(v)) => Ok(v),
            Some(_) => Err(DocumentError::WrongType(field)),
            None => Err(DocumentError::MissingField(field)),
        }
    }

    /// Keeps only the fields for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.0.retain(|field, value| keep(field, value));
    }

    /// Overwrites every field present in `fields`, leaving the rest untouched
    pub fn merge(&mut self, fields: Document) {
        self.0.extend(fields.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path `{0}` must have the form <collection>/<key>")]
    Malformed(String),
}

/// Location of one document: `<collection>/<key>`
///
/// Encoded on the wire as its string form, so a malformed path from a peer
/// fails to decode instead of reaching the store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    pub collection: String,
    pub key: String,
}

impl Path {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.key)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((collection, key))
                if !collection.is_empty() && !key.is_empty() && !key.contains('/') =>
            {
                Ok(Path::new(collection, key))
            }
            _ => Err(PathError::Malformed(s.to_string())),
        }
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}
