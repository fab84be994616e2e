//! Open metadata bag attached to every observation
//!
//! Stages annotate observations through an extensible string-keyed map.
//! Keys are not declared in advance; any stage may read or write any key.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Ordered map from annotation key to value
pub type Metadata = BTreeMap<String, MetaValue>;

/// A metadata annotation value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
    /// Timestamp value (naive; EXIF dates carry no timezone)
    Timestamp(NaiveDateTime),
    /// Ordered list of values
    List(Vec<MetaValue>),
}

impl MetaValue {
    /// Interpret as a boolean, if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Interpret as an integer, if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret as a float, if this is a `Float`
    pub fn as_float(&self) -> Option<f64> {
        match self {
            MetaValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Interpret as text, if this is a `Text`
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as a timestamp, if this is a `Timestamp`
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            MetaValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Interpret as a list, if this is a `List`
    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<u32> for MetaValue {
    fn from(v: u32) -> Self {
        MetaValue::Int(i64::from(v))
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

impl From<NaiveDateTime> for MetaValue {
    fn from(v: NaiveDateTime) -> Self {
        MetaValue::Timestamp(v)
    }
}
