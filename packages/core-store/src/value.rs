//! The PropertyValue type - a tree of typed scalars and collections.
//!
//! Every plist-shaped unit in a font package (fontinfo, groups, kerning,
//! lib, glyph lib, contents maps) is decoded into this tree.

use indexmap::IndexMap;

use crate::Error;

/// Insertion-ordered dictionary with unique string keys.
pub type Dict = IndexMap<String, PropertyValue>;

/// A property tree node.
///
/// # Design Notes
///
/// - `Dict` keeps document order so a decode/encode cycle is stable
/// - There is no null: absent values are simply not stored
/// - `Integer` and `Real` stay distinct so `1` and `1.0` survive a round trip
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Dict(Dict),
    List(Vec<PropertyValue>),
    String(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl Default for PropertyValue {
    fn default() -> Self {
        PropertyValue::Dict(Dict::new())
    }
}

impl PropertyValue {
    /// Create an empty dictionary.
    pub fn dict() -> Self {
        PropertyValue::Dict(Dict::new())
    }

    /// Create an empty list.
    pub fn list() -> Self {
        PropertyValue::List(Vec::new())
    }

    /// Name of the variant, as used in plist tags and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Dict(_) => "dict",
            PropertyValue::List(_) => "array",
            PropertyValue::String(_) => "string",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Real(_) => "real",
            PropertyValue::Bool(_) => "bool",
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            PropertyValue::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key in a dictionary node.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.as_dict()?.get(key)
    }

    /// Take the dictionary out of a node, failing for any other variant.
    pub fn into_dict(self) -> Result<Dict, Error> {
        match self {
            PropertyValue::Dict(d) => Ok(d),
            other => Err(Error::InvalidRootType {
                expected: "dict",
                found: other.type_name(),
            }),
        }
    }

    /// Convert from a JSON value.
    ///
    /// Object members that are `null` are dropped. A `null` root or list
    /// item has no property-tree form and is rejected, as are numbers that
    /// fit neither `i64` nor `f64`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, Error> {
        use serde_json::Value as Json;

        Ok(match value {
            Json::Null => return Err(Error::malformed("null has no property-tree form")),
            Json::Bool(b) => PropertyValue::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropertyValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    PropertyValue::Real(f)
                } else {
                    return Err(Error::InvalidNumber {
                        text: n.to_string(),
                    });
                }
            }
            Json::String(s) => PropertyValue::String(s.clone()),
            Json::Array(items) => PropertyValue::List(
                items
                    .iter()
                    .map(PropertyValue::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(map) => {
                let mut dict = Dict::with_capacity(map.len());
                for (key, item) in map {
                    if item.is_null() {
                        continue;
                    }
                    dict.insert(key.clone(), PropertyValue::from_json(item)?);
                }
                PropertyValue::Dict(dict)
            }
        })
    }

    /// Convert to a JSON value. Non-finite reals become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            PropertyValue::Dict(d) => Json::Object(
                d.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            PropertyValue::List(l) => Json::Array(l.iter().map(PropertyValue::to_json).collect()),
            PropertyValue::String(s) => Json::String(s.clone()),
            PropertyValue::Integer(i) => Json::from(*i),
            PropertyValue::Real(r) => serde_json::Number::from_f64(*r)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            PropertyValue::Bool(b) => Json::Bool(*b),
        }
    }
}

// Conversion from common types

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Integer(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Real(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<Dict> for PropertyValue {
    fn from(v: Dict) -> Self {
        PropertyValue::Dict(v)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(v: Vec<T>) -> Self {
        PropertyValue::List(v.into_iter().map(Into::into).collect())
    }
}
