//! Parameter values and the name -> value map handed to dispatch targets.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::error::TypeCoercionError;
use super::option::OptionType;

/// A typed parameter value.
///
/// Choice options store their selected value as [`ParamValue::Str`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl ParamValue {
    /// The string, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The flag, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The items, if this is a `List`.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this variant is the storage form for `kind`.
    pub fn matches(&self, kind: OptionType) -> bool {
        matches!(
            (self, kind),
            (Self::Str(_), OptionType::String | OptionType::Choice)
                | (Self::Int(_), OptionType::Integer)
                | (Self::Bool(_), OptionType::Boolean)
                | (Self::List(_), OptionType::List)
        )
    }

    /// Convert a TOML value from a config file.
    ///
    /// Only strings, integers, booleans and arrays of strings have a
    /// parameter representation; anything else returns `None`.
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::String(s) => Some(Self::Str(s.clone())),
            toml::Value::Integer(n) => Some(Self::Int(*n)),
            toml::Value::Boolean(b) => Some(Self::Bool(*b)),
            toml::Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_owned).collect())
    }
}

/// Option name -> value.
///
/// Produced by [`super::CommandParser`] (always fully populated) and also
/// used to carry inherited context into a parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context map from a TOML table.
    pub fn from_toml(table: &toml::Table) -> Result<Self, TypeCoercionError> {
        let mut params = Self::new();
        for (key, value) in table {
            let converted = ParamValue::from_toml(value).ok_or_else(|| {
                TypeCoercionError::new(
                    key.as_str(),
                    value.to_string(),
                    "unsupported config value (expected string, integer, boolean or string array)",
                )
            })?;
            params.insert(key.as_str(), converted);
        }
        Ok(params)
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name`, returning the value it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Return the value for `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Return `name` as a string, if it holds one.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Return `name` as an integer, if it holds one.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    /// Return `name` as a boolean, if it holds one.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    /// Return `name` as a list, if it holds one.
    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ParamValue::as_list)
    }

    /// Whether `name` has a value.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Overlay every value of `other` onto `self`.
    pub fn extend(&mut self, other: &Params) {
        for (name, value) in other.iter() {
            self.0.insert(name.to_owned(), value.clone());
        }
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Return the number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no values are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
