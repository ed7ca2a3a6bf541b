//! A module for working with node and edge attributes.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

/// An open-ended set of named attributes carried by a node or an edge.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Edge length, required by the feature engineering step.
pub const LENGTH: &str = "length";
/// Speed limit, normalized to a single number by the feature engineering step.
pub const MAXSPEED: &str = "maxspeed";
/// Derived edge weight, `length / maxspeed`.
pub const TRAVEL_TIME: &str = "travel_time";
/// Road name, text or a list of texts.
pub const NAME: &str = "name";
/// Road reference number (e.g. `A4`), text or a list of texts.
pub const REF: &str = "ref";
/// Score written by the centrality evaluator.
pub const CENTRALITY: &str = "centrality";

/// A single attribute value.
///
/// Street network providers emit loosely typed attributes: a speed limit can be a number, a
/// string, a list of either or even a mapping keyed by direction. The variants cover those shapes
/// without giving up on types altogether.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
    Numbers(Vec<f64>),
    Texts(Vec<String>),
    Flag(bool),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Returns the value if it is a number.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::attr::AttrValue;
    ///
    /// assert_eq!(AttrValue::Number(2.5).as_number(), Some(2.5));
    /// assert_eq!(AttrValue::from("2.5").as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value if it is a single piece of text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(value: Vec<f64>) -> Self {
        AttrValue::Numbers(value)
    }
}

impl From<Vec<&str>> for AttrValue {
    fn from(value: Vec<&str>) -> Self {
        AttrValue::Texts(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

/// Converts a JSON value into an attribute, `Ok(None)` is returned for `null`.
///
/// Lists mixing numbers and text are kept as text so that no item is lost; nested lists have no
/// representation and are rejected.
pub(crate) fn from_json(value: Value) -> Result<Option<AttrValue>, Error> {
    let attr = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => AttrValue::Flag(b),
        Value::Number(n) => AttrValue::Number(
            n.as_f64()
                .ok_or_else(|| Error::Load(format!("number {n} out of range")))?,
        ),
        Value::String(s) => AttrValue::Text(s),
        Value::Array(items) => {
            if items.iter().all(Value::is_number) {
                AttrValue::Numbers(items.iter().filter_map(Value::as_f64).collect())
            } else {
                let texts = items
                    .into_iter()
                    .filter(|item| !item.is_null())
                    .map(|item| match item {
                        Value::String(s) => Ok(s),
                        Value::Number(n) => Ok(n.to_string()),
                        Value::Bool(b) => Ok(b.to_string()),
                        other => Err(Error::Load(format!("unsupported list item {other}"))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                AttrValue::Texts(texts)
            }
        }
        Value::Object(fields) => {
            let mut map = BTreeMap::new();
            for (k, v) in fields {
                if let Some(attr) = from_json(v)? {
                    map.insert(k, attr);
                }
            }
            AttrValue::Map(map)
        }
    };

    Ok(Some(attr))
}
