//! Record filters sent as the `filter` query parameter.
//!
//! Grist expects a JSON object mapping column ids to the list of allowed
//! values, e.g. `{"id": [1, 2]}`. The client treats the filter as opaque
//! JSON text: whatever the caller supplies is sent byte-for-byte.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// JSON text of a record filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter(String);

impl Filter {
    /// Use `json` exactly as given. No validation is performed.
    pub fn raw(json: impl Into<String>) -> Self {
        Filter(json.into())
    }

    /// Encode any serializable value as the filter.
    pub fn from_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Filter(serde_json::to_string(value)?))
    }

    /// Filter allowing `values` for the column `field`.
    pub fn by_field<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut map = Map::new();
        map.insert(field.to_string(), collect(values));
        Filter(Value::Object(map).to_string())
    }

    /// Add another column constraint. A raw filter that is not a JSON object
    /// is replaced by the new constraint.
    pub fn and_field<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut map = match serde_json::from_str::<Value>(&self.0) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        map.insert(field.to_string(), collect(values));
        Filter(Value::Object(map).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn collect<I, V>(values: I) -> Value
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Value::Array(values.into_iter().map(Into::into).collect())
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        Filter(value.to_string())
    }
}
