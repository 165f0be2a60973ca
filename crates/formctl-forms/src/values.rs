//! Field values.
//!
//! Values are opaque to the controller: each field holds a
//! [`serde_json::Value`] and only that field's rule interprets it.
//! [`FormValues`] is the name → value map used for default values and for the
//! normalized values handed to the submit handler. It converts to and from
//! caller types through serde.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use formctl_core::{FormError, FormResult};

/// An ordered mapping from field name to value.
///
/// # Examples
///
/// ```
/// use formctl_forms::values::FormValues;
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct Contact {
///     message: String,
/// }
///
/// let values = FormValues::from_json(json!({ "message": "hello" })).unwrap();
/// let contact: Contact = values.parse().unwrap();
/// assert_eq!(contact.message, "hello");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, Value>);

impl FormValues {
    /// Creates an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds values from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::SerializationError`] if `json` is not an object.
    pub fn from_json(json: Value) -> FormResult<Self> {
        match json {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(FormError::SerializationError(format!(
                "form values must be a JSON object, got {other}"
            ))),
        }
    }

    /// Builds values from any serializable struct or map.
    pub fn from_serialize<T: Serialize>(value: &T) -> FormResult<Self> {
        Self::from_json(serde_json::to_value(value)?)
    }

    /// Deserializes the values into a caller type.
    pub fn parse<T: DeserializeOwned>(&self) -> FormResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }

    /// Returns the values as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Returns the value for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns `true` if a value exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over the field names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FormValues {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Signup {
        username: String,
        age: u32,
    }

    #[test]
    fn test_from_json_object() {
        let values = FormValues::from_json(json!({"a": 1, "b": "x"})).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("a"), Some(&json!(1)));
        assert!(values.contains("b"));
        assert!(!values.contains("c"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = FormValues::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, FormError::SerializationError(_)));
    }

    #[test]
    fn test_serialize_round_trip_through_caller_type() {
        let signup = Signup {
            username: "alice".into(),
            age: 30,
        };
        let values = FormValues::from_serialize(&signup).unwrap();
        assert_eq!(values.get("username"), Some(&json!("alice")));
        assert_eq!(values.parse::<Signup>().unwrap(), signup);
    }

    #[test]
    fn test_parse_type_mismatch() {
        let values = FormValues::new().with("username", "bob").with("age", "old");
        assert!(values.parse::<Signup>().is_err());
    }

    #[test]
    fn test_names_are_sorted() {
        let values = FormValues::new().with("z", 1).with("a", 2);
        assert_eq!(values.names().collect::<Vec<_>>(), vec!["a", "z"]);
    }

    #[test]
    fn test_insert_returns_previous() {
        let mut values = FormValues::new();
        assert!(values.insert("x", json!(1)).is_none());
        assert_eq!(values.insert("x", json!(2)), Some(json!(1)));
        assert_eq!(values.to_json(), json!({"x": 2}));
    }
}
