//! Field value objects and the keyed value store

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::path::FieldPath;

/// One record of a list field, keyed by subfield name
pub type ListItem = BTreeMap<String, FieldValue>;

/// Stand-in for fields and subfields that hold nothing
pub(crate) static NULL_VALUE: FieldValue = FieldValue::Scalar(Value::Null);

/// Value held under a field name.
///
/// `List` is the only list-tagged variant. A `Scalar` that happens to
/// contain a JSON array is still a scalar and list operations ignore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    List(ListValue),
    Scalar(Value),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Scalar(Value::Null)
    }
}

impl FieldValue {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Scalar(Value::String(value.into()))
    }

    /// Create a null value
    pub fn null() -> Self {
        FieldValue::Scalar(Value::Null)
    }

    /// Get the list when this value is list-tagged
    pub fn as_list(&self) -> Option<&ListValue> {
        match self {
            FieldValue::List(list) => Some(list),
            FieldValue::Scalar(_) => None,
        }
    }

    /// Get the scalar payload (None for list values)
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            FieldValue::List(_) => None,
        }
    }

    /// Get the text value (None unless this is a string scalar)
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_str)
    }

    /// Get the boolean value (None unless this is a boolean scalar)
    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Value::as_bool)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Scalar(Value::Null))
    }

    /// Loose truthiness used by checkbox bindings: null, false, 0, NaN
    /// and the empty string are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::List(_) => true,
            FieldValue::Scalar(value) => json_truthy(value),
        }
    }

    /// Text used when rendering the value in a plain control
    pub fn display_value(&self) -> String {
        match self {
            FieldValue::Scalar(Value::Null) => String::new(),
            FieldValue::Scalar(Value::String(s)) => s.clone(),
            FieldValue::Scalar(other) => other.to_string(),
            FieldValue::List(list) => format!("[{} items]", list.len()),
        }
    }
}

pub(crate) fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<ListValue> for FieldValue {
    fn from(list: ListValue) -> Self {
        FieldValue::List(list)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::text(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Scalar(Value::Bool(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(Value::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Scalar(Value::from(value))
    }
}

/// Ordered sequence of item records, tagged as a list field.
///
/// Serialized as `{"$list": [...]}` so the tag survives a round trip
/// through plain JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListValue {
    #[serde(rename = "$list")]
    items: Vec<ListItem>,
}

impl ListValue {
    pub fn new(items: Vec<ListItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ListItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ListItem> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<ListItem> {
        self.items
    }
}

impl FromIterator<ListItem> for ListValue {
    fn from_iter<I: IntoIterator<Item = ListItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ListValue {
    type Item = &'a ListItem;
    type IntoIter = std::slice::Iter<'a, ListItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Build a list item from `(subfield, value)` pairs
pub fn list_item<K, V, I>(pairs: I) -> ListItem
where
    K: Into<String>,
    V: Into<FieldValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Keyed container of current field values.
///
/// Entries are shared `Arc`s: replacing one field yields a new store whose
/// other entries point at the same allocations as before.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueStore {
    fields: BTreeMap<String, Arc<FieldValue>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).map(Arc::as_ref)
    }

    /// Get the shared handle of a field value
    pub fn get_shared(&self, field: &str) -> Option<&Arc<FieldValue>> {
        self.fields.get(field)
    }

    /// Get a field only when it is list-tagged
    pub fn get_list(&self, field: &str) -> Option<&ListValue> {
        self.get(field).and_then(FieldValue::as_list)
    }

    /// Resolve a bare field or one subfield of one list item
    pub fn resolve(&self, path: &FieldPath) -> Option<&FieldValue> {
        match path {
            FieldPath::Field(name) => self.get(name),
            FieldPath::Item {
                field,
                index,
                subfield,
            } => self.get_list(field)?.get(*index)?.get(subfield),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// New store with `field` replaced; every other entry is shared
    pub fn with_field(&self, field: impl Into<String>, value: FieldValue) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(field.into(), Arc::new(value));
        Self { fields }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for ValueStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Arc::new(v.into())))
                .collect(),
        }
    }
}
