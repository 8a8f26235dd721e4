//! Field errors and the error store

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::path::FieldPath;
use super::value::{json_truthy, ValueStore};

/// Per-item errors of a list field, keyed by subfield
pub type ItemErrors = BTreeMap<String, FieldError>;

/// Error attached to a field.
///
/// `Message` carries an opaque caller-defined payload. `Items` holds one
/// error map per list item, positionally aligned with the list, and is
/// written as `{"$items": [...]}` so any JSON payload stays a `Message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldErrorRepr", into = "FieldErrorRepr")]
pub enum FieldError {
    Items(Vec<ItemErrors>),
    Message(Value),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaggedItems {
    #[serde(rename = "$items")]
    items: Vec<ItemErrors>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FieldErrorRepr {
    Items(TaggedItems),
    Message(Value),
}

impl From<FieldErrorRepr> for FieldError {
    fn from(repr: FieldErrorRepr) -> Self {
        match repr {
            FieldErrorRepr::Items(TaggedItems { items }) => FieldError::Items(items),
            FieldErrorRepr::Message(payload) => FieldError::Message(payload),
        }
    }
}

impl From<FieldError> for FieldErrorRepr {
    fn from(error: FieldError) -> Self {
        match error {
            FieldError::Items(items) => FieldErrorRepr::Items(TaggedItems { items }),
            FieldError::Message(payload) => FieldErrorRepr::Message(payload),
        }
    }
}

impl FieldError {
    pub fn message(payload: impl Into<Value>) -> Self {
        FieldError::Message(payload.into())
    }

    /// Whether this error means "no error" (falsy payload or no item errors)
    pub fn is_empty(&self) -> bool {
        match self {
            FieldError::Message(payload) => !json_truthy(payload),
            FieldError::Items(items) => items
                .iter()
                .all(|item| item.values().all(FieldError::is_empty)),
        }
    }

    /// Drop empty entries recursively; `None` when nothing is left
    pub fn pruned(self) -> Option<Self> {
        match self {
            FieldError::Message(_) if self.is_empty() => None,
            FieldError::Message(_) => Some(self),
            FieldError::Items(items) => {
                let items: Vec<ItemErrors> = items
                    .into_iter()
                    .map(|item| {
                        item.into_iter()
                            .filter_map(|(k, e)| e.pruned().map(|e| (k, e)))
                            .collect()
                    })
                    .collect();
                if items.iter().all(BTreeMap::is_empty) {
                    None
                } else {
                    Some(FieldError::Items(items))
                }
            }
        }
    }

    /// The payload as text, when it is a string message
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldError::Message(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Error of one subfield of one item
    pub fn item(&self, index: usize, subfield: &str) -> Option<&FieldError> {
        match self {
            FieldError::Items(items) => items.get(index)?.get(subfield),
            FieldError::Message(_) => None,
        }
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        FieldError::message(message)
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        FieldError::message(message)
    }
}

impl From<Value> for FieldError {
    fn from(payload: Value) -> Self {
        FieldError::Message(payload)
    }
}

/// Mapping from field to error. Absence of a key means "no error"; no key
/// ever holds an empty error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, FieldError>", into = "BTreeMap<String, FieldError>")]
pub struct ErrorStore {
    entries: BTreeMap<String, FieldError>,
}

impl From<BTreeMap<String, FieldError>> for ErrorStore {
    fn from(entries: BTreeMap<String, FieldError>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .filter_map(|(k, e)| e.pruned().map(|e| (k, e)))
                .collect(),
        }
    }
}

impl From<ErrorStore> for BTreeMap<String, FieldError> {
    fn from(store: ErrorStore) -> Self {
        store.entries
    }
}

impl ErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from path-addressed errors, dropping empty ones
    pub fn from_entries<I, P, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, E)>,
        P: Into<FieldPath>,
        E: Into<FieldError>,
    {
        let mut store = Self::new();
        for (path, error) in entries {
            store.set(&path.into(), error.into());
        }
        store
    }

    /// Like [`ErrorStore::from_entries`], keeping only item errors that
    /// address an existing item of `values`
    pub fn from_entries_within<I, P, E>(values: &ValueStore, entries: I) -> Self
    where
        I: IntoIterator<Item = (P, E)>,
        P: Into<FieldPath>,
        E: Into<FieldError>,
    {
        let mut store = Self::new();
        for (path, error) in entries {
            store.set_within(values, &path.into(), error.into());
        }
        store
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldError> {
        match path {
            FieldPath::Field(name) => self.entries.get(name),
            FieldPath::Item {
                field,
                index,
                subfield,
            } => self.entries.get(field)?.item(*index, subfield),
        }
    }

    pub fn get_field(&self, field: &str) -> Option<&FieldError> {
        self.entries.get(field)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get(path).is_some()
    }

    /// Insert or overwrite an error. An empty error clears the path instead.
    /// Returns whether the store changed.
    pub fn set(&mut self, path: &FieldPath, error: FieldError) -> bool {
        let Some(error) = error.pruned() else {
            return self.remove(path);
        };
        if self.get(path) == Some(&error) {
            return false;
        }
        match path {
            FieldPath::Field(name) => {
                self.entries.insert(name.clone(), error);
            }
            FieldPath::Item {
                field,
                index,
                subfield,
            } => {
                // The item vector needs index + 1 slots
                let Some(len) = index.checked_add(1) else {
                    return false;
                };
                let entry = self
                    .entries
                    .entry(field.clone())
                    .or_insert_with(|| FieldError::Items(Vec::new()));
                if matches!(entry, FieldError::Message(_)) {
                    *entry = FieldError::Items(Vec::new());
                }
                let FieldError::Items(items) = entry else {
                    return false;
                };
                if items.len() < len {
                    items.resize_with(len, ItemErrors::new);
                }
                items[*index].insert(subfield.clone(), error);
            }
        }
        true
    }

    /// [`ErrorStore::set`] that refuses item paths past the end of the list
    /// held in `values`. Clearing is always allowed.
    pub fn set_within(&mut self, values: &ValueStore, path: &FieldPath, error: FieldError) -> bool {
        if let FieldPath::Item { field, index, .. } = path {
            let len = values.get_list(field).map_or(0, |list| list.len());
            if *index >= len && !error.is_empty() {
                tracing::debug!(%path, len, "error path outside list, ignored");
                return false;
            }
        }
        self.set(path, error)
    }

    /// Remove the error at `path`. Removing the last item error of a list
    /// field removes the whole key. Returns whether the store changed.
    pub fn remove(&mut self, path: &FieldPath) -> bool {
        match path {
            FieldPath::Field(name) => self.entries.remove(name).is_some(),
            FieldPath::Item {
                field,
                index,
                subfield,
            } => {
                let Some(FieldError::Items(items)) = self.entries.get_mut(field) else {
                    return false;
                };
                let removed = items
                    .get_mut(*index)
                    .and_then(|item| item.remove(subfield))
                    .is_some();
                if removed && items.iter().all(BTreeMap::is_empty) {
                    self.entries.remove(field);
                }
                removed
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod field_error {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_falsy_messages_are_empty() {
            assert!(FieldError::message(Value::Null).is_empty());
            assert!(FieldError::message("").is_empty());
            assert!(FieldError::message(false).is_empty());
            assert!(FieldError::message(0).is_empty());
            assert!(!FieldError::message("required").is_empty());
            assert!(!FieldError::message(json!({"code": 3})).is_empty());
        }

        #[test]
        fn test_items_empty_when_every_item_is_empty() {
            let error = FieldError::Items(vec![ItemErrors::new(), ItemErrors::new()]);
            assert!(error.is_empty());
            assert!(error.pruned().is_none());
        }

        #[test]
        fn test_pruned_keeps_item_positions() {
            let error = FieldError::Items(vec![
                ItemErrors::from([("name".to_string(), FieldError::from(""))]),
                ItemErrors::from([("name".to_string(), FieldError::from("required"))]),
            ]);
            let pruned = error.pruned().unwrap();
            assert_eq!(
                pruned,
                FieldError::Items(vec![
                    ItemErrors::new(),
                    ItemErrors::from([("name".to_string(), FieldError::from("required"))]),
                ])
            );
            assert_eq!(pruned.item(1, "name").and_then(FieldError::as_str), Some("required"));
        }

        #[test]
        fn test_deserialize_tagged_items() {
            let items: FieldError =
                serde_json::from_value(json!({"$items": [{}, {"a": "bad"}]})).unwrap();
            assert_eq!(items.item(1, "a").and_then(FieldError::as_str), Some("bad"));
            let message: FieldError = serde_json::from_value(json!("bad")).unwrap();
            assert_eq!(message.as_str(), Some("bad"));
        }

        #[test]
        fn test_array_payload_stays_message() {
            let payload = json!([{"code": ""}]);
            let error: FieldError = serde_json::from_value(payload.clone()).unwrap();
            assert_eq!(error, FieldError::Message(payload));
            assert!(!error.is_empty());
        }

        #[test]
        fn test_serialize_items_with_tag() {
            let error = FieldError::Items(vec![
                ItemErrors::new(),
                ItemErrors::from([("name".to_string(), FieldError::from("required"))]),
            ]);
            let json = serde_json::to_value(&error).unwrap();
            assert_eq!(json, json!({"$items": [{}, {"name": "required"}]}));
            let parsed: FieldError = serde_json::from_value(json).unwrap();
            assert_eq!(parsed, error);
        }
    }

    mod error_store {
        use super::*;
        use crate::form::value::{list_item, FieldValue, ListValue};
        use pretty_assertions::assert_eq;

        #[test]
        fn test_from_entries_filters_empty_errors() {
            let store = ErrorStore::from_entries([("age", ""), ("name", "required")]);
            assert!(store.get_field("age").is_none());
            assert_eq!(store.get_field("name").and_then(FieldError::as_str), Some("required"));
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn test_set_overwrites() {
            let mut store = ErrorStore::new();
            assert!(store.set(&"name".into(), "required".into()));
            assert!(store.set(&"name".into(), "too short".into()));
            assert_eq!(store.get_field("name").and_then(FieldError::as_str), Some("too short"));
        }

        #[test]
        fn test_set_same_error_reports_no_change() {
            let mut store = ErrorStore::from_entries([("name", "required")]);
            assert!(!store.set(&"name".into(), "required".into()));
        }

        #[test]
        fn test_set_empty_error_removes_key() {
            let mut store = ErrorStore::from_entries([("name", "required")]);
            assert!(store.set(&"name".into(), FieldError::message(Value::Null)));
            assert!(store.is_empty());
        }

        #[test]
        fn test_remove_absent_is_noop() {
            let mut store = ErrorStore::new();
            assert!(!store.remove(&"name".into()));
        }

        #[test]
        fn test_set_item_error_grows_items() {
            let mut store = ErrorStore::new();
            store.set(&FieldPath::item("contacts", 2, "email"), "invalid".into());
            assert_eq!(
                store.get_field("contacts"),
                Some(&FieldError::Items(vec![
                    ItemErrors::new(),
                    ItemErrors::new(),
                    ItemErrors::from([("email".to_string(), FieldError::from("invalid"))]),
                ]))
            );
            assert!(store.contains(&FieldPath::item("contacts", 2, "email")));
            assert!(!store.contains(&FieldPath::item("contacts", 0, "email")));
        }

        #[test]
        fn test_set_item_error_replaces_message() {
            let mut store = ErrorStore::from_entries([("contacts", "at least one")]);
            store.set(&FieldPath::item("contacts", 0, "name"), "required".into());
            assert_eq!(
                store
                    .get(&FieldPath::item("contacts", 0, "name"))
                    .and_then(FieldError::as_str),
                Some("required")
            );
        }

        #[test]
        fn test_removing_last_item_error_removes_key() {
            let mut store = ErrorStore::new();
            let a = FieldPath::item("contacts", 0, "name");
            let b = FieldPath::item("contacts", 1, "name");
            store.set(&a, "required".into());
            store.set(&b, "required".into());

            assert!(store.remove(&a));
            assert!(store.get_field("contacts").is_some());
            assert!(store.remove(&b));
            assert!(store.get_field("contacts").is_none());
        }

        #[test]
        fn test_deserialize_filters_empty_errors() {
            let store: ErrorStore = serde_json::from_value(
                json!({"age": "", "name": "required", "list": {"$items": [{}]}}),
            )
            .unwrap();
            assert_eq!(store.len(), 1);
            assert!(store.get_field("name").is_some());
        }

        #[test]
        fn test_opaque_array_error_survives_load() {
            let store: ErrorStore =
                serde_json::from_value(json!({"tags": [{"code": ""}]})).unwrap();
            assert_eq!(
                store.get_field("tags"),
                Some(&FieldError::Message(json!([{"code": ""}])))
            );
        }

        #[test]
        fn test_serializes_as_plain_map() {
            let store = ErrorStore::from_entries([("name", "required")]);
            assert_eq!(serde_json::to_value(&store).unwrap(), json!({"name": "required"}));
        }

        #[test]
        fn test_set_item_error_at_max_index_is_noop() {
            let mut store = ErrorStore::new();
            assert!(!store.set(&FieldPath::item("contacts", usize::MAX, "email"), "bad".into()));
            assert!(store.is_empty());
        }

        #[test]
        fn test_set_within_refuses_index_past_list() {
            let values = ValueStore::from_iter([(
                "contacts",
                FieldValue::List(ListValue::new(vec![list_item([("email", "")])])),
            )]);
            let mut store = ErrorStore::new();

            assert!(!store.set_within(
                &values,
                &FieldPath::item("contacts", 1_000_000_000_000, "email"),
                "bad".into()
            ));
            assert!(!store.set_within(&values, &FieldPath::item("missing", 0, "x"), "bad".into()));
            assert!(store.is_empty());

            let first = FieldPath::item("contacts", 0, "email");
            assert!(store.set_within(&values, &first, "bad".into()));
            assert!(store.contains(&first));
        }
    }
}
