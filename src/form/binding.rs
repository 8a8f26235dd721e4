//! Binding descriptors for controls and change-input normalization

use serde::Serialize;
use serde_json::Value;

use super::errors::FieldError;
use super::form_state::Form;
use super::list::Mutation;
use super::path::FieldPath;
use super::value::{FieldValue, NULL_VALUE};

/// Kind of control a descriptor is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlType {
    #[default]
    Input,
    Checkbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputOptions {
    pub control_type: ControlType,
    /// Attach the current error to the descriptor (default true)
    pub with_error: bool,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            control_type: ControlType::Input,
            with_error: true,
        }
    }
}

impl InputOptions {
    pub fn checkbox() -> Self {
        Self {
            control_type: ControlType::Checkbox,
            ..Default::default()
        }
    }

    pub fn without_error(mut self) -> Self {
        self.with_error = false;
        self
    }
}

/// What the control displays
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Value(FieldValue),
    Checked(bool),
}

/// Everything a control needs: its binding, a change handler and the
/// error to show, if any
#[derive(Debug, Clone, PartialEq)]
pub struct InputProps {
    pub binding: Binding,
    pub on_change: ChangeHandler,
    pub error: Option<FieldError>,
}

impl InputProps {
    pub fn value(&self) -> Option<&FieldValue> {
        match &self.binding {
            Binding::Value(value) => Some(value),
            Binding::Checked(_) => None,
        }
    }

    pub fn checked(&self) -> Option<bool> {
        match self.binding {
            Binding::Checked(checked) => Some(checked),
            Binding::Value(_) => None,
        }
    }
}

/// Target of a change event
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EventTarget {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub checked: bool,
}

/// Event-like change input
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InputEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<EventTarget>,
}

impl InputEvent {
    /// Event from a text-like control
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            target: Some(EventTarget {
                input_type: Some("text".to_string()),
                value: Some(Value::String(value.into())),
                checked: false,
            }),
        }
    }

    /// Event from a checkbox control
    pub fn checkbox(checked: bool) -> Self {
        Self {
            target: Some(EventTarget {
                input_type: Some("checkbox".to_string()),
                value: None,
                checked,
            }),
        }
    }
}

/// Argument of a change handler: a raw value or an event-like object
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeInput {
    Value(FieldValue),
    Event(InputEvent),
}

impl ChangeInput {
    /// Checkbox targets yield `checked`, targets with a value yield that
    /// value, anything else is taken as the raw value itself.
    pub fn normalize(self) -> FieldValue {
        match self {
            ChangeInput::Value(value) => value,
            ChangeInput::Event(event) => match &event.target {
                Some(target)
                    if target
                        .input_type
                        .as_deref()
                        .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox")) =>
                {
                    FieldValue::from(target.checked)
                }
                Some(EventTarget {
                    value: Some(value), ..
                }) => FieldValue::Scalar(value.clone()),
                _ => FieldValue::Scalar(serde_json::to_value(&event).unwrap_or(Value::Null)),
            },
        }
    }
}

impl From<InputEvent> for ChangeInput {
    fn from(event: InputEvent) -> Self {
        ChangeInput::Event(event)
    }
}

impl From<FieldValue> for ChangeInput {
    fn from(value: FieldValue) -> Self {
        ChangeInput::Value(value)
    }
}

impl From<Value> for ChangeInput {
    fn from(value: Value) -> Self {
        ChangeInput::Value(FieldValue::Scalar(value))
    }
}

impl From<&str> for ChangeInput {
    fn from(value: &str) -> Self {
        ChangeInput::Value(FieldValue::from(value))
    }
}

impl From<String> for ChangeInput {
    fn from(value: String) -> Self {
        ChangeInput::Value(FieldValue::from(value))
    }
}

impl From<bool> for ChangeInput {
    fn from(value: bool) -> Self {
        ChangeInput::Value(FieldValue::from(value))
    }
}

/// Change handler of one descriptor. Holds only the address it writes to;
/// the form is passed in when the handler fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeHandler {
    target: FieldPath,
}

impl ChangeHandler {
    pub fn target(&self) -> &FieldPath {
        &self.target
    }

    pub fn call(&self, form: &mut Form, input: impl Into<ChangeInput>) -> Mutation {
        let value = input.into().normalize();
        match &self.target {
            FieldPath::Field(field) => {
                form.set_field_value(field, value);
                Mutation::Applied
            }
            FieldPath::Item {
                field,
                index,
                subfield,
            } => {
                // Merge into the item as it is now, not as it was when the
                // descriptor was built
                let item = form.list_at(field).map(|list| list.get(*index).cloned());
                match item {
                    Ok(Some(mut item)) => {
                        item.insert(subfield.clone(), value);
                        form.set_list_item(field, *index, item)
                    }
                    // set_list_item reports the stale index
                    Ok(None) => form.set_list_item(field, *index, Default::default()),
                    Err(reason) => Mutation::Skipped(reason),
                }
            }
        }
    }
}

impl Form {
    /// Descriptor for a control bound to `field`
    pub fn get_input_props(&self, field: &str, options: InputOptions) -> InputProps {
        let value = self.values().get(field).unwrap_or(&NULL_VALUE);
        let error = options
            .with_error
            .then(|| self.errors().get_field(field).cloned())
            .flatten();
        InputProps {
            binding: bind(value, options.control_type),
            on_change: ChangeHandler {
                target: FieldPath::field(field),
            },
            error,
        }
    }

    /// Descriptor for a control bound to `values[field][index][subfield]`.
    /// `None` when the field is not a list, or the item or subfield does
    /// not exist.
    pub fn get_list_input_props(
        &self,
        field: &str,
        index: usize,
        subfield: &str,
        options: InputOptions,
    ) -> Option<InputProps> {
        let value = self.values().get_list(field)?.get(index)?.get(subfield)?;
        let path = FieldPath::item(field, index, subfield);
        let error = options
            .with_error
            .then(|| self.errors().get(&path).cloned())
            .flatten();
        Some(InputProps {
            binding: bind(value, options.control_type),
            on_change: ChangeHandler { target: path },
            error,
        })
    }
}

fn bind(value: &FieldValue, control_type: ControlType) -> Binding {
    match control_type {
        ControlType::Checkbox => Binding::Checked(value.is_truthy()),
        ControlType::Input => Binding::Value(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::form_state::FormConfig;
    use crate::form::list::NoopReason;
    use crate::form::value::{list_item, ListValue, ValueStore};
    use serde_json::json;

    fn create_test_form() -> Form {
        Form::new(FormConfig::new(ValueStore::from_iter([
            ("name", FieldValue::from("Ada")),
            ("subscribed", FieldValue::from(false)),
            (
                "contacts",
                FieldValue::List(ListValue::new(vec![
                    list_item([
                        ("email", FieldValue::from("ada@example.com")),
                        ("primary", FieldValue::from(true)),
                    ]),
                    list_item([
                        ("email", FieldValue::from("")),
                        ("primary", FieldValue::from(false)),
                    ]),
                ])),
            ),
        ])))
    }

    mod change_input {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_raw_value_passes_through() {
            assert_eq!(ChangeInput::from("x").normalize(), FieldValue::from("x"));
        }

        #[test]
        fn test_checkbox_event_reads_checked() {
            assert_eq!(
                ChangeInput::from(InputEvent::checkbox(true)).normalize(),
                FieldValue::from(true)
            );
        }

        #[test]
        fn test_checkbox_type_is_case_insensitive() {
            let event = InputEvent {
                target: Some(EventTarget {
                    input_type: Some("CHECKBOX".into()),
                    value: Some(json!("on")),
                    checked: true,
                }),
            };
            assert_eq!(ChangeInput::from(event).normalize(), FieldValue::from(true));
        }

        #[test]
        fn test_text_event_reads_value() {
            assert_eq!(
                ChangeInput::from(InputEvent::text("hello")).normalize(),
                FieldValue::from("hello")
            );
        }

        #[test]
        fn test_event_without_target_is_raw_value() {
            assert_eq!(
                ChangeInput::from(InputEvent::default()).normalize(),
                FieldValue::from(json!({}))
            );
        }

        #[test]
        fn test_target_without_value_is_raw_value() {
            let event = InputEvent {
                target: Some(EventTarget::default()),
            };
            assert_eq!(
                ChangeInput::from(event).normalize(),
                FieldValue::from(json!({"target": {"checked": false}}))
            );
        }
    }

    mod input_props {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_binds_value() {
            let form = create_test_form();
            let props = form.get_input_props("name", InputOptions::default());
            assert_eq!(props.value(), Some(&FieldValue::from("Ada")));
            assert_eq!(props.on_change.target(), &FieldPath::field("name"));
            assert!(props.error.is_none());
        }

        #[test]
        fn test_checkbox_binds_checked() {
            let form = create_test_form();
            let props = form.get_input_props("subscribed", InputOptions::checkbox());
            assert_eq!(props.checked(), Some(false));
            assert!(props.value().is_none());
        }

        #[test]
        fn test_missing_field_binds_null() {
            let form = create_test_form();
            let props = form.get_input_props("missing", InputOptions::default());
            assert_eq!(props.value(), Some(&FieldValue::null()));
        }

        #[test]
        fn test_attaches_error_unless_disabled() {
            let mut form = create_test_form();
            form.set_field_error(&"name".into(), "taken");

            let props = form.get_input_props("name", InputOptions::default());
            assert_eq!(props.error.as_ref().and_then(FieldError::as_str), Some("taken"));

            let props = form.get_input_props("name", InputOptions::default().without_error());
            assert!(props.error.is_none());
        }

        #[test]
        fn test_handler_sets_value_and_clears_error() {
            let mut form = create_test_form();
            form.set_field_error(&"name".into(), "taken");
            let props = form.get_input_props("name", InputOptions::default());

            let outcome = props.on_change.call(&mut form, InputEvent::text("Grace"));

            assert!(outcome.is_applied());
            assert_eq!(form.values().get("name"), Some(&FieldValue::from("Grace")));
            assert!(form.errors().get_field("name").is_none());
        }

        #[test]
        fn test_checkbox_handler() {
            let mut form = create_test_form();
            let props = form.get_input_props("subscribed", InputOptions::checkbox());
            props.on_change.call(&mut form, InputEvent::checkbox(true));
            assert_eq!(
                form.get_input_props("subscribed", InputOptions::checkbox()).checked(),
                Some(true)
            );
        }
    }

    mod list_input_props {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_binds_item_subfield() {
            let form = create_test_form();
            let props = form
                .get_list_input_props("contacts", 0, "email", InputOptions::default())
                .unwrap();
            assert_eq!(props.value(), Some(&FieldValue::from("ada@example.com")));
        }

        #[test]
        fn test_checkbox_item_subfield() {
            let form = create_test_form();
            let props = form
                .get_list_input_props("contacts", 1, "primary", InputOptions::checkbox())
                .unwrap();
            assert_eq!(props.checked(), Some(false));
        }

        #[test]
        fn test_degenerate_cases_yield_none() {
            let form = create_test_form();
            let opts = InputOptions::default();
            assert!(form.get_list_input_props("name", 0, "email", opts).is_none());
            assert!(form.get_list_input_props("contacts", 2, "email", opts).is_none());
            assert!(form.get_list_input_props("contacts", 0, "phone", opts).is_none());
            assert!(form.get_list_input_props("missing", 0, "email", opts).is_none());
        }

        #[test]
        fn test_item_error_lookup() {
            let mut form = create_test_form();
            form.set_field_error(&FieldPath::item("contacts", 1, "email"), "required");

            let first = form
                .get_list_input_props("contacts", 0, "email", InputOptions::default())
                .unwrap();
            let second = form
                .get_list_input_props("contacts", 1, "email", InputOptions::default())
                .unwrap();
            assert!(first.error.is_none());
            assert_eq!(second.error.as_ref().and_then(FieldError::as_str), Some("required"));
        }

        #[test]
        fn test_handler_merges_into_item() {
            let mut form = create_test_form();
            let props = form
                .get_list_input_props("contacts", 1, "email", InputOptions::default())
                .unwrap();

            let outcome = props.on_change.call(&mut form, "grace@example.com");

            assert!(outcome.is_applied());
            let item = form.values().get_list("contacts").unwrap().get(1).unwrap();
            assert_eq!(item.get("email"), Some(&FieldValue::from("grace@example.com")));
            assert_eq!(item.get("primary"), Some(&FieldValue::from(false)));
            assert!(form.values().get("contacts").unwrap().is_list());
        }

        #[test]
        fn test_handler_uses_current_item() {
            let mut form = create_test_form();
            let email = form
                .get_list_input_props("contacts", 0, "email", InputOptions::default())
                .unwrap();
            let primary = form
                .get_list_input_props("contacts", 0, "primary", InputOptions::checkbox())
                .unwrap();

            email.on_change.call(&mut form, "new@example.com");
            primary.on_change.call(&mut form, InputEvent::checkbox(false));

            let item = form.values().get_list("contacts").unwrap().get(0).unwrap();
            assert_eq!(item.get("email"), Some(&FieldValue::from("new@example.com")));
            assert_eq!(item.get("primary"), Some(&FieldValue::from(false)));
        }

        #[test]
        fn test_stale_handler_is_noop() {
            let mut form = create_test_form();
            let props = form
                .get_list_input_props("contacts", 1, "email", InputOptions::default())
                .unwrap();
            form.remove_list_item("contacts", 1);
            let before = form.state();

            let outcome = props.on_change.call(&mut form, "late@example.com");

            assert_eq!(
                outcome,
                Mutation::Skipped(NoopReason::IndexOutOfRange {
                    field: "contacts".into(),
                    index: 1,
                    len: 1
                })
            );
            assert!(before.same_as(&form.state()));
        }
    }
}
