//! Form orchestration: state snapshots, mutations, validation and submit

use std::fmt;
use std::sync::Arc;

use super::errors::{ErrorStore, FieldError};
use super::list::{Indices, Mutation, NoopReason, Reorder};
use super::path::FieldPath;
use super::validation::{self, FieldValidation, RuleSet, ValidationResult};
use super::value::{FieldValue, ListItem, ListValue, ValueStore};

/// Event-like object handed to a submit handler
#[cfg_attr(test, mockall::automock)]
pub trait SubmitEvent {
    /// Neutralize whatever the triggering gesture would do by default
    fn prevent_default(&mut self);
}

/// Submit without a triggering event
impl SubmitEvent for () {
    fn prevent_default(&mut self) {}
}

/// Plain submit event that records whether its default was prevented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormSubmitEvent {
    pub default_prevented: bool,
}

impl SubmitEvent for FormSubmitEvent {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Receiver of "state replaced" notifications
#[cfg_attr(test, mockall::automock)]
pub trait StateListener {
    fn state_replaced(&mut self, state: &FormState);
}

impl<F: FnMut(&FormState)> StateListener for F {
    fn state_replaced(&mut self, state: &FormState) {
        self(state)
    }
}

/// Handle returned by [`Form::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Snapshot of the current stores. Compare snapshots with
/// [`FormState::same_as`] to detect replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub values: Arc<ValueStore>,
    pub errors: Arc<ErrorStore>,
}

impl FormState {
    /// Identity comparison of both stores
    pub fn same_as(&self, other: &FormState) -> bool {
        Arc::ptr_eq(&self.values, &other.values) && Arc::ptr_eq(&self.errors, &other.errors)
    }
}

/// Construction input
#[derive(Debug, Clone, Default)]
pub struct FormConfig {
    pub initial_values: ValueStore,
    pub initial_errors: ErrorStore,
    pub rules: RuleSet,
}

impl FormConfig {
    pub fn new(initial_values: ValueStore) -> Self {
        Self {
            initial_values,
            ..Default::default()
        }
    }

    pub fn initial_errors<I, P, E>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = (P, E)>,
        P: Into<FieldPath>,
        E: Into<FieldError>,
    {
        self.initial_errors = ErrorStore::from_entries_within(&self.initial_values, errors);
        self
    }

    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }
}

/// State of one form instance: values, errors, rules and subscribers
pub struct Form {
    initial_values: Arc<ValueStore>,
    values: Arc<ValueStore>,
    errors: Arc<ErrorStore>,
    rules: RuleSet,
    listeners: Vec<(SubscriptionId, Box<dyn StateListener>)>,
    next_subscription: u64,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("rules", &self.rules)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Form {
    pub fn new(config: FormConfig) -> Self {
        let initial_values = Arc::new(config.initial_values);
        Self {
            values: Arc::clone(&initial_values),
            initial_values,
            // ErrorStore constructors already drop empty errors
            errors: Arc::new(config.initial_errors),
            rules: config.rules,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn values(&self) -> &Arc<ValueStore> {
        &self.values
    }

    pub fn errors(&self) -> &Arc<ErrorStore> {
        &self.errors
    }

    pub fn initial_values(&self) -> &Arc<ValueStore> {
        &self.initial_values
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn state(&self) -> FormState {
        FormState {
            values: Arc::clone(&self.values),
            errors: Arc::clone(&self.errors),
        }
    }

    /// Resolve a bare field or list-item subfield
    pub fn field_value(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.values.resolve(path)
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.initial_values
    }

    pub fn is_field_dirty(&self, field: &str) -> bool {
        self.values.get(field) != self.initial_values.get(field)
    }

    // Subscriptions

    pub fn subscribe(&mut self, listener: impl StateListener + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Swap in replacement stores and notify listeners once
    fn commit(&mut self, values: Option<ValueStore>, errors: Option<ErrorStore>) {
        if values.is_none() && errors.is_none() {
            return;
        }
        if let Some(values) = values {
            self.values = Arc::new(values);
        }
        if let Some(errors) = errors {
            self.errors = Arc::new(errors);
        }
        self.notify();
    }

    fn notify(&mut self) {
        let state = self.state();
        tracing::trace!(listeners = self.listeners.len(), "form state replaced");
        for (_, listener) in self.listeners.iter_mut() {
            listener.state_replaced(&state);
        }
    }

    /// Error store without the error at `path`, if there was one
    fn errors_without(&self, path: &FieldPath) -> Option<ErrorStore> {
        let mut errors = (*self.errors).clone();
        errors.remove(path).then_some(errors)
    }

    // Values

    /// Replace the value at `field` and clear that field's error
    pub fn set_field_value(&mut self, field: &str, value: impl Into<FieldValue>) {
        let values = self.values.with_field(field, value.into());
        let errors = self.errors_without(&FieldPath::field(field));
        self.commit(Some(values), errors);
    }

    /// Replace the whole value store
    pub fn set_values(&mut self, values: ValueStore) {
        self.commit(Some(values), None);
    }

    /// Replace the whole value store with one derived from the current one
    pub fn update_values(&mut self, update: impl FnOnce(&ValueStore) -> ValueStore) {
        let values = update(&self.values);
        self.commit(Some(values), None);
    }

    /// Values back to the initial values, errors emptied
    pub fn reset(&mut self) {
        self.values = Arc::clone(&self.initial_values);
        self.errors = Arc::new(ErrorStore::new());
        self.notify();
    }

    // Errors

    /// Set the error at `path`. Item paths must address an existing item.
    pub fn set_field_error(&mut self, path: &FieldPath, error: impl Into<FieldError>) {
        let mut errors = (*self.errors).clone();
        if errors.set_within(&self.values, path, error.into()) {
            self.commit(None, Some(errors));
        }
    }

    pub fn clear_field_error(&mut self, path: &FieldPath) {
        let errors = self.errors_without(path);
        self.commit(None, errors);
    }

    pub fn clear_errors(&mut self) {
        if !self.errors.is_empty() {
            self.commit(None, Some(ErrorStore::new()));
        }
    }

    /// Replace the whole error store
    pub fn set_errors(&mut self, errors: ErrorStore) {
        self.commit(None, Some(errors));
    }

    /// Replace the whole error store with one derived from the current one
    pub fn update_errors(&mut self, update: impl FnOnce(&ErrorStore) -> ErrorStore) {
        let errors = update(&self.errors);
        self.commit(None, Some(errors));
    }

    // List fields

    /// Current list at `field`, or why there is none
    pub(crate) fn list_at(&self, field: &str) -> Result<&ListValue, NoopReason> {
        match self.values.get(field) {
            None => Err(NoopReason::MissingField(field.to_string())),
            Some(value) => value
                .as_list()
                .ok_or_else(|| NoopReason::NotAList(field.to_string())),
        }
    }

    /// Route a list transformation through `set_field_value`
    fn apply_list(
        &mut self,
        field: &str,
        op: &str,
        transform: impl FnOnce(&ListValue) -> Result<ListValue, NoopReason>,
    ) -> Mutation {
        let outcome = self.list_at(field).and_then(transform);
        match outcome {
            Ok(list) => {
                self.set_field_value(field, list);
                Mutation::Applied
            }
            Err(reason) => {
                tracing::debug!(field, op, %reason, "list mutation skipped");
                Mutation::Skipped(reason)
            }
        }
    }

    pub fn set_list_item(&mut self, field: &str, index: usize, item: ListItem) -> Mutation {
        self.apply_list(field, "set", |list| {
            list.with_item(index, item)
                .map_err(|e| out_of_range(field, e.index, e.len))
        })
    }

    pub fn add_list_item(&mut self, field: &str, item: ListItem) -> Mutation {
        self.apply_list(field, "add", |list| Ok(list.with_appended(item)))
    }

    pub fn insert_list_item(&mut self, field: &str, index: usize, item: ListItem) -> Mutation {
        self.apply_list(field, "insert", |list| {
            list.with_inserted(index, item)
                .map_err(|e| out_of_range(field, e.index, e.len))
        })
    }

    pub fn remove_list_item(&mut self, field: &str, indices: impl Into<Indices>) -> Mutation {
        let indices = indices.into();
        self.apply_list(field, "remove", |list| {
            list.without(&indices)
                .ok_or_else(|| NoopReason::NothingToRemove(field.to_string()))
        })
    }

    pub fn reorder_list_item(&mut self, field: &str, reorder: Reorder) -> Mutation {
        self.apply_list(field, "reorder", |list| {
            list.reordered(reorder)
                .map_err(|e| out_of_range(field, e.index, e.len))
        })
    }

    // Validation

    /// Validate every field and replace the error store with the result
    pub fn validate(&mut self) -> ValidationResult {
        let result = validation::validate_all(&self.rules, &self.values);
        self.set_errors(result.errors.clone());
        result
    }

    /// Validate one path; sets or clears only that path's error
    pub fn validate_field(&mut self, path: &FieldPath) -> FieldValidation {
        let result = validation::validate_field(path, &self.rules, &self.values);
        match &result.error {
            Some(error) => self.set_field_error(path, error.clone()),
            None => self.clear_field_error(path),
        }
        result
    }

    /// Wrap `callback` into a submit handler
    pub fn on_submit<F>(&self, callback: F) -> SubmitHandler<F>
    where
        F: FnMut(&ValueStore, &mut dyn SubmitEvent),
    {
        SubmitHandler { callback }
    }
}

fn out_of_range(field: &str, index: usize, len: usize) -> NoopReason {
    NoopReason::IndexOutOfRange {
        field: field.to_string(),
        index,
        len,
    }
}

/// Submit handler produced by [`Form::on_submit`]
pub struct SubmitHandler<F> {
    callback: F,
}

impl<F> SubmitHandler<F>
where
    F: FnMut(&ValueStore, &mut dyn SubmitEvent),
{
    /// Prevent the event default, validate, and call back only when valid
    pub fn handle(&mut self, form: &mut Form, event: &mut dyn SubmitEvent) -> ValidationResult {
        event.prevent_default();
        let result = form.validate();
        if result.has_errors {
            tracing::debug!(
                invalid_fields = result.errors.len(),
                "submit rejected by validation"
            );
        } else {
            let values = Arc::clone(form.values());
            (self.callback)(&values, event);
        }
        result
    }
}
