//! Form domain layer
//!
//! Values, errors, list-field operations, validation and control bindings
//! for a single form instance. Nothing here renders anything; a rendering
//! layer reads [`FormState`] snapshots and [`InputProps`] descriptors.

mod binding;
mod errors;
mod form_state;
mod list;
mod path;
mod validation;
mod value;

pub use binding::{
    Binding, ChangeHandler, ChangeInput, ControlType, EventTarget, InputEvent, InputOptions,
    InputProps,
};
pub use errors::{ErrorStore, FieldError, ItemErrors};
pub use form_state::{
    Form, FormConfig, FormState, FormSubmitEvent, StateListener, SubmitEvent, SubmitHandler,
    SubscriptionId,
};
pub use list::{Indices, Mutation, NoopReason, OutOfRange, Reorder};
pub use path::{FieldPath, PathParseError};
pub use validation::{
    validate_all, validate_field, FieldValidation, Rule, RuleSet, ScalarRuleFn, ValidationResult,
};
pub use value::{list_item, FieldValue, ListItem, ListValue, ValueStore};
