//! Rule sets and the validation engine
//!
//! Rules mirror the shape of the value store: each field maps to either a
//! scalar rule or a `ListOf` rule holding per-subfield rules that run once
//! for every item of a list field. Evaluation is a pure function of the
//! rule set and the values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::errors::{ErrorStore, FieldError, ItemErrors};
use super::path::FieldPath;
use super::value::{FieldValue, ListItem, ValueStore, NULL_VALUE};

/// Signature of a scalar rule: (field value, whole value store) -> error
pub type ScalarRuleFn = dyn Fn(&FieldValue, &ValueStore) -> Option<FieldError> + Send + Sync;

#[derive(Clone)]
pub enum Rule {
    Scalar(Arc<ScalarRuleFn>),
    ListOf(BTreeMap<String, Rule>),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Scalar(_) => f.write_str("Scalar(..)"),
            Rule::ListOf(rules) => f.debug_tuple("ListOf").field(rules).finish(),
        }
    }
}

impl Rule {
    /// Wrap a closure returning any error-like payload
    pub fn scalar<F, E>(rule: F) -> Self
    where
        F: Fn(&FieldValue, &ValueStore) -> Option<E> + Send + Sync + 'static,
        E: Into<FieldError>,
    {
        Rule::Scalar(Arc::new(
            move |value: &FieldValue, values: &ValueStore| -> Option<FieldError> {
                rule(value, values).map(Into::into)
            },
        ))
    }

    pub fn list_of<K, I>(rules: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Rule)>,
    {
        Rule::ListOf(rules.into_iter().map(|(k, r)| (k.into(), r)).collect())
    }

    /// Evaluate against one value; `root` is always the whole store
    fn evaluate(&self, value: &FieldValue, root: &ValueStore) -> Option<FieldError> {
        match self {
            Rule::Scalar(rule) => rule(value, root).and_then(FieldError::pruned),
            Rule::ListOf(rules) => {
                let list = value.as_list()?;
                let items = list
                    .iter()
                    .map(|item| evaluate_item(rules, item, root))
                    .collect();
                FieldError::Items(items).pruned()
            }
        }
    }
}

fn evaluate_item(rules: &BTreeMap<String, Rule>, item: &ListItem, root: &ValueStore) -> ItemErrors {
    rules
        .iter()
        .filter_map(|(subfield, rule)| {
            let value = item.get(subfield).unwrap_or(&NULL_VALUE);
            rule.evaluate(value, root)
                .map(|error| (subfield.clone(), error))
        })
        .collect()
}

/// Mapping from field name to rule
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, rule: Rule) -> Self {
        self.rules.insert(field.into(), rule);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Rule> {
        self.rules.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Rule)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (K, Rule)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|(k, r)| (k.into(), r)).collect(),
        }
    }
}

/// Result of validating every field with a rule
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub errors: ErrorStore,
    pub has_errors: bool,
}

/// Result of validating a single field path
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidation {
    pub valid: bool,
    pub error: Option<FieldError>,
}

/// Run every rule. Fields without a rule are never validated.
pub fn validate_all(rules: &RuleSet, values: &ValueStore) -> ValidationResult {
    let mut errors = ErrorStore::new();
    for (field, rule) in rules.iter() {
        let value = values.get(field).unwrap_or(&NULL_VALUE);
        if let Some(error) = rule.evaluate(value, values) {
            errors.set(&FieldPath::field(field), error);
        }
    }
    let has_errors = !errors.is_empty();
    tracing::debug!(
        rules = rules.len(),
        invalid_fields = errors.len(),
        "validated form"
    );
    ValidationResult { errors, has_errors }
}

/// Run the single rule addressed by `path`, resolving one level of list
/// items for item paths.
pub fn validate_field(path: &FieldPath, rules: &RuleSet, values: &ValueStore) -> FieldValidation {
    let error = match path {
        FieldPath::Field(name) => rules
            .get(name)
            .and_then(|rule| rule.evaluate(values.get(name).unwrap_or(&NULL_VALUE), values)),
        FieldPath::Item {
            field,
            index,
            subfield,
        } => match rules.get(field) {
            Some(Rule::ListOf(item_rules)) => item_rules.get(subfield).and_then(|rule| {
                let item = values.get_list(field)?.get(*index)?;
                rule.evaluate(item.get(subfield).unwrap_or(&NULL_VALUE), values)
            }),
            _ => None,
        },
    };
    FieldValidation {
        valid: error.is_none(),
        error,
    }
}
