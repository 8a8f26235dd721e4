//! Field paths: the unit of error attribution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors produced when parsing a dotted field path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
    #[error("field path is empty")]
    Empty,

    #[error("invalid field path `{0}`: expected `field` or `field.index.subfield`")]
    Malformed(String),

    #[error("invalid list index `{index}` in field path `{path}`")]
    BadIndex { path: String, index: String },
}

/// A bare field name, or one subfield of one item of a list field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldPath {
    Field(String),
    Item {
        field: String,
        index: usize,
        subfield: String,
    },
}

impl FieldPath {
    pub fn field(name: impl Into<String>) -> Self {
        FieldPath::Field(name.into())
    }

    pub fn item(field: impl Into<String>, index: usize, subfield: impl Into<String>) -> Self {
        FieldPath::Item {
            field: field.into(),
            index,
            subfield: subfield.into(),
        }
    }

    /// Top-level field name the path lives under
    pub fn root(&self) -> &str {
        match self {
            FieldPath::Field(name) => name,
            FieldPath::Item { field, .. } => field,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, FieldPath::Item { .. })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Field(name) => write!(f, "{name}"),
            FieldPath::Item {
                field,
                index,
                subfield,
            } => write!(f, "{field}.{index}.{subfield}"),
        }
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathParseError::Empty);
        }
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [name] => Ok(FieldPath::field(*name)),
            [field, index, subfield] if !field.is_empty() && !subfield.is_empty() => {
                let index = index.parse().map_err(|_| PathParseError::BadIndex {
                    path: s.to_string(),
                    index: index.to_string(),
                })?;
                Ok(FieldPath::item(*field, index, *subfield))
            }
            _ => Err(PathParseError::Malformed(s.to_string())),
        }
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// A plain name is always a bare field path; use `parse` for dotted paths
impl From<&str> for FieldPath {
    fn from(name: &str) -> Self {
        FieldPath::field(name)
    }
}
