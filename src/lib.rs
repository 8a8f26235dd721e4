//! formstate - state engine for structured, possibly nested forms
//!
//! Tracks current field values and per-field errors, applies
//! invariant-preserving mutations to scalar and list fields, and runs
//! caller-supplied validation rules over the whole form or a single field.

pub mod config;
pub mod form;

pub use config::{FormSeed, SeedError};
pub use form::*;
