//! Entity records persisted by the talent store.
//!
//! # Responsibility
//! - Define the plain data shapes for `talent` and `experience` rows.
//! - Validate required text fields before they reach a write path.
//!
//! # Invariants
//! - `id` is assigned by the store and never changed afterwards.
//! - An experience belongs to exactly one talent through `talent_id`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod experience;
pub mod talent;

/// Store-assigned integer primary key.
pub type RowId = i64;

/// Validation failure for an entity about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace only.
    BlankField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}
