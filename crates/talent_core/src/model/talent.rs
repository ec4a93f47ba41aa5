//! Talent (person) record.

use super::{require_text, RowId, ValidationError};
use serde::{Deserialize, Serialize};

/// A person whose work history is tracked through experiences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talent {
    /// Store-assigned id. Zero until the row has been created.
    pub id: RowId,
    pub name: String,
}

impl Talent {
    /// Creates an unsaved talent.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }

    /// Checks required fields before persistence.
    ///
    /// # Errors
    /// - `ValidationError::BlankField("name")` when `name` is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}
