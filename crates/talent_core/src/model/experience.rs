//! Experience (job held) record.
//!
//! # Invariants
//! - `talent_id` is a plain reference; existence of the owning talent is
//!   left to the store's referential integrity.

use super::{require_text, RowId, ValidationError};
use serde::{Deserialize, Serialize};

/// One job held by a talent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    /// Store-assigned id. Zero until the row has been created.
    pub id: RowId,
    pub company: String,
    /// Owning talent. Serialized as `talentID` to match the external API shape.
    #[serde(rename = "talentID")]
    pub talent_id: RowId,
}

impl Experience {
    /// Creates an unsaved experience owned by `talent_id`.
    pub fn new(company: impl Into<String>, talent_id: RowId) -> Self {
        Self {
            id: 0,
            company: company.into(),
            talent_id,
        }
    }

    /// Checks required fields before persistence.
    ///
    /// # Errors
    /// - `ValidationError::BlankField("company")` when `company` is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("company", &self.company)
    }
}
