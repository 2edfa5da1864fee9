//! Instrument category.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{CategoryId, DomainError};

/// A named grouping of instruments. Names are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
}

impl Category {
    /// Create a category, validating its name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if the name is blank.
    pub fn create(id: CategoryId, name: &str) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            name: validate_name(name)?,
        })
    }

    /// Rebuild from storage without validation.
    #[must_use]
    pub const fn reconstitute(id: CategoryId, name: String) -> Self {
        Self { id, name }
    }

    /// Change the category name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if the new name is blank.
    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        self.name = validate_name(name)?;
        Ok(())
    }

    /// Category identifier.
    #[must_use]
    pub const fn id(&self) -> &CategoryId {
        &self.id
    }

    /// Category name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::invalid("name", "category name is required"));
    }
    Ok(name.to_string())
}
