//! Instrument entity.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{CategoryId, DomainError, InstrumentId};

const MAX_CODE_LEN: usize = 50;
const MAX_NAME_LEN: usize = 100;
const MAX_BRAND_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Field values of an instrument, minus its identity.
///
/// Used both as the creation command and as the storage row shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentDraft {
    /// Catalog code, unique across instruments.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Manufacturer.
    pub brand: String,
    /// Units on hand.
    pub stock: u32,
    /// Free text description.
    pub description: String,
    /// Image reference (file name or URL).
    pub image: String,
    /// Owning category.
    pub category_id: CategoryId,
}

impl InstrumentDraft {
    /// Check field presence and length limits.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        require("code", &self.code, MAX_CODE_LEN)?;
        require("name", &self.name, MAX_NAME_LEN)?;
        require("brand", &self.brand, MAX_BRAND_LEN)?;
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::invalid(
                "description",
                format!("must not exceed {MAX_DESCRIPTION_LEN} characters"),
            ));
        }
        Ok(())
    }
}

/// Partial update of an instrument; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentPatch {
    /// New code.
    pub code: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// New brand.
    pub brand: Option<String>,
    /// Overwrite of the stock counter.
    pub stock: Option<u32>,
    /// New description.
    pub description: Option<String>,
    /// New image reference.
    pub image: Option<String>,
    /// New category.
    pub category_id: Option<CategoryId>,
}

/// A catalog instrument.
///
/// The stock counter is only changed by the stock ledger or by an explicit
/// administrative patch; the price lives in the price history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    id: InstrumentId,
    fields: InstrumentDraft,
}

impl Instrument {
    /// Create a new instrument after validating the draft.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if the draft is invalid.
    pub fn create(id: InstrumentId, draft: InstrumentDraft) -> Result<Self, DomainError> {
        draft.validate()?;
        Ok(Self { id, fields: draft })
    }

    /// Rebuild from storage without validation.
    #[must_use]
    pub const fn reconstitute(id: InstrumentId, fields: InstrumentDraft) -> Self {
        Self { id, fields }
    }

    /// Apply a partial update. The instrument is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if the patched values are invalid.
    pub fn apply(&mut self, patch: InstrumentPatch) -> Result<(), DomainError> {
        let mut next = self.fields.clone();
        if let Some(code) = patch.code {
            next.code = code;
        }
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(brand) = patch.brand {
            next.brand = brand;
        }
        if let Some(stock) = patch.stock {
            next.stock = stock;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(image) = patch.image {
            next.image = image;
        }
        if let Some(category_id) = patch.category_id {
            next.category_id = category_id;
        }
        next.validate()?;
        self.fields = next;
        Ok(())
    }

    /// Instrument identifier.
    #[must_use]
    pub const fn id(&self) -> &InstrumentId {
        &self.id
    }

    /// Catalog code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.fields.code
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    /// Manufacturer.
    #[must_use]
    pub fn brand(&self) -> &str {
        &self.fields.brand
    }

    /// Units on hand.
    #[must_use]
    pub const fn stock(&self) -> u32 {
        self.fields.stock
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.fields.description
    }

    /// Image reference.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.fields.image
    }

    /// Owning category.
    #[must_use]
    pub const fn category_id(&self) -> &CategoryId {
        &self.fields.category_id
    }

    /// All non-identity fields.
    #[must_use]
    pub const fn fields(&self) -> &InstrumentDraft {
        &self.fields
    }

    pub(crate) const fn set_stock(&mut self, stock: u32) {
        self.fields.stock = stock;
    }
}

fn require(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid(field, "is required"));
    }
    if value.chars().count() > max {
        return Err(DomainError::invalid(
            field,
            format!("must not exceed {max} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn draft() -> InstrumentDraft {
        InstrumentDraft {
            code: "INST-1".to_string(),
            name: "Guitarra Criolla".to_string(),
            brand: "Fonseca".to_string(),
            stock: 4,
            description: "Tapa de pino".to_string(),
            image: "criolla.jpg".to_string(),
            category_id: CategoryId::new("cat-1"),
        }
    }

    #[test]
    fn create_accepts_valid_draft() {
        let instrument = Instrument::create(InstrumentId::new("i1"), draft()).unwrap();
        assert_eq!(instrument.code(), "INST-1");
        assert_eq!(instrument.stock(), 4);
    }

    #[test_case(|d: &mut InstrumentDraft| d.code = "  ".to_string() ; "blank code")]
    #[test_case(|d: &mut InstrumentDraft| d.name = String::new() ; "blank name")]
    #[test_case(|d: &mut InstrumentDraft| d.brand = String::new() ; "blank brand")]
    #[test_case(|d: &mut InstrumentDraft| d.code = "X".repeat(51) ; "long code")]
    #[test_case(|d: &mut InstrumentDraft| d.description = "d".repeat(1001) ; "long description")]
    fn create_rejects_invalid_draft(mutate: fn(&mut InstrumentDraft)) {
        let mut d = draft();
        mutate(&mut d);
        assert!(Instrument::create(InstrumentId::new("i1"), d).is_err());
    }

    #[test]
    fn apply_updates_only_given_fields() {
        let mut instrument = Instrument::create(InstrumentId::new("i1"), draft()).unwrap();
        instrument
            .apply(InstrumentPatch {
                brand: Some("Yamaha".to_string()),
                stock: Some(9),
                ..InstrumentPatch::default()
            })
            .unwrap();

        assert_eq!(instrument.brand(), "Yamaha");
        assert_eq!(instrument.stock(), 9);
        assert_eq!(instrument.name(), "Guitarra Criolla");
    }

    #[test]
    fn failed_apply_leaves_instrument_unchanged() {
        let mut instrument = Instrument::create(InstrumentId::new("i1"), draft()).unwrap();
        let before = instrument.clone();

        let result = instrument.apply(InstrumentPatch {
            stock: Some(1),
            name: Some(String::new()),
            ..InstrumentPatch::default()
        });

        assert!(result.is_err());
        assert_eq!(instrument, before);
    }
}
