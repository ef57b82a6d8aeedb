//! Farm and bed — the physical hierarchy devices hang off.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{BedId, FarmId};

/// A horticultural installation owning zero or more beds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub id: FarmId,
    pub name: String,
}

impl Farm {
    /// Create a farm record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the id or name is empty, or the id
    /// contains a topic separator or wildcard.
    pub fn new(id: impl Into<FarmId>, name: impl Into<String>) -> Result<Self, ValidationError> {
        let farm = Self {
            id: id.into(),
            name: name.into(),
        };
        farm.validate()?;
        Ok(farm)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the id or name is empty, or the id
    /// contains a topic separator or wildcard.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("farm", self.id.as_str())?;
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

/// What grows in a bed and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropInfo {
    pub crop_name: String,
    pub growing_method: String,
}

impl Default for CropInfo {
    fn default() -> Self {
        Self {
            crop_name: "tomato".to_string(),
            growing_method: "deep_water_culture".to_string(),
        }
    }
}

/// A growing bed inside a farm. Sensors and actuators are attached to beds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: BedId,
    pub farm_id: FarmId,
    pub name: String,
    pub crop: CropInfo,
}

impl Bed {
    /// Create a builder for constructing a [`Bed`].
    #[must_use]
    pub fn builder() -> BedBuilder {
        BedBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when an id or the name is empty, or an
    /// id contains a topic separator or wildcard.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("bed", self.id.as_str())?;
        check_id("farm", self.farm_id.as_str())?;
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Ids are pasted verbatim into topic segments.
fn check_id(kind: &'static str, id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId { kind });
    }
    if id.contains(['/', '+', '#']) {
        return Err(ValidationError::ReservedCharacter {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Step-by-step builder for [`Bed`].
#[derive(Debug, Default)]
pub struct BedBuilder {
    id: Option<BedId>,
    farm_id: Option<FarmId>,
    name: Option<String>,
    crop: Option<CropInfo>,
}

impl BedBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<BedId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn farm_id(mut self, farm_id: impl Into<FarmId>) -> Self {
        self.farm_id = Some(farm_id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn crop(mut self, crop_name: impl Into<String>, growing_method: impl Into<String>) -> Self {
        self.crop = Some(CropInfo {
            crop_name: crop_name.into(),
            growing_method: growing_method.into(),
        });
        self
    }

    /// Consume the builder, validate, and return a [`Bed`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if an id or the name is missing or empty.
    pub fn build(self) -> Result<Bed, ValidationError> {
        let bed = Bed {
            id: self.id.unwrap_or_else(|| BedId::new("")),
            farm_id: self.farm_id.unwrap_or_else(|| FarmId::new("")),
            name: self.name.unwrap_or_default(),
            crop: self.crop.unwrap_or_default(),
        };
        bed.validate()?;
        Ok(bed)
    }
}
