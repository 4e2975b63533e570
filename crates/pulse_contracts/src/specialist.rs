#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::{ContractViolation, Validate};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SpecialistId(pub u64);

/// Current-state row for one specialist. Deactivation is a flag flip only;
/// rows are never deleted, so historical links stay resolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistRecord {
    pub id: SpecialistId,
    pub name: String,
    pub position: Option<String>,
    pub is_active: bool,
}

impl SpecialistRecord {
    pub fn v1(
        id: SpecialistId,
        name: impl Into<String>,
        position: Option<String>,
        is_active: bool,
    ) -> Result<Self, ContractViolation> {
        let position = position.and_then(|p| {
            let trimmed = p.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        });
        let name: String = name.into();
        let rec = Self {
            id,
            name: name.trim().to_string(),
            position,
            is_active,
        };
        rec.validate()?;
        Ok(rec)
    }
}

impl Validate for SpecialistRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.name.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "specialists.name",
                reason: "must not be empty",
            });
        }
        if let Some(position) = &self.position {
            if position.trim().is_empty() {
                return Err(ContractViolation::InvalidValue {
                    field: "specialists.position",
                    reason: "must not be empty when present",
                });
            }
        }
        Ok(())
    }
}
