#![forbid(unsafe_code)]

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::specialist::SpecialistId;
use crate::{ContractViolation, Validate};

/// Fixed token length: 20 symbols from the 62-character alphanumeric
/// alphabet gives ~119 bits, so table-wide collisions are negligible.
pub const TOKEN_LEN: usize = 20;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LinkId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkToken(String);

impl LinkToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, ContractViolation> {
        let token = Self(raw.into());
        token.validate()?;
        Ok(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for LinkToken {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.len() != TOKEN_LEN {
            return Err(ContractViolation::InvalidValue {
                field: "links.token",
                reason: "must be exactly 20 characters",
            });
        }
        if !self.0.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ContractViolation::InvalidValue {
                field: "links.token",
                reason: "must be ASCII alphanumeric",
            });
        }
        Ok(())
    }
}

/// Current-state row for one assessment link.
///
/// `used` transitions false -> true exactly once, at the moment an
/// assessment is recorded against the link; the transition is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: LinkId,
    pub token: LinkToken,
    pub specialist_id: SpecialistId,
    pub used: bool,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl LinkRecord {
    pub fn v1(
        id: LinkId,
        token: LinkToken,
        specialist_id: SpecialistId,
        created_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<Self, ContractViolation> {
        let rec = Self {
            id,
            token,
            specialist_id,
            used: false,
            created_at,
            expires_at,
        };
        rec.validate()?;
        Ok(rec)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }
}

impl Validate for LinkRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.token.validate()?;
        if let Some(expires_at) = self.expires_at {
            if expires_at < self.created_at {
                return Err(ContractViolation::InvalidValue {
                    field: "links.expires_at",
                    reason: "must not precede created_at",
                });
            }
        }
        Ok(())
    }
}

/// Outcome of resolving a token on the public scoring path. Classification
/// order is fixed: a used link reports `AlreadyUsed` even when it is also
/// past its expiry.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkResolution {
    Valid(LinkRecord),
    AlreadyUsed,
    Expired,
}
