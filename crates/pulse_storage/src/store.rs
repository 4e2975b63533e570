#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use jiff::Timestamp;

use pulse_contracts::assessment::{AssessmentId, AssessmentRecord};
use pulse_contracts::link::{LinkId, LinkRecord, LinkToken};
use pulse_contracts::specialist::{SpecialistId, SpecialistRecord};
use pulse_contracts::{ContractViolation, Validate};

use crate::snapshot::{StoreSnapshot, SNAPSHOT_SCHEMA_VERSION};

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    DuplicateKey { table: &'static str, key: String },
    ForeignKeyViolation { table: &'static str, key: String },
    RowNotFound { table: &'static str, key: String },
    ContractViolation(ContractViolation),
}

impl From<ContractViolation> for StorageError {
    fn from(v: ContractViolation) -> Self {
        StorageError::ContractViolation(v)
    }
}

/// The three-table store.
///
/// Tables are keyed current-state maps; ids are store-assigned and
/// monotonically increasing. Every mutation runs inside one `&mut self`
/// call, so a caller holding the store lock observes each multi-row write
/// (the consume transaction) as all-or-nothing.
#[derive(Debug, Clone)]
pub struct Store {
    specialists: BTreeMap<SpecialistId, SpecialistRecord>,
    links: BTreeMap<LinkId, LinkRecord>,
    // Token uniqueness index: token -> link id.
    link_ids_by_token: BTreeMap<String, LinkId>,
    assessments: BTreeMap<AssessmentId, AssessmentRecord>,
    next_specialist_id: u64,
    next_link_id: u64,
    next_assessment_id: u64,
}

/// One dashboard row before filtering: the assessment with its optional
/// link and transitively derived specialist.
#[derive(Debug, Clone, Copy)]
pub struct JoinedAssessment<'a> {
    pub assessment: &'a AssessmentRecord,
    pub link: Option<&'a LinkRecord>,
    pub specialist: Option<&'a SpecialistRecord>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            specialists: BTreeMap::new(),
            links: BTreeMap::new(),
            link_ids_by_token: BTreeMap::new(),
            assessments: BTreeMap::new(),
            next_specialist_id: 1,
            next_link_id: 1,
            next_assessment_id: 1,
        }
    }

    // ------------------------
    // Specialists.
    // ------------------------

    pub fn create_specialist(
        &mut self,
        name: &str,
        position: Option<&str>,
    ) -> Result<SpecialistRecord, StorageError> {
        let record = SpecialistRecord::v1(
            SpecialistId(self.next_specialist_id),
            name,
            position.map(str::to_string),
            true,
        )?;
        self.next_specialist_id += 1;
        self.specialists.insert(record.id, record.clone());
        Ok(record)
    }

    pub fn specialist(&self, id: SpecialistId) -> Option<&SpecialistRecord> {
        self.specialists.get(&id)
    }

    /// Specialists ordered by name for filter-menu presentation.
    pub fn specialists_ordered(&self, active_only: bool) -> Vec<&SpecialistRecord> {
        let mut rows: Vec<&SpecialistRecord> = self
            .specialists
            .values()
            .filter(|s| !active_only || s.is_active)
            .collect();
        rows.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        rows
    }

    /// Flips the active flag and returns the new state. Soft only: the row
    /// and everything referencing it stay in place.
    pub fn toggle_specialist_active(
        &mut self,
        id: SpecialistId,
    ) -> Result<bool, StorageError> {
        let record = self
            .specialists
            .get_mut(&id)
            .ok_or(StorageError::RowNotFound {
                table: "specialists",
                key: id.0.to_string(),
            })?;
        record.is_active = !record.is_active;
        Ok(record.is_active)
    }

    // ------------------------
    // Links.
    // ------------------------

    pub fn create_link(
        &mut self,
        token: LinkToken,
        specialist_id: SpecialistId,
        created_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<LinkRecord, StorageError> {
        if !self.specialists.contains_key(&specialist_id) {
            return Err(StorageError::ForeignKeyViolation {
                table: "links.specialist_id",
                key: specialist_id.0.to_string(),
            });
        }
        if self.link_ids_by_token.contains_key(token.as_str()) {
            return Err(StorageError::DuplicateKey {
                table: "links.token",
                key: token.as_str().to_string(),
            });
        }
        let record = LinkRecord::v1(
            LinkId(self.next_link_id),
            token,
            specialist_id,
            created_at,
            expires_at,
        )?;
        self.next_link_id += 1;
        self.link_ids_by_token
            .insert(record.token.as_str().to_string(), record.id);
        self.links.insert(record.id, record.clone());
        Ok(record)
    }

    pub fn link(&self, id: LinkId) -> Option<&LinkRecord> {
        self.links.get(&id)
    }

    pub fn link_by_token(&self, token: &str) -> Option<&LinkRecord> {
        let id = self.link_ids_by_token.get(token)?;
        self.links.get(id)
    }

    // ------------------------
    // Assessments.
    // ------------------------

    pub fn record_assessment(
        &mut self,
        score: i32,
        link_id: Option<LinkId>,
        now: Timestamp,
    ) -> Result<AssessmentRecord, StorageError> {
        if let Some(link_id) = link_id {
            if !self.links.contains_key(&link_id) {
                return Err(StorageError::ForeignKeyViolation {
                    table: "assessments.link_id",
                    key: link_id.0.to_string(),
                });
            }
        }
        let record =
            AssessmentRecord::v1(AssessmentId(self.next_assessment_id), score, now, link_id);
        self.next_assessment_id += 1;
        self.assessments.insert(record.id, record.clone());
        Ok(record)
    }

    /// The one two-record transaction: records the assessment and flips the
    /// link's used flag together.
    ///
    /// The lookup is scoped to `used == false` at write time, so of two
    /// racing submissions on the same token exactly one succeeds and the
    /// other observes `RowNotFound`.
    pub fn consume_link_recording_assessment(
        &mut self,
        token: &str,
        score: i32,
        now: Timestamp,
    ) -> Result<AssessmentRecord, StorageError> {
        let link_id = match self.link_by_token(token) {
            Some(link) if !link.used => link.id,
            _ => {
                return Err(StorageError::RowNotFound {
                    table: "links",
                    key: token.to_string(),
                })
            }
        };
        let record = self.record_assessment(score, Some(link_id), now)?;
        if let Some(link) = self.links.get_mut(&link_id) {
            link.used = true;
        }
        Ok(record)
    }

    pub fn assessment(&self, id: AssessmentId) -> Option<&AssessmentRecord> {
        self.assessments.get(&id)
    }

    /// Overwrites the comment. Idempotent by design: last write wins, and
    /// nothing guards against reattachment.
    pub fn attach_comment(
        &mut self,
        id: AssessmentId,
        comment: &str,
    ) -> Result<(), StorageError> {
        let record = self
            .assessments
            .get_mut(&id)
            .ok_or(StorageError::RowNotFound {
                table: "assessments",
                key: id.0.to_string(),
            })?;
        record.comment = Some(comment.to_string());
        Ok(())
    }

    /// All assessments joined (optionally) through their link to the owning
    /// specialist. Filtering and ordering belong to the dashboard layer.
    pub fn joined_assessments(&self) -> Vec<JoinedAssessment<'_>> {
        self.assessments
            .values()
            .map(|assessment| {
                let link = assessment.link_id.and_then(|id| self.links.get(&id));
                let specialist =
                    link.and_then(|l| self.specialists.get(&l.specialist_id));
                JoinedAssessment {
                    assessment,
                    link,
                    specialist,
                }
            })
            .collect()
    }

    // ------------------------
    // Snapshot conversion.
    // ------------------------

    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            specialists: self.specialists.values().cloned().collect(),
            links: self.links.values().cloned().collect(),
            assessments: self.assessments.values().cloned().collect(),
            next_specialist_id: self.next_specialist_id,
            next_link_id: self.next_link_id,
            next_assessment_id: self.next_assessment_id,
        }
    }

    /// Rebuilds a store from a snapshot, re-running row validation and the
    /// relational checks so a hand-edited document cannot smuggle in rows
    /// the insert paths would reject.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StorageError> {
        let mut store = Self::new();
        for specialist in snapshot.specialists {
            specialist.validate()?;
            if store.specialists.contains_key(&specialist.id) {
                return Err(StorageError::DuplicateKey {
                    table: "specialists",
                    key: specialist.id.0.to_string(),
                });
            }
            store.specialists.insert(specialist.id, specialist);
        }
        for link in snapshot.links {
            link.validate()?;
            if !store.specialists.contains_key(&link.specialist_id) {
                return Err(StorageError::ForeignKeyViolation {
                    table: "links.specialist_id",
                    key: link.specialist_id.0.to_string(),
                });
            }
            if store.links.contains_key(&link.id) {
                return Err(StorageError::DuplicateKey {
                    table: "links",
                    key: link.id.0.to_string(),
                });
            }
            if store
                .link_ids_by_token
                .insert(link.token.as_str().to_string(), link.id)
                .is_some()
            {
                return Err(StorageError::DuplicateKey {
                    table: "links.token",
                    key: link.token.as_str().to_string(),
                });
            }
            store.links.insert(link.id, link);
        }
        for assessment in snapshot.assessments {
            if let Some(link_id) = assessment.link_id {
                if !store.links.contains_key(&link_id) {
                    return Err(StorageError::ForeignKeyViolation {
                        table: "assessments.link_id",
                        key: link_id.0.to_string(),
                    });
                }
            }
            if store.assessments.contains_key(&assessment.id) {
                return Err(StorageError::DuplicateKey {
                    table: "assessments",
                    key: assessment.id.0.to_string(),
                });
            }
            store.assessments.insert(assessment.id, assessment);
        }

        let max_id = |keys: Vec<u64>| keys.into_iter().max().unwrap_or(0);
        store.next_specialist_id = snapshot
            .next_specialist_id
            .max(max_id(store.specialists.keys().map(|k| k.0).collect()) + 1);
        store.next_link_id = snapshot
            .next_link_id
            .max(max_id(store.links.keys().map(|k| k.0).collect()) + 1);
        store.next_assessment_id = snapshot
            .next_assessment_id
            .max(max_id(store.assessments.keys().map(|k| k.0).collect()) + 1);
        Ok(store)
    }
}
