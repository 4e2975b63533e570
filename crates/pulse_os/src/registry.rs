#![forbid(unsafe_code)]

use pulse_contracts::specialist::{SpecialistId, SpecialistRecord};
use pulse_storage::{StorageError, Store};

/// A missing name is an expected form outcome, not an error: the HTML
/// layer redisplays the creation form instead of raising.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialistCreateOutcome {
    Created(SpecialistRecord),
    NameMissing,
}

pub fn create_specialist(
    store: &mut Store,
    name: &str,
    position: Option<&str>,
) -> Result<SpecialistCreateOutcome, StorageError> {
    if name.trim().is_empty() {
        return Ok(SpecialistCreateOutcome::NameMissing);
    }
    let record = store.create_specialist(name, position)?;
    Ok(SpecialistCreateOutcome::Created(record))
}

/// Flips the active flag, returning the new state.
pub fn toggle_active(store: &mut Store, id: SpecialistId) -> Result<bool, StorageError> {
    store.toggle_specialist_active(id)
}

/// Name-ordered listing for the management page and filter menus.
pub fn list(store: &Store, active_only: bool) -> Vec<SpecialistRecord> {
    store
        .specialists_ordered(active_only)
        .into_iter()
        .cloned()
        .collect()
}
