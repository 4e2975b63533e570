#![forbid(unsafe_code)]

pub mod snapshot;
pub mod store;

pub use store::{JoinedAssessment, Store, StorageError};
