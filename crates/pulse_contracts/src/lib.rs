#![forbid(unsafe_code)]

pub mod assessment;
pub mod common;
pub mod link;
pub mod specialist;

pub use common::{ContractViolation, Validate};
