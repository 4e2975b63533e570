#![forbid(unsafe_code)]

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

use pulse_contracts::link::{LinkToken, TOKEN_LEN};

/// Generates link tokens from the OS CSPRNG.
///
/// The generator never checks table uniqueness; the link lifecycle retries
/// on the store's duplicate-token error instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenEngine;

impl TokenEngine {
    pub fn generate(&self) -> LinkToken {
        let raw: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        LinkToken::new(raw).expect("generated token must satisfy its own contract")
    }
}
