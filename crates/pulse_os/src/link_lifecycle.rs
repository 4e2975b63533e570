#![forbid(unsafe_code)]

use jiff::Timestamp;

use pulse_contracts::assessment::AssessmentRecord;
use pulse_contracts::link::{LinkRecord, LinkResolution};
use pulse_contracts::specialist::SpecialistId;
use pulse_engines::token::TokenEngine;
use pulse_storage::{StorageError, Store};

/// Collisions on a fresh 20-char token are negligible; the bound exists so
/// a broken store cannot spin the create loop forever.
const TOKEN_CREATE_ATTEMPTS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLifecycleConfig {
    pub default_validity_days: u16,
    pub base_url: String,
}

impl LinkLifecycleConfig {
    pub fn mvp_v1() -> Self {
        Self {
            default_validity_days: 7,
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

/// Created (used=false) -> Consumed (used=true, terminal). No other states.
#[derive(Debug, Clone)]
pub struct LinkLifecycleRuntime {
    config: LinkLifecycleConfig,
    tokens: TokenEngine,
}

impl LinkLifecycleRuntime {
    pub fn new(config: LinkLifecycleConfig) -> Self {
        Self {
            config,
            tokens: TokenEngine,
        }
    }

    pub fn default_validity_days(&self) -> u16 {
        self.config.default_validity_days
    }

    pub fn link_url(&self, link: &LinkRecord) -> String {
        format!(
            "{}/assessment/{}",
            self.config.base_url.trim_end_matches('/'),
            link.token.as_str()
        )
    }

    /// Mints a link for one specialist. The specialist may be in any active
    /// state; it only has to exist. A duplicate-token insert is treated as
    /// retryable with a fresh token.
    pub fn create(
        &self,
        store: &mut Store,
        specialist_id: SpecialistId,
        validity_days: Option<u16>,
        now: Timestamp,
    ) -> Result<LinkRecord, StorageError> {
        if store.specialist(specialist_id).is_none() {
            return Err(StorageError::RowNotFound {
                table: "specialists",
                key: specialist_id.0.to_string(),
            });
        }
        let days = validity_days.unwrap_or(self.config.default_validity_days);
        let expires_at = Some(add_days(now, days));

        let mut attempts = 0;
        loop {
            attempts += 1;
            match store.create_link(self.tokens.generate(), specialist_id, now, expires_at) {
                Err(StorageError::DuplicateKey { .. }) if attempts < TOKEN_CREATE_ATTEMPTS => {
                    continue;
                }
                other => return other,
            }
        }
    }

    /// One link per active specialist, in listing order. `RowNotFound` when
    /// no specialist is active.
    pub fn create_for_all_active(
        &self,
        store: &mut Store,
        validity_days: Option<u16>,
        now: Timestamp,
    ) -> Result<Vec<LinkRecord>, StorageError> {
        let active: Vec<SpecialistId> = store
            .specialists_ordered(true)
            .iter()
            .map(|s| s.id)
            .collect();
        if active.is_empty() {
            return Err(StorageError::RowNotFound {
                table: "specialists",
                key: "is_active=true".to_string(),
            });
        }
        let mut links = Vec::with_capacity(active.len());
        for specialist_id in active {
            links.push(self.create(store, specialist_id, validity_days, now)?);
        }
        Ok(links)
    }

    /// Classifies a token for the public scoring path. Checked in this
    /// order: unknown token -> `RowNotFound`; used -> `AlreadyUsed` (even
    /// when also past expiry); expired -> `Expired`; otherwise `Valid`.
    pub fn resolve(
        &self,
        store: &Store,
        token: &str,
        now: Timestamp,
    ) -> Result<LinkResolution, StorageError> {
        let link = store
            .link_by_token(token)
            .ok_or_else(|| StorageError::RowNotFound {
                table: "links",
                key: token.to_string(),
            })?;
        if link.used {
            return Ok(LinkResolution::AlreadyUsed);
        }
        if link.is_expired(now) {
            return Ok(LinkResolution::Expired);
        }
        Ok(LinkResolution::Valid(link.clone()))
    }

    /// Consumes the link and records the assessment in one store
    /// transaction. State is re-checked at write time: of two racing
    /// submissions exactly one succeeds, the other observes `RowNotFound`.
    pub fn consume(
        &self,
        store: &mut Store,
        token: &str,
        score: i32,
        now: Timestamp,
    ) -> Result<AssessmentRecord, StorageError> {
        store.consume_link_recording_assessment(token, score, now)
    }
}

fn add_days(now: Timestamp, days: u16) -> Timestamp {
    let seconds = now
        .as_second()
        .saturating_add(i64::from(days) * 24 * 60 * 60);
    Timestamp::from_second(seconds).unwrap_or(Timestamp::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> LinkLifecycleRuntime {
        LinkLifecycleRuntime::new(LinkLifecycleConfig {
            default_validity_days: 7,
            base_url: "https://pulse.example/".to_string(),
        })
    }

    fn now(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn store_with_specialist() -> (Store, SpecialistId) {
        let mut store = Store::new();
        let specialist = store.create_specialist("Dr. Lang", None).unwrap();
        (store, specialist.id)
    }

    #[test]
    fn at_lifecycle_01_create_applies_the_default_validity() {
        let (mut store, specialist) = store_with_specialist();
        let created = now("2024-01-01T12:00:00Z");
        let link = runtime().create(&mut store, specialist, None, created).unwrap();
        assert_eq!(link.expires_at, Some(now("2024-01-08T12:00:00Z")));
        assert!(!link.used);
    }

    #[test]
    fn at_lifecycle_02_create_honors_a_per_call_validity() {
        let (mut store, specialist) = store_with_specialist();
        let created = now("2024-01-01T12:00:00Z");
        let link = runtime()
            .create(&mut store, specialist, Some(1), created)
            .unwrap();
        assert_eq!(link.expires_at, Some(now("2024-01-02T12:00:00Z")));
    }

    #[test]
    fn at_lifecycle_03_create_for_unknown_specialist_is_not_found() {
        let mut store = Store::new();
        let err = runtime()
            .create(&mut store, SpecialistId(7), None, now("2024-01-01T00:00:00Z"))
            .expect_err("unknown specialist must fail");
        assert!(matches!(
            err,
            StorageError::RowNotFound {
                table: "specialists",
                ..
            }
        ));
    }

    #[test]
    fn at_lifecycle_04_inactive_specialists_still_get_single_links() {
        let (mut store, specialist) = store_with_specialist();
        store.toggle_specialist_active(specialist).unwrap();
        let link = runtime()
            .create(&mut store, specialist, None, now("2024-01-01T00:00:00Z"))
            .unwrap();
        assert_eq!(link.specialist_id, specialist);
    }

    #[test]
    fn at_lifecycle_05_bulk_create_covers_active_specialists_only() {
        let mut store = Store::new();
        let a = store.create_specialist("Adler", None).unwrap().id;
        let b = store.create_specialist("Brandt", None).unwrap().id;
        store.toggle_specialist_active(a).unwrap();

        let links = runtime()
            .create_for_all_active(&mut store, Some(3), now("2024-01-01T00:00:00Z"))
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].specialist_id, b);
    }

    #[test]
    fn at_lifecycle_06_bulk_create_with_no_active_specialists_is_not_found() {
        let mut store = Store::new();
        let a = store.create_specialist("Adler", None).unwrap().id;
        store.toggle_specialist_active(a).unwrap();
        let err = runtime()
            .create_for_all_active(&mut store, None, now("2024-01-01T00:00:00Z"))
            .expect_err("no active specialists must fail");
        assert!(matches!(err, StorageError::RowNotFound { .. }));
    }

    #[test]
    fn at_lifecycle_07_resolve_order_is_unknown_used_expired_valid() {
        let (mut store, specialist) = store_with_specialist();
        let rt = runtime();
        let created = now("2024-01-01T00:00:00Z");
        let link = rt.create(&mut store, specialist, Some(1), created).unwrap();
        let token = link.token.as_str().to_string();

        assert!(matches!(
            rt.resolve(&store, "ghostghostghostghost", created),
            Err(StorageError::RowNotFound { .. })
        ));
        assert_eq!(
            rt.resolve(&store, &token, created).unwrap(),
            LinkResolution::Valid(link.clone())
        );
        assert_eq!(
            rt.resolve(&store, &token, now("2024-01-09T00:00:00Z")).unwrap(),
            LinkResolution::Expired
        );

        rt.consume(&mut store, &token, 5, created).unwrap();
        // Used wins over expired even when both hold.
        assert_eq!(
            rt.resolve(&store, &token, now("2024-01-09T00:00:00Z")).unwrap(),
            LinkResolution::AlreadyUsed
        );
    }

    #[test]
    fn at_lifecycle_08_consume_races_leave_one_winner() {
        let (mut store, specialist) = store_with_specialist();
        let rt = runtime();
        let created = now("2024-01-01T00:00:00Z");
        let link = rt.create(&mut store, specialist, None, created).unwrap();
        let token = link.token.as_str().to_string();

        let first = rt.consume(&mut store, &token, 8, created);
        let second = rt.consume(&mut store, &token, 3, created);
        assert!(first.is_ok());
        assert!(matches!(
            second,
            Err(StorageError::RowNotFound { table: "links", .. })
        ));
    }

    #[test]
    fn at_lifecycle_09_link_url_joins_base_and_token() {
        let (mut store, specialist) = store_with_specialist();
        let rt = runtime();
        let link = rt
            .create(&mut store, specialist, None, now("2024-01-01T00:00:00Z"))
            .unwrap();
        let url = rt.link_url(&link);
        assert_eq!(
            url,
            format!("https://pulse.example/assessment/{}", link.token.as_str())
        );
    }
}
