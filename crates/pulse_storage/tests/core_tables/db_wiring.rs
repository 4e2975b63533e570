#![forbid(unsafe_code)]

use jiff::Timestamp;

use pulse_contracts::assessment::AssessmentId;
use pulse_contracts::link::LinkToken;
use pulse_contracts::specialist::SpecialistId;
use pulse_storage::{StorageError, Store};

fn now(s: &str) -> Timestamp {
    s.parse().unwrap()
}

fn token(fill: char) -> LinkToken {
    LinkToken::new(fill.to_string().repeat(20)).unwrap()
}

fn seed_specialist(store: &mut Store, name: &str) -> SpecialistId {
    store.create_specialist(name, Some("therapist")).unwrap().id
}

#[test]
fn links_enforce_specialist_foreign_key() {
    let mut store = Store::new();
    let err = store
        .create_link(token('a'), SpecialistId(99), now("2024-01-01T00:00:00Z"), None)
        .expect_err("unknown specialist must fail");
    assert!(matches!(
        err,
        StorageError::ForeignKeyViolation {
            table: "links.specialist_id",
            ..
        }
    ));
}

#[test]
fn duplicate_tokens_are_rejected() {
    let mut store = Store::new();
    let specialist = seed_specialist(&mut store, "Dr. Lang");
    store
        .create_link(token('a'), specialist, now("2024-01-01T00:00:00Z"), None)
        .unwrap();
    let err = store
        .create_link(token('a'), specialist, now("2024-01-01T00:00:00Z"), None)
        .expect_err("duplicate token must fail");
    assert!(matches!(
        err,
        StorageError::DuplicateKey {
            table: "links.token",
            ..
        }
    ));
}

#[test]
fn consume_flips_used_and_links_the_assessment_atomically() {
    let mut store = Store::new();
    let specialist = seed_specialist(&mut store, "Dr. Lang");
    let link = store
        .create_link(token('a'), specialist, now("2024-01-01T00:00:00Z"), None)
        .unwrap();

    let assessment = store
        .consume_link_recording_assessment(
            link.token.as_str(),
            7,
            now("2024-01-02T00:00:00Z"),
        )
        .unwrap();

    assert_eq!(assessment.link_id, Some(link.id));
    assert_eq!(assessment.score, 7);
    assert!(store.link(link.id).unwrap().used);
    assert_eq!(
        store.assessment(assessment.id).unwrap().link_id,
        Some(link.id)
    );
}

#[test]
fn second_consume_on_the_same_token_observes_not_found() {
    let mut store = Store::new();
    let specialist = seed_specialist(&mut store, "Dr. Lang");
    let link = store
        .create_link(token('a'), specialist, now("2024-01-01T00:00:00Z"), None)
        .unwrap();

    store
        .consume_link_recording_assessment(link.token.as_str(), 9, now("2024-01-02T00:00:00Z"))
        .unwrap();
    let err = store
        .consume_link_recording_assessment(link.token.as_str(), 2, now("2024-01-02T00:00:01Z"))
        .expect_err("consumed link must not consume again");
    assert!(matches!(
        err,
        StorageError::RowNotFound { table: "links", .. }
    ));

    // The losing submission left no assessment row behind.
    let rows = store.joined_assessments();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].assessment.score, 9);
}

#[test]
fn racing_consumers_leave_exactly_one_winner() {
    use std::sync::{Arc, Barrier, Mutex};

    let mut store = Store::new();
    let specialist = seed_specialist(&mut store, "Dr. Lang");
    let link = store
        .create_link(token('a'), specialist, now("2024-01-01T00:00:00Z"), None)
        .unwrap();
    let token = link.token.as_str().to_string();

    let store = Arc::new(Mutex::new(store));
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [9, 3]
        .into_iter()
        .map(|score| {
            let store = store.clone();
            let barrier = barrier.clone();
            let token = token.clone();
            std::thread::spawn(move || {
                barrier.wait();
                store
                    .lock()
                    .unwrap()
                    .consume_link_recording_assessment(&token, score, now("2024-01-02T00:00:00Z"))
                    .is_ok()
            })
        })
        .collect();

    let wins: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(wins.iter().filter(|&&won| won).count(), 1);

    let store = store.lock().unwrap();
    assert!(store.link(link.id).unwrap().used);
    assert_eq!(store.joined_assessments().len(), 1);
}

#[test]
fn linkless_assessments_are_accepted_and_join_to_nothing() {
    let mut store = Store::new();
    let assessment = store
        .record_assessment(4, None, now("2024-01-01T00:00:00Z"))
        .unwrap();
    assert_eq!(assessment.link_id, None);

    let rows = store.joined_assessments();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].link.is_none());
    assert!(rows[0].specialist.is_none());
}

#[test]
fn attach_comment_overwrites_and_reports_missing_rows() {
    let mut store = Store::new();
    let assessment = store
        .record_assessment(4, None, now("2024-01-01T00:00:00Z"))
        .unwrap();

    store.attach_comment(assessment.id, "slow service").unwrap();
    store.attach_comment(assessment.id, "actually fine").unwrap();
    assert_eq!(
        store.assessment(assessment.id).unwrap().comment.as_deref(),
        Some("actually fine")
    );

    let err = store
        .attach_comment(AssessmentId(99), "ghost")
        .expect_err("unknown assessment must fail");
    assert!(matches!(
        err,
        StorageError::RowNotFound {
            table: "assessments",
            ..
        }
    ));
}

#[test]
fn toggle_is_soft_and_leaves_references_intact() {
    let mut store = Store::new();
    let specialist = seed_specialist(&mut store, "Dr. Lang");
    let link = store
        .create_link(token('a'), specialist, now("2024-01-01T00:00:00Z"), None)
        .unwrap();
    store
        .consume_link_recording_assessment(link.token.as_str(), 5, now("2024-01-02T00:00:00Z"))
        .unwrap();

    assert!(!store.toggle_specialist_active(specialist).unwrap());
    assert!(store.toggle_specialist_active(specialist).unwrap());

    let rows = store.joined_assessments();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].specialist.unwrap().id, specialist);

    let err = store
        .toggle_specialist_active(SpecialistId(99))
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
fn specialist_listing_orders_by_name_and_honors_active_only() {
    let mut store = Store::new();
    let zhou = seed_specialist(&mut store, "Zhou");
    seed_specialist(&mut store, "adler");
    seed_specialist(&mut store, "Brandt");
    store.toggle_specialist_active(zhou).unwrap();

    let all: Vec<&str> = store
        .specialists_ordered(false)
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(all, vec!["adler", "Brandt", "Zhou"]);

    let active: Vec<&str> = store
        .specialists_ordered(true)
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(active, vec!["adler", "Brandt"]);
}
