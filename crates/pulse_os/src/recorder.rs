#![forbid(unsafe_code)]

use jiff::Timestamp;

use pulse_contracts::assessment::{AssessmentId, AssessmentRecord, HIGH_SCORE_MIN};
use pulse_contracts::link::LinkId;
use pulse_storage::{StorageError, Store};

/// Where a submission goes next: high scores straight to thanks, low
/// scores to the feedback-collection form carrying the new assessment id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreRoute {
    Thanks,
    Feedback,
}

pub fn route_for_score(score: i32) -> ScoreRoute {
    if score >= HIGH_SCORE_MIN {
        ScoreRoute::Thanks
    } else {
        ScoreRoute::Feedback
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedScore {
    pub assessment: AssessmentRecord,
    pub route: ScoreRoute,
}

/// Stores the score unconditionally (any integer is accepted) and
/// reports the follow-up route.
pub fn record_score(
    store: &mut Store,
    link_id: Option<LinkId>,
    score: i32,
    now: Timestamp,
) -> Result<RecordedScore, StorageError> {
    let assessment = store.record_assessment(score, link_id, now)?;
    Ok(RecordedScore {
        route: route_for_score(assessment.score),
        assessment,
    })
}

/// Attaches (or re-attaches) the free-text comment. Idempotent overwrite,
/// last write wins.
pub fn attach_comment(
    store: &mut Store,
    assessment_id: AssessmentId,
    comment: &str,
) -> Result<(), StorageError> {
    store.attach_comment(assessment_id, comment)
}
