#![forbid(unsafe_code)]

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::link::LinkId;

/// Scores at or above this value route to the thanks flow; lower scores
/// route to the feedback-collection flow. Fixed business rule on the
/// implied 0..=10 scale, not configurable.
pub const HIGH_SCORE_MIN: i32 = 9;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AssessmentId(pub u64);

/// One submitted score.
///
/// `score` is stored as given: the expected range is 0..=10 but nothing
/// enforces it. `link_id` is nullable because rows from before the link era
/// carry no reference; the consume path always sets it. The reverse
/// link -> assessment lookup is derived by query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: AssessmentId,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub link_id: Option<LinkId>,
}

impl AssessmentRecord {
    pub fn v1(
        id: AssessmentId,
        score: i32,
        created_at: Timestamp,
        link_id: Option<LinkId>,
    ) -> Self {
        Self {
            id,
            score,
            comment: None,
            created_at,
            link_id,
        }
    }

    pub fn is_high_score(&self) -> bool {
        self.score >= HIGH_SCORE_MIN
    }
}
