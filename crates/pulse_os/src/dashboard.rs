#![forbid(unsafe_code)]

use jiff::civil::Date;
use jiff::Timestamp;
use serde::Deserialize;

use pulse_contracts::assessment::AssessmentId;
use pulse_contracts::specialist::SpecialistId;
use pulse_engines::dashboard::{
    parse_day_filter, parse_id_filter, parse_score_filter, score_stats, utc_day, ScoreStats,
};
use pulse_storage::Store;

/// Raw query-string input, exactly as submitted. Kept around so the
/// dashboard form can echo the values back regardless of whether they
/// parsed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDashboardQuery {
    pub score: Option<String>,
    pub specialist_id: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Parsed filter set. Filters are independent and conjunctive; a field is
/// `None` when its parameter was absent, empty, or malformed. Lenient by
/// contract: malformed optional input is dropped, not reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFilter {
    pub score: Option<i32>,
    pub specialist_id: Option<SpecialistId>,
    pub name_substring: Option<String>,
    pub position_substring: Option<String>,
    pub day_from: Option<Date>,
    pub day_to: Option<Date>,
}

impl DashboardFilter {
    pub fn from_raw(raw: &RawDashboardQuery) -> Self {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            score: raw.score.as_deref().and_then(parse_score_filter),
            specialist_id: raw
                .specialist_id
                .as_deref()
                .and_then(parse_id_filter)
                .map(SpecialistId),
            name_substring: text(&raw.name),
            position_substring: text(&raw.position),
            day_from: raw.date_from.as_deref().and_then(parse_day_filter),
            day_to: raw.date_to.as_deref().and_then(parse_day_filter),
        }
    }
}

/// One row of the filtered listing, with the transitively derived
/// specialist columns already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRow {
    pub assessment_id: AssessmentId,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub specialist_id: Option<SpecialistId>,
    pub specialist_name: Option<String>,
    pub specialist_position: Option<String>,
}

/// Aggregates for the single specialist pinned by the id filter,
/// restricted to the filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialistBreakdown {
    pub specialist_id: SpecialistId,
    pub name: String,
    pub stats: ScoreStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReport {
    pub rows: Vec<DashboardRow>,
    pub count: usize,
    pub mean_score: f64,
    pub specialist: Option<SpecialistBreakdown>,
}

/// Runs the filtered read over assessment -> link -> specialist, newest
/// first, and computes the aggregates.
pub fn query(store: &Store, filter: &DashboardFilter) -> DashboardReport {
    let mut rows: Vec<DashboardRow> = store
        .joined_assessments()
        .into_iter()
        .filter(|row| {
            if let Some(score) = filter.score {
                if row.assessment.score != score {
                    return false;
                }
            }
            if let Some(specialist_id) = filter.specialist_id {
                match row.link {
                    Some(link) if link.specialist_id == specialist_id => {}
                    _ => return false,
                }
            }
            if let Some(needle) = &filter.name_substring {
                match row.specialist {
                    Some(s) if contains_ci(&s.name, needle) => {}
                    _ => return false,
                }
            }
            if let Some(needle) = &filter.position_substring {
                match row.specialist.and_then(|s| s.position.as_deref()) {
                    Some(position) if contains_ci(position, needle) => {}
                    _ => return false,
                }
            }
            let day = utc_day(row.assessment.created_at);
            if let Some(from) = filter.day_from {
                if day < from {
                    return false;
                }
            }
            if let Some(to) = filter.day_to {
                if day > to {
                    return false;
                }
            }
            true
        })
        .map(|row| DashboardRow {
            assessment_id: row.assessment.id,
            score: row.assessment.score,
            comment: row.assessment.comment.clone(),
            created_at: row.assessment.created_at,
            specialist_id: row.specialist.map(|s| s.id),
            specialist_name: row.specialist.map(|s| s.name.clone()),
            specialist_position: row.specialist.and_then(|s| s.position.clone()),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.assessment_id.cmp(&a.assessment_id))
    });

    let scores: Vec<i32> = rows.iter().map(|r| r.score).collect();
    let overall = score_stats(&scores);

    let specialist = filter.specialist_id.and_then(|specialist_id| {
        store.specialist(specialist_id).map(|record| {
            let own: Vec<i32> = rows
                .iter()
                .filter(|r| r.specialist_id == Some(specialist_id))
                .map(|r| r.score)
                .collect();
            SpecialistBreakdown {
                specialist_id,
                name: record.name.clone(),
                stats: score_stats(&own),
            }
        })
    });

    DashboardReport {
        count: overall.count,
        mean_score: overall.mean,
        specialist,
        rows,
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
