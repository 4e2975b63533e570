#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use jiff::Timestamp;
use serde::Deserialize;

use pulse_contracts::assessment::AssessmentId;
use pulse_contracts::link::LinkResolution;
use pulse_os::recorder::{self, ScoreRoute};

use crate::pages::{assets, escape_html, fill};
use crate::{AppError, AppRuntime};

pub async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

pub async fn thanks() -> Html<&'static str> {
    Html(assets::THANKS_HTML)
}

pub async fn assessment_form(
    State(runtime): State<Arc<AppRuntime>>,
    Path(token): Path<String>,
) -> Result<Html<String>, AppError> {
    let store = runtime.lock_store()?;
    match runtime.lifecycle.resolve(&store, &token, Timestamp::now())? {
        LinkResolution::Valid(link) => {
            let specialist_name = store
                .specialist(link.specialist_id)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            Ok(Html(fill(
                assets::ASSESSMENT_HTML,
                &[
                    ("token", &escape_html(&token)),
                    ("specialist_name", &escape_html(&specialist_name)),
                ],
            )))
        }
        LinkResolution::AlreadyUsed => Err(AppError::LinkUsed),
        LinkResolution::Expired => Err(AppError::LinkExpired),
    }
}

#[derive(Debug, Deserialize)]
pub struct ScoreForm {
    pub score: i32,
}

pub async fn submit_score(
    State(runtime): State<Arc<AppRuntime>>,
    Path(token): Path<String>,
    Form(form): Form<ScoreForm>,
) -> Result<Redirect, AppError> {
    let mut store = runtime.lock_store()?;
    let assessment = runtime
        .lifecycle
        .consume(&mut store, &token, form.score, Timestamp::now())?;
    runtime.persist(&store);

    match recorder::route_for_score(assessment.score) {
        ScoreRoute::Thanks => Ok(Redirect::to("/thanks")),
        ScoreRoute::Feedback => Ok(Redirect::to(&format!(
            "/feedback?assessment_id={}",
            assessment.id.0
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    pub assessment_id: Option<String>,
}

pub async fn feedback_form(
    State(runtime): State<Arc<AppRuntime>>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Html<String>, AppError> {
    let id = query
        .assessment_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .ok_or(AppError::NotFound)?;
    let store = runtime.lock_store()?;
    let assessment = store
        .assessment(AssessmentId(id))
        .ok_or(AppError::NotFound)?;
    Ok(Html(fill(
        assets::FEEDBACK_HTML,
        &[
            ("assessment_id", &assessment.id.0.to_string()),
            ("score", &assessment.score.to_string()),
        ],
    )))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub assessment_id: u64,
    pub comment: String,
}

pub async fn submit_feedback(
    State(runtime): State<Arc<AppRuntime>>,
    Form(form): Form<FeedbackForm>,
) -> Result<Html<&'static str>, AppError> {
    let mut store = runtime.lock_store()?;
    recorder::attach_comment(&mut store, AssessmentId(form.assessment_id), &form.comment)?;
    runtime.persist(&store);
    Ok(Html(assets::FEEDBACK_THANKS_HTML))
}
