#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use pulse_contracts::link::LinkRecord;
use pulse_contracts::specialist::SpecialistId;
use pulse_os::registry;
use pulse_storage::StorageError;

use crate::{AppError, AppRuntime};

#[derive(Debug, Serialize)]
pub struct LinkPayload {
    pub token: String,
    pub url: String,
    pub specialist_id: u64,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct LinkBatchPayload {
    pub count: usize,
    pub links: Vec<LinkPayload>,
}

#[derive(Debug, Serialize)]
pub struct SpecialistPayload {
    pub id: u64,
    pub name: String,
    pub position: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub error: String,
}

fn failure(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ApiFailure {
            error: error.to_string(),
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct GenerateLinkQuery {
    pub specialist_id: Option<String>,
    pub days_valid: Option<String>,
}

fn parse_days(raw: &Option<String>) -> Option<u16> {
    raw.as_deref().and_then(|v| v.trim().parse::<u16>().ok())
}

fn link_payload(runtime: &AppRuntime, link: &LinkRecord) -> LinkPayload {
    LinkPayload {
        token: link.token.as_str().to_string(),
        url: runtime.lifecycle.link_url(link),
        specialist_id: link.specialist_id.0,
        expires_at: link.expires_at,
    }
}

pub async fn generate_link(
    State(runtime): State<Arc<AppRuntime>>,
    Query(query): Query<GenerateLinkQuery>,
) -> Result<Response, AppError> {
    let Some(specialist_id) = query
        .specialist_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
    else {
        return Ok(failure(
            StatusCode::BAD_REQUEST,
            "specialist_id is required",
        ));
    };
    let Ok(specialist_id) = specialist_id.parse::<u64>() else {
        return Ok(failure(
            StatusCode::BAD_REQUEST,
            "specialist_id must be an integer",
        ));
    };

    let mut store = runtime.lock_store()?;
    match runtime.lifecycle.create(
        &mut store,
        SpecialistId(specialist_id),
        parse_days(&query.days_valid),
        Timestamp::now(),
    ) {
        Ok(link) => {
            runtime.persist(&store);
            Ok((StatusCode::OK, Json(link_payload(&runtime, &link))).into_response())
        }
        Err(StorageError::RowNotFound { .. }) => {
            Ok(failure(StatusCode::NOT_FOUND, "specialist not found"))
        }
        Err(err) => Err(AppError::from(err)),
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateLinksQuery {
    pub days_valid: Option<String>,
}

pub async fn generate_links(
    State(runtime): State<Arc<AppRuntime>>,
    Query(query): Query<GenerateLinksQuery>,
) -> Result<Response, AppError> {
    let mut store = runtime.lock_store()?;
    match runtime.lifecycle.create_for_all_active(
        &mut store,
        parse_days(&query.days_valid),
        Timestamp::now(),
    ) {
        Ok(links) => {
            runtime.persist(&store);
            let links: Vec<LinkPayload> = links
                .iter()
                .map(|link| link_payload(&runtime, link))
                .collect();
            Ok((
                StatusCode::OK,
                Json(LinkBatchPayload {
                    count: links.len(),
                    links,
                }),
            )
                .into_response())
        }
        Err(StorageError::RowNotFound { .. }) => {
            Ok(failure(StatusCode::NOT_FOUND, "no active specialists"))
        }
        Err(err) => Err(AppError::from(err)),
    }
}

pub async fn specialists(
    State(runtime): State<Arc<AppRuntime>>,
) -> Result<Json<Vec<SpecialistPayload>>, AppError> {
    let store = runtime.lock_store()?;
    let payload = registry::list(&store, true)
        .into_iter()
        .map(|s| SpecialistPayload {
            id: s.id.0,
            name: s.name,
            position: s.position,
        })
        .collect();
    Ok(Json(payload))
}
