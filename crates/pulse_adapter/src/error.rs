#![forbid(unsafe_code)]

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use pulse_storage::StorageError;

use crate::pages::{self, assets};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("this assessment link has already been used")]
    LinkUsed,

    #[error("this assessment link has expired")]
    LinkExpired,

    #[error("runtime lock poisoned")]
    LockPoisoned,

    #[error("session sealing failed")]
    SessionSeal,

    #[error("storage failure: {0:?}")]
    Storage(StorageError),
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::RowNotFound { .. } => AppError::NotFound,
            other => AppError::Storage(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, body) = match &self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "Not found",
                "Nothing lives at this address.",
            ),
            AppError::LinkUsed => (
                StatusCode::GONE,
                "Link already used",
                "This assessment link has already been used. Each link accepts exactly one score.",
            ),
            AppError::LinkExpired => (
                StatusCode::GONE,
                "Link expired",
                "This assessment link has expired. Ask for a fresh one.",
            ),
            AppError::LockPoisoned | AppError::SessionSeal | AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "An internal error occurred. Please try again later.",
            ),
        };
        let page = pages::fill(assets::MESSAGE_HTML, &[("title", title), ("body", body)]);
        (status, Html(page)).into_response()
    }
}
