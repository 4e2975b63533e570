#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::AppRuntime;

pub mod admin;
pub mod api;
pub mod public;

/// The one reusable authorization check wrapping every administrative
/// handler: no valid admin session, no dispatch, just a redirect to the
/// login entry point instead of an error page.
pub async fn require_admin(
    State(runtime): State<Arc<AppRuntime>>,
    request: Request,
    next: Next,
) -> Response {
    if runtime.is_admin(request.headers()) {
        next.run(request).await
    } else {
        Redirect::to("/admin/login").into_response()
    }
}
