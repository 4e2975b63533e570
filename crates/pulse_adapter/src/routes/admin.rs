#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use jiff::Timestamp;
use serde::Deserialize;

use pulse_contracts::specialist::{SpecialistId, SpecialistRecord};
use pulse_engines::session::SessionClaims;
use pulse_os::dashboard::{self, DashboardFilter, RawDashboardQuery};
use pulse_os::registry::{self, SpecialistCreateOutcome};
use pulse_storage::snapshot::StoreSnapshot;

use crate::cookies;
use crate::pages::{assets, escape_html, fill};
use crate::{AppError, AppRuntime};

// ------------------------
// Session gate endpoints.
// ------------------------

pub async fn login_form() -> Html<String> {
    Html(fill(assets::LOGIN_HTML, &[("error", "")]))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

pub async fn login_submit(
    State(runtime): State<Arc<AppRuntime>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if form.login == runtime.config.admin_login && form.password == runtime.config.admin_password
    {
        let claims = SessionClaims {
            admin_logged_in: true,
            issued_at_unix_s: Timestamp::now().as_second(),
        };
        let sealed = runtime
            .sessions
            .seal(&claims)
            .map_err(|_| AppError::SessionSeal)?;
        Ok((
            AppendHeaders([(header::SET_COOKIE, cookies::session_cookie(&sealed))]),
            Redirect::to("/admin"),
        )
            .into_response())
    } else {
        let page = fill(
            assets::LOGIN_HTML,
            &[("error", "<p class=\"error\">Wrong login or password.</p>")],
        );
        Ok(Html(page).into_response())
    }
}

pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, cookies::clear_session_cookie())]),
        Redirect::to("/"),
    )
}

// ------------------------
// Dashboard.
// ------------------------

pub async fn dashboard(
    State(runtime): State<Arc<AppRuntime>>,
    Query(raw): Query<RawDashboardQuery>,
) -> Result<Html<String>, AppError> {
    let store = runtime.lock_store()?;
    let filter = DashboardFilter::from_raw(&raw);
    let report = dashboard::query(&store, &filter);
    let specialists = registry::list(&store, false);
    drop(store);

    let mut rows = String::new();
    for row in &report.rows {
        let specialist = match (&row.specialist_name, &row.specialist_position) {
            (Some(name), Some(position)) => format!("{name} ({position})"),
            (Some(name), None) => name.clone(),
            _ => "—".to_string(),
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row.assessment_id.0,
            row.score,
            escape_html(&specialist),
            escape_html(row.comment.as_deref().unwrap_or("")),
            row.created_at,
        ));
    }
    if report.rows.is_empty() {
        rows.push_str("<tr><td colspan=\"5\">No assessments match the filters.</td></tr>\n");
    }

    let breakdown = match &report.specialist {
        Some(b) => format!(
            "<p class=\"breakdown\">{}: {} assessment(s), mean {:.2}, min {}, max {}</p>",
            escape_html(&b.name),
            b.stats.count,
            b.stats.mean,
            b.stats.min,
            b.stats.max,
        ),
        None => String::new(),
    };

    let echo = |value: &Option<String>| escape_html(value.as_deref().unwrap_or(""));
    let page = fill(
        assets::DASHBOARD_HTML,
        &[
            ("rows", &rows),
            ("count", &report.count.to_string()),
            ("mean", &format!("{:.2}", report.mean_score)),
            ("breakdown", &breakdown),
            (
                "specialist_options",
                &specialist_options(&specialists, filter.specialist_id),
            ),
            ("score", &echo(&raw.score)),
            ("name", &echo(&raw.name)),
            ("position", &echo(&raw.position)),
            ("date_from", &echo(&raw.date_from)),
            ("date_to", &echo(&raw.date_to)),
        ],
    );
    Ok(Html(page))
}

fn specialist_options(
    specialists: &[SpecialistRecord],
    selected: Option<SpecialistId>,
) -> String {
    let mut options = String::new();
    for specialist in specialists {
        let marker = if selected == Some(specialist.id) {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            "<option value=\"{}\"{marker}>{}</option>\n",
            specialist.id.0,
            escape_html(&specialist.name),
        ));
    }
    options
}

// ------------------------
// Link generation (HTML flow).
// ------------------------

pub async fn generate_link_form(
    State(runtime): State<Arc<AppRuntime>>,
) -> Result<Html<String>, AppError> {
    let store = runtime.lock_store()?;
    let specialists = registry::list(&store, true);
    drop(store);
    Ok(Html(render_generate_link_page(&runtime, &specialists, "")))
}

#[derive(Debug, Deserialize)]
pub struct GenerateLinkForm {
    pub specialist_id: u64,
    pub days_valid: Option<String>,
}

pub async fn generate_link_submit(
    State(runtime): State<Arc<AppRuntime>>,
    Form(form): Form<GenerateLinkForm>,
) -> Result<Html<String>, AppError> {
    let days = form
        .days_valid
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u16>().ok());
    let mut store = runtime.lock_store()?;
    let link = runtime.lifecycle.create(
        &mut store,
        SpecialistId(form.specialist_id),
        days,
        Timestamp::now(),
    )?;
    runtime.persist(&store);
    let specialists = registry::list(&store, true);
    drop(store);

    let url = runtime.lifecycle.link_url(&link);
    let expires = link
        .expires_at
        .map(|at| at.to_string())
        .unwrap_or_else(|| "never".to_string());
    let result = format!(
        "<p class=\"result\">New link: <a href=\"{url}\">{url}</a><br>valid until {expires}</p>",
    );
    Ok(Html(render_generate_link_page(
        &runtime,
        &specialists,
        &result,
    )))
}

fn render_generate_link_page(
    runtime: &AppRuntime,
    specialists: &[SpecialistRecord],
    result: &str,
) -> String {
    fill(
        assets::GENERATE_LINK_HTML,
        &[
            ("specialist_options", &specialist_options(specialists, None)),
            (
                "default_days",
                &runtime.lifecycle.default_validity_days().to_string(),
            ),
            ("result", result),
        ],
    )
}

// ------------------------
// Specialist registry pages.
// ------------------------

pub async fn specialists_page(
    State(runtime): State<Arc<AppRuntime>>,
) -> Result<Html<String>, AppError> {
    let store = runtime.lock_store()?;
    let specialists = registry::list(&store, false);
    drop(store);

    let mut rows = String::new();
    for specialist in &specialists {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><a href=\"/admin/specialists/{}/toggle\">toggle</a></td></tr>\n",
            specialist.id.0,
            escape_html(&specialist.name),
            escape_html(specialist.position.as_deref().unwrap_or("—")),
            if specialist.is_active { "active" } else { "inactive" },
            specialist.id.0,
        ));
    }
    if specialists.is_empty() {
        rows.push_str("<tr><td colspan=\"5\">No specialists yet.</td></tr>\n");
    }
    Ok(Html(fill(assets::SPECIALISTS_HTML, &[("rows", &rows)])))
}

pub async fn specialist_add_form() -> Html<String> {
    Html(fill(assets::SPECIALIST_ADD_HTML, &[("error", "")]))
}

#[derive(Debug, Deserialize)]
pub struct AddSpecialistForm {
    pub name: Option<String>,
    pub position: Option<String>,
}

pub async fn specialist_add_submit(
    State(runtime): State<Arc<AppRuntime>>,
    Form(form): Form<AddSpecialistForm>,
) -> Result<Response, AppError> {
    let mut store = runtime.lock_store()?;
    let outcome = registry::create_specialist(
        &mut store,
        form.name.as_deref().unwrap_or(""),
        form.position.as_deref(),
    )?;
    match outcome {
        SpecialistCreateOutcome::Created(_) => {
            runtime.persist(&store);
            Ok(Redirect::to("/admin/specialists").into_response())
        }
        // A missing name redisplays the form rather than raising.
        SpecialistCreateOutcome::NameMissing => {
            let page = fill(
                assets::SPECIALIST_ADD_HTML,
                &[("error", "<p class=\"error\">Name is required.</p>")],
            );
            Ok(Html(page).into_response())
        }
    }
}

pub async fn specialist_toggle(
    State(runtime): State<Arc<AppRuntime>>,
    Path(id): Path<u64>,
) -> Result<Redirect, AppError> {
    let mut store = runtime.lock_store()?;
    registry::toggle_active(&mut store, SpecialistId(id))?;
    runtime.persist(&store);
    Ok(Redirect::to("/admin/specialists"))
}

// ------------------------
// Raw dump.
// ------------------------

pub async fn db_dump(
    State(runtime): State<Arc<AppRuntime>>,
) -> Result<Json<StoreSnapshot>, AppError> {
    let store = runtime.lock_store()?;
    Ok(Json(store.to_snapshot()))
}
