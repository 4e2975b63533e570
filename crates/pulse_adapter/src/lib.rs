#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::HeaderMap;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tracing::warn;

use pulse_engines::session::SessionKeeper;
use pulse_os::link_lifecycle::{LinkLifecycleConfig, LinkLifecycleRuntime};
use pulse_storage::{snapshot, Store};

pub mod config;
pub mod cookies;
pub mod error;
pub mod pages;
pub mod routes;

pub use config::AppConfig;
pub use error::AppError;

/// Shared per-process state: the configuration, the store behind its lock,
/// and the engines built from the configuration at startup.
pub struct AppRuntime {
    pub config: AppConfig,
    store: Mutex<Store>,
    pub lifecycle: LinkLifecycleRuntime,
    pub sessions: SessionKeeper,
}

impl AppRuntime {
    pub fn new(config: AppConfig, store: Store) -> Self {
        let lifecycle = LinkLifecycleRuntime::new(LinkLifecycleConfig {
            default_validity_days: config.default_validity_days,
            base_url: config.public_base_url.clone(),
        });
        let sessions = SessionKeeper::from_secret(&config.session_secret);
        Self {
            config,
            store: Mutex::new(store),
            lifecycle,
            sessions,
        }
    }

    pub fn lock_store(&self) -> Result<MutexGuard<'_, Store>, AppError> {
        self.store.lock().map_err(|_| AppError::LockPoisoned)
    }

    /// Writes the snapshot after a mutating request. Persistence failure is
    /// logged and swallowed: the in-memory store stays authoritative for
    /// the life of the process.
    pub fn persist(&self, store: &Store) {
        let Some(path) = &self.config.snapshot_path else {
            return;
        };
        if let Err(err) = snapshot::save(path, store) {
            warn!("snapshot write to {} failed: {err}", path.display());
        }
    }

    pub fn is_admin(&self, headers: &HeaderMap) -> bool {
        cookies::session_cookie_value(headers)
            .and_then(|sealed| self.sessions.open(&sealed))
            .map(|claims| claims.admin_logged_in)
            .unwrap_or(false)
    }
}

pub fn router(runtime: Arc<AppRuntime>) -> Router {
    // Every administrative route, HTML and JSON alike, sits behind the
    // same guard; an unauthenticated hit redirects to the login form.
    let admin = Router::new()
        .route("/admin", get(routes::admin::dashboard))
        .route(
            "/admin/generate-link",
            get(routes::admin::generate_link_form).post(routes::admin::generate_link_submit),
        )
        .route("/admin/specialists", get(routes::admin::specialists_page))
        .route(
            "/admin/specialists/add",
            get(routes::admin::specialist_add_form).post(routes::admin::specialist_add_submit),
        )
        .route(
            "/admin/specialists/:id/toggle",
            get(routes::admin::specialist_toggle),
        )
        .route("/db", get(routes::admin::db_dump))
        .route("/api/generate-link", get(routes::api::generate_link))
        .route("/api/generate-links", get(routes::api::generate_links))
        .route("/api/specialists", get(routes::api::specialists))
        .route_layer(middleware::from_fn_with_state(
            runtime.clone(),
            routes::require_admin,
        ));

    Router::new()
        .route("/", get(routes::public::index))
        .route("/assessment/:token", get(routes::public::assessment_form))
        .route("/submit/:token", post(routes::public::submit_score))
        .route("/feedback", get(routes::public::feedback_form))
        .route("/submit_feedback", post(routes::public::submit_feedback))
        .route("/thanks", get(routes::public::thanks))
        .route(
            "/admin/login",
            get(routes::admin::login_form).post(routes::admin::login_submit),
        )
        .route("/admin/logout", get(routes::admin::logout))
        .merge(admin)
        .with_state(runtime)
}
