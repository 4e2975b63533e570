#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;

use tracing::{info, warn};

/// Everything the process needs, read from the environment exactly once at
/// startup and passed down explicitly. No ambient globals.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub admin_login: String,
    pub admin_password: String,
    pub session_secret: String,
    pub public_base_url: String,
    pub default_validity_days: u16,
    pub snapshot_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind = env_or("PULSE_HTTP_BIND", "127.0.0.1:8080");
        let public_base_url = match nonempty_var("PULSE_PUBLIC_BASE_URL") {
            Some(url) => url,
            None => format!("http://{bind}"),
        };
        let admin_login = env_or("PULSE_ADMIN_LOGIN", "admin");
        let admin_password = match nonempty_var("PULSE_ADMIN_PASSWORD") {
            Some(password) => password,
            None => {
                warn!("PULSE_ADMIN_PASSWORD not set, using the development default");
                "secret".to_string()
            }
        };
        let session_secret = match nonempty_var("PULSE_SESSION_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("PULSE_SESSION_SECRET not set, sessions will not survive restarts across deployments");
                "pulse-development-secret".to_string()
            }
        };
        let snapshot_path = nonempty_var("PULSE_SNAPSHOT_PATH").map(PathBuf::from);
        if snapshot_path.is_none() {
            warn!("PULSE_SNAPSHOT_PATH not set, the store is in-memory only");
        }

        Self {
            bind,
            admin_login,
            admin_password,
            session_secret,
            public_base_url,
            default_validity_days: parse_validity_days_from_env(),
            snapshot_path,
        }
    }
}

fn nonempty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    match nonempty_var(key) {
        Some(value) => value,
        None => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    }
}

fn parse_validity_days_from_env() -> u16 {
    env::var("PULSE_LINK_TTL_DAYS")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .filter(|v| (1..=365).contains(v))
        .unwrap_or(7)
}
