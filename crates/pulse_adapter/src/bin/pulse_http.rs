#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use pulse_adapter::{router, AppConfig, AppRuntime};
use pulse_storage::{snapshot, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::from_env();
    let store = match &config.snapshot_path {
        Some(path) => match snapshot::load(path)? {
            Some(store) => {
                let tables = store.to_snapshot();
                info!(
                    "loaded snapshot from {}: {} specialist(s), {} link(s), {} assessment(s)",
                    path.display(),
                    tables.specialists.len(),
                    tables.links.len(),
                    tables.assessments.len(),
                );
                store
            }
            None => Store::new(),
        },
        None => Store::new(),
    };

    let addr: SocketAddr = config.bind.parse()?;
    let runtime = Arc::new(AppRuntime::new(config, store));
    let app = router(runtime);

    let listener = TcpListener::bind(addr).await?;
    info!("pulse_http listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("pulse_http shut down");
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
