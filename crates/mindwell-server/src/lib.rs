//! MindWell Server — HTTP surface of the intake service.
//!
//! Every protected route resolves the session cookie first (see
//! [`session`]) and only then touches the submission store.

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::get,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

use config::{ConfigError, ServerConfig};
use error::StartupError;
use routes::{auth, intake, submissions};
use state::AppState;

/// Build the application router.
pub fn app(state: AppState, allowed_origin: Option<&str>) -> Result<Router, ConfigError> {
    let allow_origin = match allowed_origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin).map_err(|e| {
            ConfigError::Invalid {
                key: "MINDWELL_ALLOWED_ORIGIN",
                message: e.to_string(),
            }
        })?),
        None => AllowOrigin::any(),
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let public_api = Router::new()
        .route("/api/submissions", get(submissions::public_list))
        .layer(cors);

    let router = Router::new()
        .route("/", get(intake::home).post(intake::submit))
        .route("/login", get(auth::entry_page).post(auth::login))
        .route("/signup", get(auth::entry_page).post(auth::signup))
        .route("/logout", get(auth::logout_page).post(auth::logout))
        .route("/session", get(auth::current_session))
        .route(
            "/submissions",
            get(submissions::list).post(submissions::delete),
        )
        .merge(public_api)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

pub async fn start_server(config: ServerConfig) -> Result<(), StartupError> {
    info!("Initializing state...");
    let state = AppState::new(&config).await?;

    let router = app(state, config.allowed_origin.as_deref())?;

    let address = format!("0.0.0.0:{}", config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
