//! Cadence Web Server
//!
//! Axum-based REST API that publishes the latest analytics report to the
//! dashboard.
//!
//! Security features:
//! - Restrictive CORS policy
//! - Security headers (CSP, frame and sniffing protection)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use cadence_core::{AnalyticsEngine, DataSource, MemoryReportStore};

mod handlers;
pub mod refresh;
mod scheduler;

pub use refresh::{RefreshStatus, RefreshSummary, Refresher};
pub use scheduler::{start_refresh_scheduler, RefreshScheduleConfig, DEFAULT_REFRESH_MINUTES};

/// Server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Periodic refresh schedule (None = refresh only on startup and on demand)
    pub refresh: Option<RefreshScheduleConfig>,
}

/// Shared application state
pub struct AppState {
    pub refresher: Arc<Refresher>,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(
    refresher: Arc<Refresher>,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> Router {
    let state = Arc::new(AppState {
        refresher,
        config: config.clone(),
    });

    let api_routes = Router::new()
        .route("/data", get(handlers::get_data))
        .route("/insights", get(handlers::get_insights))
        .route("/stats", get(handlers::get_stats))
        .route("/refresh", post(handlers::trigger_refresh))
        .route("/refresh/status", get(handlers::get_refresh_status));

    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' blob: data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Run the server until it is shut down
///
/// Performs an initial refresh before binding; a failed initial refresh is
/// logged and the server starts without data.
pub async fn serve(
    source: Option<DataSource>,
    engine: AnalyticsEngine,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.allowed_origins.is_empty() {
        info!("CORS restricted to same-origin requests");
    }

    let refresher = Arc::new(Refresher::new(
        source,
        engine,
        Arc::new(MemoryReportStore::new()),
    ));

    match refresher.source() {
        Some(source) => {
            info!(source = %source, "Loading initial data");
            if let Err(e) = refresher.refresh().await {
                warn!("⚠️  Initial refresh failed, serving without data: {:#}", e);
            }
        }
        None => {
            warn!("⚠️  No data source configured (set CADENCE_SOURCE or GOOGLE_SHEET_ID)");
        }
    }

    match (config.refresh, refresher.source()) {
        (Some(schedule), Some(_)) => start_refresh_scheduler(refresher.clone(), schedule),
        (Some(_), None) => {}
        (None, _) => info!("ℹ️  Automatic refresh disabled"),
    }

    let app = create_router(refresher, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type
///
/// Internal errors are logged with their full cause chain; clients only see
/// the sanitized message.
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!("Internal error: {:#}", err);
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
