mod pdf;

use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use docverify_core::AppConfig;
use docverify_portal::{RetrievalOptions, SessionConfig};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

/// Shared per-process settings. Each lookup still builds its own session.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionConfig>,
    pub retrieval: Arc<RetrievalOptions>,
}

impl AppState {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            session: Arc::new(SessionConfig::from_app_config(config)),
            retrieval: Arc::new(RetrievalOptions::from_app_config(config)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, REQUEST_ID_HEADER.clone()])
        .expose_headers([header::CONTENT_DISPOSITION, REQUEST_ID_HEADER.clone()])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/pdf", get(pdf::missing_code))
        .route("/api/pdf/", get(pdf::missing_code))
        .route("/api/pdf/{code}", get(pdf::get_pdf))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData { status: "ok" },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use docverify_portal::{RetrievalOptions, SessionConfig};

    use super::AppState;

    pub(crate) fn state_for(portal_url: &str) -> AppState {
        AppState {
            session: Arc::new(SessionConfig {
                request_timeout: Duration::from_secs(5),
                ..SessionConfig::default()
            }),
            retrieval: Arc::new(RetrievalOptions::new(portal_url)),
        }
    }
}
