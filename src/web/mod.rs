//! HTTP dashboard: server-rendered page plus the JSON API it calls.

mod page;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::{HealthError, LifestyleInput, RiskAssessment, UserProfile};
use crate::service::{ChatTurn, HealthService};

pub use page::{Mode, SessionContext, Theme};

type AppState = Arc<HealthService>;

pub fn router(service: Arc<HealthService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(dashboard))
        .route("/api/login", post(login))
        .route("/api/profile/:username", get(profile))
        .route("/api/estimate", post(estimate))
        .route("/api/analyze", post(analyze))
        .route("/api/chat", post(chat))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(service: Arc<HealthService>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!(addr = %bind, model = %service.model(), "health dashboard listening");
    axum::serve(listener, router(service))
        .await
        .context("HTTP server error")?;
    Ok(())
}

/// Every failure becomes a JSON `{error}` body; the session carries on.
pub struct ApiError(HealthError);

impl From<HealthError> for ApiError {
    fn from(err: HealthError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HealthError::InvalidUsername(_) | HealthError::EmptyMessage => StatusCode::BAD_REQUEST,
            HealthError::NotFound(_) => StatusCode::NOT_FOUND,
            HealthError::Provider(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    username: String,
    #[serde(flatten)]
    input: LifestyleInput,
}

#[derive(Deserialize)]
struct ChatRequest {
    username: String,
    message: String,
}

async fn health() -> &'static str {
    "OK"
}

async fn dashboard(
    State(service): State<AppState>,
    Query(session): Query<SessionContext>,
) -> Result<Html<String>, ApiError> {
    let profile = match session.username() {
        Some(username) => Some(service.login(username).await?),
        None => None,
    };
    Ok(Html(page::render(&session, profile.as_ref(), service.model())))
}

async fn login(
    State(service): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(service.login(&body.username).await?))
}

async fn profile(
    State(service): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(service.profile(&username).await?))
}

async fn estimate(Json(input): Json<LifestyleInput>) -> Json<RiskAssessment> {
    Json(RiskAssessment::local(&input.clamped()))
}

async fn analyze(
    State(service): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<RiskAssessment>, ApiError> {
    Ok(Json(service.analyze(&body.username, body.input).await?))
}

async fn chat(
    State(service): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    Ok(Json(service.chat(&body.username, &body.message).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{create_test_service, MockCompletion};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(mock: Arc<MockCompletion>) -> (tempfile::TempDir, Router) {
        let (dir, service) = create_test_service(mock);
        (dir, router(Arc::new(service)))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = app(Arc::new(MockCompletion::replying("ok")));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_endpoint() {
        let (_dir, app) = app(Arc::new(MockCompletion::replying("Risk Score: 42")));
        let body = json!({
            "username": "alice",
            "sleep": 7, "exercise": 3, "water": 6, "screen": 6, "stress": "Medium"
        });

        let response = app.oneshot(post_json("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = read_json(response).await;
        assert_eq!(json["total_score"], 35);
        assert_eq!(json["model_score"], 42);
        assert_eq!(json["component_scores"]["Exercise"], 12);
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let (_dir, app) = app(Arc::new(MockCompletion::failing()));
        let body = json!({"username": "alice", "message": "hi"});

        let response = app.oneshot(post_json("/api/chat", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = read_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_blank_username_is_bad_request() {
        let (_dir, app) = app(Arc::new(MockCompletion::replying("ok")));
        let response = app
            .oneshot(post_json("/api/login", json!({"username": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let (_dir, app) = app(Arc::new(MockCompletion::replying("ok")));
        let response = app
            .oneshot(Request::get("/api/profile/ghost").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_estimate_needs_no_model() {
        let mock = Arc::new(MockCompletion::failing());
        let (_dir, app) = app(mock.clone());
        let body = json!({"sleep": 0, "exercise": 0, "water": 0, "screen": 16, "stress": "High"});

        let response = app.oneshot(post_json("/api/estimate", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["total_score"], 112);
        assert!(mock.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_creates_profile() {
        let (_dir, app) = app(Arc::new(MockCompletion::replying("ok")));
        let response = app
            .clone()
            .oneshot(
                Request::get("/?username=dana&theme=dark&mode=chat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Logged in as dana"));

        let response = app
            .oneshot(Request::get("/api/profile/dana").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
