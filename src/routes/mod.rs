//! API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::Turn;
use crate::core::{ConversationContext, ReplySource, SessionError, SessionInfo};
use crate::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sessions: usize,
    max_sessions: usize,
    session_idle_secs: u64,
    catalog: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub history: Vec<Turn>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: String,
    pub source: ReplySource,
}

fn session_error(err: SessionError) -> (StatusCode, String) {
    match err {
        SessionError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        SessionError::LimitReached(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.sessions.len().await,
        max_sessions: state.config.max_sessions,
        session_idle_secs: state.config.session_idle_secs,
        catalog: state.config.catalog_source(),
    })
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, String)> {
    let (session_id, history) = state.sessions.create().await.map_err(session_error)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            history,
        }),
    ))
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionInfo>> {
    Json(state.sessions.list().await)
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<MessageResponse> {
    // The engine answers anything; blank input is filtered here like a chat UI would
    if request.message.trim().is_empty() {
        tracing::warn!(session_id = %id, "Rejected empty message");
        return Err((StatusCode::BAD_REQUEST, "Message must not be empty".into()));
    }

    let reply = state
        .sessions
        .send(id, &request.message)
        .await
        .map_err(session_error)?;

    Ok(Json(MessageResponse {
        reply: reply.text,
        source: reply.source,
    }))
}

async fn history(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Vec<Turn>> {
    state
        .sessions
        .history(id)
        .await
        .map(Json)
        .map_err(session_error)
}

async fn context(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ConversationContext> {
    state
        .sessions
        .context(id)
        .await
        .map(Json)
        .map_err(session_error)
}

async fn reset(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<SessionResponse> {
    let history = state.sessions.reset(id).await.map_err(session_error)?;
    Ok(Json(SessionResponse {
        session_id: id,
        history,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.sessions.delete(id).await.map_err(session_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/sessions", post(create_session).get(list_sessions))
        .route("/v1/sessions/:id", delete(delete_session))
        .route("/v1/sessions/:id/messages", post(send_message))
        .route("/v1/sessions/:id/history", get(history))
        .route("/v1/sessions/:id/context", get(context))
        .route("/v1/sessions/:id/reset", post(reset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::core::SessionStore;

    fn app() -> Router {
        app_with(Config::default())
    }

    fn app_with(config: Config) -> Router {
        let sessions = SessionStore::default().with_max_sessions(config.max_sessions);
        let state = AppState {
            config,
            sessions: Arc::new(sessions),
        };
        router().with_state(state)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["catalog"], "builtin");
        assert_eq!(body["max_sessions"], 10_000);
        assert_eq!(body["session_idle_secs"], 1800);
    }

    #[tokio::test]
    async fn test_session_limit_is_503() {
        let app = app_with(Config {
            max_sessions: 1,
            ..Config::default()
        });

        let (status, _) = call(&app, "POST", "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = call(&app, "POST", "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_conversation_over_http() {
        let app = app();

        let (status, body) = call(&app, "POST", "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["history"].as_array().unwrap().len(), 1);
        assert_eq!(body["history"][0]["speaker"], "agent");
        let id = body["session_id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/v1/sessions/{}/messages", id),
            Some(serde_json::json!({ "message": "I want to invest 50 EGLD" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "rule:investment_amount");

        let (_, body) = call(&app, "GET", &format!("/v1/sessions/{}/context", id), None).await;
        assert_eq!(body["investmentAmount"], 50.0);
        assert_eq!(body["investmentCurrency"], "EGLD");

        let (_, body) = call(&app, "GET", &format!("/v1/sessions/{}/history", id), None).await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, body) = call(&app, "POST", &format!("/v1/sessions/{}/reset", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["history"].as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "DELETE", &format!("/v1/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let app = app();
        let (_, body) = call(&app, "POST", "/v1/sessions", None).await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            "POST",
            &format!("/v1/sessions/{}/messages", id),
            Some(serde_json::json!({ "message": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&app, "GET", &format!("/v1/sessions/{}/history", id), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app();
        let uri = format!("/v1/sessions/{}/history", Uuid::new_v4());
        let (status, _) = call(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
