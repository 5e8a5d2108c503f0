//! Axum routing table for the ingress.
//!
//! Endpoints:
//! - POST /api/messages - channel activity webhook
//! - GET /status - liveness probe
//! - POST /bots/helpdesk/response - ticketing backend callback

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{get_status, post_helpdesk_response, post_message, AppState};

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/messages", post(post_message))
        .route("/status", get(get_status))
        .route("/bots/helpdesk/response", post(post_helpdesk_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::session::MemorySessionStore;
    use crate::adapters::transport::RecordingTransport;
    use crate::application::Orchestrator;

    use super::*;

    fn test_state() -> AppState {
        let orchestrator = Orchestrator::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(RecordingTransport::new()),
        );
        AppState::new(Arc::new(orchestrator))
    }

    #[tokio::test]
    async fn test_status_endpoint_reports_alive() {
        let app = app_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_activity_type_is_acknowledged() {
        let app = app_router(test_state());
        let body = serde_json::json!({
            "type": "typing",
            "conversation": {"id": "conv-1"},
            "from": {"id": "user-1"}
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/messages")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_helpdesk_callback_without_backend_is_not_found() {
        let app = app_router(test_state());
        let body = serde_json::json!({
            "conversationId": "conv-1",
            "completed": false,
            "score": 1.0,
            "body": []
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/bots/helpdesk/response")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
