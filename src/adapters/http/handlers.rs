//! HTTP handlers connecting the ingress routes to the turn router.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, info};

use crate::adapters::bots::{HelpdeskBot, HelpdeskCallback};
use crate::application::Orchestrator;
use crate::domain::ConversationError;

use super::dto::{ActivityRequest, ErrorResponse, StatusResponse};

/// Shared application state for the ingress handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Present only when the ticketing backend is enabled; its callback
    /// endpoint answers 404 otherwise.
    pub helpdesk: Option<Arc<HelpdeskBot>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            helpdesk: None,
        }
    }

    pub fn with_helpdesk(mut self, helpdesk: Arc<HelpdeskBot>) -> Self {
        self.helpdesk = Some(helpdesk);
        self
    }
}

/// POST /api/messages - one channel activity per request.
///
/// Message activities run a full turn; conversation updates create sessions
/// and greet joining members. Unrecognized activity types are acknowledged
/// and dropped.
pub async fn post_message(
    State(state): State<AppState>,
    Json(activity): Json<ActivityRequest>,
) -> impl IntoResponse {
    if let Some(event) = activity.to_message_event() {
        let conversation_id = event.conversation_id.clone();
        if let Err(err) = state.orchestrator.process_message(event).await {
            error!(conversation_id, error = %err, "turn processing failed");
            state
                .orchestrator
                .send_turn_error_notice(&conversation_id)
                .await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response();
        }
        return StatusCode::OK.into_response();
    }

    if let Some(event) = activity.to_members_added_event() {
        let conversation_id = event.conversation_id.clone();
        if let Err(err) = state.orchestrator.process_members_added(event).await {
            error!(conversation_id, error = %err, "members-added processing failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response();
        }
        return StatusCode::OK.into_response();
    }

    info!(activity_type = activity.activity_type, "ignoring activity");
    StatusCode::OK.into_response()
}

/// GET /status - liveness probe.
pub async fn get_status() -> impl IntoResponse {
    Json(StatusResponse { status: 200 })
}

/// POST /bots/helpdesk/response - deferred reply callback from the
/// ticketing backend. 404 when the backend is disabled or the conversation
/// is unknown.
pub async fn post_helpdesk_response(
    State(state): State<AppState>,
    Json(callback): Json<HelpdeskCallback>,
) -> impl IntoResponse {
    let Some(helpdesk) = &state.helpdesk else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "ticketing backend is not enabled".to_string(),
            }),
        )
            .into_response();
    };

    match helpdesk.handle_callback(callback).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err @ ConversationError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
        Err(err) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}
