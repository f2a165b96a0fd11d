//! Render and send endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::mailing::{DeliveryFailure, DeliveryOutcome, OutboundMessage, RenderRequest};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/v1/render - Render a template with the given values
#[tracing::instrument(
    name = "http.render",
    skip(state, request),
    fields(template = %request.template_name())
)]
pub async fn render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    let html = state.dispatcher.render(&request)?;
    Ok(Json(RenderResponse { html }))
}

/// POST /api/v1/send - Forward a batch of rendered mail to the delivery endpoint
#[tracing::instrument(name = "http.send", skip(state, messages), fields(count = messages.len()))]
pub async fn send(
    State(state): State<AppState>,
    Json(messages): Json<Vec<OutboundMessage>>,
) -> Result<(StatusCode, Json<SendResponse>)> {
    if messages.is_empty() {
        return Err(AppError::Validation(
            "At least one message is required".to_string(),
        ));
    }

    let response = match state.dispatcher.send(&messages).await? {
        DeliveryOutcome::Delivered { status } => (
            StatusCode::OK,
            Json(SendResponse {
                delivered: true,
                status: Some(status),
                error: None,
            }),
        ),
        DeliveryOutcome::Failed(failure) => {
            let status = match &failure {
                DeliveryFailure::Status { status, .. } => Some(*status),
                _ => None,
            };
            (
                StatusCode::BAD_GATEWAY,
                Json(SendResponse {
                    delivered: false,
                    status,
                    error: Some(failure.to_string()),
                }),
            )
        }
    };

    Ok(response)
}
