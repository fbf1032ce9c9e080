use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use letter_types::api::{MessageResponse, SendMessageRequest};
use letter_types::models::AccountId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::scope::RequestScope;

/// GET /messages/{other_id} — the caller's conversation with `other_id`,
/// oldest first, timestamps rendered as `YYYY/MM/DD hh:mm:ss`.
pub async fn get_messages(
    State(state): State<AppState>,
    WithRejection(Path(other_id), _): WithRejection<Path<i64>, ApiError>,
    Extension(Caller(caller)): Extension<Caller>,
    scope: RequestScope,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state
        .core
        .ledger()
        .list_conversation(caller, AccountId(other_id), scope.token())
        .await?;

    Ok(Json(
        messages
            .into_iter()
            .map(MessageResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn send_message(
    State(state): State<AppState>,
    WithRejection(Path(other_id), _): WithRejection<Path<i64>, ApiError>,
    Extension(Caller(caller)): Extension<Caller>,
    scope: RequestScope,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .core
        .ledger()
        .append(caller, AccountId(other_id), &req.body, scope.token())
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}
