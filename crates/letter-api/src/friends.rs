use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use letter_types::api::{AccountResponse, AddFriendRequest};
use letter_types::models::AccountId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::scope::RequestScope;

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    scope: RequestScope,
) -> Result<impl IntoResponse, ApiError> {
    let friends = state.core.graph().list_friends(caller, scope.token()).await?;
    Ok(Json(
        friends
            .into_iter()
            .map(AccountResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn add_friend(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    scope: RequestScope,
    WithRejection(Json(req), _): WithRejection<Json<AddFriendRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .core
        .graph()
        .add_friend(caller, req.friend_id, scope.token())
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn delete_friend(
    State(state): State<AppState>,
    WithRejection(Path(friend_id), _): WithRejection<Path<i64>, ApiError>,
    Extension(Caller(caller)): Extension<Caller>,
    scope: RequestScope,
) -> Result<impl IntoResponse, ApiError> {
    state
        .core
        .graph()
        .delete_friend(caller, AccountId(friend_id), scope.token())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
