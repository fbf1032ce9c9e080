use std::path::PathBuf;
use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;

use letter_core::Core;
use letter_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::scope::RequestScope;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub core: Core,
    /// Directory uploaded avatars are written to and served from.
    pub upload_dir: PathBuf,
}

pub async fn register(
    State(state): State<AppState>,
    scope: RequestScope,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state
        .core
        .directory()
        .register(&req.name, &req.password, scope.token())
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { id })))
}

pub async fn login(
    State(state): State<AppState>,
    scope: RequestScope,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .core
        .directory()
        .login(&req.name, &req.password, scope.token())
        .await?;

    Ok(Json(LoginResponse { token }))
}
