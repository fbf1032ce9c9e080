use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use letter_types::api::{AccountResponse, SearchQuery};
use letter_types::models::AccountId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::scope::RequestScope;

/// 2 MB upload limit for avatars
pub const MAX_AVATAR_SIZE: usize = 2 * 1024 * 1024;

/// GET /users/me
pub async fn me(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    scope: RequestScope,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.core.directory().get_by_id(caller, scope.token()).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// GET /users/{id}
pub async fn get_account(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    Extension(_caller): Extension<Caller>,
    scope: RequestScope,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .core
        .directory()
        .get_by_id(AccountId(id), scope.token())
        .await?;
    Ok(Json(AccountResponse::from(account)))
}

/// GET /users/search?name=
pub async fn search(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, ApiError>,
    Extension(_caller): Extension<Caller>,
    scope: RequestScope,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.core.directory().search(&query.name, scope.token()).await?;
    Ok(Json(
        accounts
            .into_iter()
            .map(AccountResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// PUT /users/me/avatar — raw image bytes. Saved as `{upload_dir}/{uuid}.{ext}`;
/// the file name becomes the account's avatar reference.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    scope: RequestScope,
    headers: HeaderMap,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::Rejected(StatusCode::BAD_REQUEST, "empty avatar"));
    }

    if bytes.len() > MAX_AVATAR_SIZE {
        return Err(ApiError::Rejected(StatusCode::PAYLOAD_TOO_LARGE, "avatar too large"));
    }

    let ext = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(image_extension)
        .ok_or(ApiError::Rejected(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "avatar must be png, jpeg, gif or webp",
        ))?;

    let previous = state
        .core
        .directory()
        .get_by_id(caller, scope.token())
        .await?
        .avatar;

    tokio::fs::create_dir_all(&state.upload_dir).await.map_err(|e| {
        error!("Failed to create upload directory {}: {}", state.upload_dir.display(), e);
        e
    })?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    let file_path = state.upload_dir.join(&file_name);
    let mut file = tokio::fs::File::create(&file_path).await.map_err(|e| {
        error!("Failed to create file {}: {}", file_path.display(), e);
        e
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", file_path.display(), e);
        e
    })?;

    let account = match state
        .core
        .directory()
        .update_avatar(caller, &file_name, scope.token())
        .await
    {
        Ok(account) => account,
        Err(e) => {
            // Nothing references the file yet
            tokio::fs::remove_file(&file_path).await.ok();
            return Err(e.into());
        }
    };

    if let Some(old) = previous.as_deref().filter(|old| is_plain_file_name(old)) {
        let old_path = state.upload_dir.join(old);
        if let Err(e) = tokio::fs::remove_file(&old_path).await {
            warn!("Failed to remove replaced avatar {}: {}", old_path.display(), e);
        }
    }

    info!("Stored avatar {} ({} bytes) for {}", file_name, bytes.len(), caller);
    Ok(Json(AccountResponse::from(account)))
}

/// Avatar references are bare file names inside the upload directory.
fn is_plain_file_name(name: &str) -> bool {
    std::path::Path::new(name).file_name().is_some_and(|f| f == name)
}

fn image_extension(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim();
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_map_to_extensions() {
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("IMAGE/JPEG; charset=binary"), Some("jpg"));
        assert_eq!(image_extension("image/svg+xml"), None);
        assert_eq!(image_extension("application/octet-stream"), None);
    }

    #[test]
    fn only_bare_names_are_removed() {
        assert!(is_plain_file_name("3f2a.png"));
        assert!(!is_plain_file_name("../letter.db"));
        assert!(!is_plain_file_name("nested/3f2a.png"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }
}
