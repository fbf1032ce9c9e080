use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use letter_core::require_identity;
use letter_types::models::AccountId;

use crate::auth::AppState;
use crate::error::ApiError;

/// Identity of the authenticated caller, inserted by [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub AccountId);

/// Resolve the bearer token to an account id. A missing, malformed or
/// unverifiable Authorization header is "no identity", rejected as
/// unauthorized.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = bearer
        .ok()
        .and_then(|TypedHeader(auth)| state.core.verify_token(auth.token()));
    let caller = require_identity(identity)?;

    req.extensions_mut().insert(Caller(caller));
    Ok(next.run(req).await)
}
