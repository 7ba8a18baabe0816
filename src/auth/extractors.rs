use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::dto::{JwtKeys, TokenKind};
use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller, loaded from the database on every request so role,
/// preferences and account state are current.
pub struct CurrentUser(pub User);

pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))
}

/// Reject tokens issued before the user's last password change.
///
/// `iat` has whole-second resolution, so a token stamped in the same second
/// as the change is treated as stale.
pub(crate) fn ensure_issued_after_password_change(user: &User, iat: usize) -> Result<(), AppError> {
    match user.password_changed_at {
        Some(changed) if (iat as i64) <= changed.unix_timestamp() => {
            warn!(user_id = %user.id, "token predates password change");
            Err(AppError::Unauthorized(
                "password was changed, please log in again".into(),
            ))
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let keys = JwtKeys::from_ref(state);

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::Unauthorized("invalid or expired token".into())
        })?;
        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthorized("access token required".into()));
        }

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("user no longer exists".into()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("account is deactivated".into()));
        }
        ensure_issued_after_password_change(&user, claims.iat)?;

        Ok(CurrentUser(user))
    }
}
