use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, DeactivateRequest, JwtKeys, LoginRequest,
            PreferencesInput, PublicUser, RefreshRequest, RegisterRequest, UpdateProfileRequest,
        },
        extractors::{ensure_issued_after_password_change, CurrentUser},
        password::{check_password_policy, hash_password, verify_password},
        repo_types::{Preferences, Role, User},
    },
    error::{AppError, AppResult},
    extract::AppJson,
    planner::{Headcount, ValidationError},
    state::AppState,
};

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 30;

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    }
    (USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&username.len())
        && USERNAME_RE.is_match(username)
}

/// Turn client preferences into checked ones. Regular users must state both
/// a menu type and a headcount.
pub(crate) fn checked_preferences(
    role: Role,
    input: Option<PreferencesInput>,
) -> Result<Preferences, ValidationError> {
    let input = input.unwrap_or_default();
    let number_of_people = input
        .number_of_people
        .map(Headcount::try_from)
        .transpose()?;
    let prefs = Preferences {
        menu_type: input.menu_type,
        number_of_people,
    };

    if role == Role::User {
        if prefs.menu_type.is_none() {
            return Err(ValidationError::new(
                "preferences.menu_type",
                "menu type is required",
            ));
        }
        if prefs.number_of_people.is_none() {
            return Err(ValidationError::new(
                "preferences.number_of_people",
                "number of people is required",
            ));
        }
    }
    Ok(prefs)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route("/me/password", post(change_password))
        .route("/me/deactivate", post(deactivate))
}

fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let (access_token, refresh_token) = keys.sign_pair(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    payload.username = payload.username.trim().to_string();

    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err(ValidationError::new(
            "username",
            format!(
                "username must be {USERNAME_MIN_LENGTH}-{USERNAME_MAX_LENGTH} letters, digits or underscores"
            ),
        )
        .into());
    }
    check_password_policy("password", &payload.password)?;

    let role = payload.role.unwrap_or(Role::User);
    if role == Role::Admin {
        warn!(username = %payload.username, "attempt to self-register as admin");
        return Err(AppError::Forbidden("admin accounts cannot be self-registered".into()));
    }
    let prefs = checked_preferences(role, payload.preferences)?;

    if User::find_by_username(&state.db, &payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already registered");
        return Err(AppError::Conflict("username already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.username, &hash, role, prefs).await?;

    info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let username = payload.username.trim();
    let invalid = || AppError::Unauthorized("invalid credentials".into());

    let user = match User::find_by_username(&state.db, username).await? {
        Some(u) => u,
        None => {
            warn!(%username, "login unknown username");
            return Err(invalid());
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }
    if !user.is_active {
        return Err(AppError::Forbidden("account is deactivated".into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized("user not found".into()))?;
    ensure_issued_after_password_change(&user, claims.iat)?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state, user, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<PublicUser>> {
    let input = payload.preferences;
    let mut prefs = user.preferences;
    if let Some(t) = input.menu_type {
        prefs.menu_type = Some(t);
    }
    if let Some(n) = input.number_of_people {
        prefs.number_of_people = Some(Headcount::try_from(n)?);
    }

    let updated = User::update_preferences(&state.db, user.id, prefs).await?;
    info!(user_id = %updated.id, "preferences updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, user, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "change password with wrong current password");
        return Err(AppError::Unauthorized("current password is incorrect".into()));
    }
    check_password_policy("new_password", &payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user.id, &hash).await?;
    info!(user_id = %user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user, payload))]
pub async fn deactivate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<DeactivateRequest>,
) -> AppResult<StatusCode> {
    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("password is incorrect".into()));
    }
    User::deactivate(&state.db, user.id).await?;
    info!(user_id = %user.id, "account deactivated");
    Ok(StatusCode::NO_CONTENT)
}
