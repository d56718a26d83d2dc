use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{Credentials, LoginResponse, MessageResponse},
        jwt::JwtKeys,
        password::{hash_in_background, verify_in_background},
        repo::is_unique_violation,
        repo_types::User,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Where the landing page sends the browser after login.
pub const LOGIN_REDIRECT: &str = "/dashboard";

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "malformed register body");
        ApiError::bad_request("Missing username or password")
    })?;
    let (username, password) = payload
        .into_parts()
        .ok_or_else(|| ApiError::bad_request("Missing username or password"))?;

    let hash = hash_in_background(password).await?;

    // uniqueness is enforced by the users.username constraint
    let user = match User::create(&state.db, &username, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(%username, "username already registered");
            return Err(ApiError::bad_request("Username already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let (username, password) = payload
        .ok()
        .and_then(|Json(c)| c.into_parts())
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    let user = match User::find_by_username(&state.db, &username).await? {
        Some(u) => u,
        None => {
            warn!(%username, "login unknown username");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
    };

    if !verify_in_background(password, user.password_hash.clone()).await? {
        warn!(%username, user_id = user.id, "login invalid password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user.username)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        token,
        redirect: LOGIN_REDIRECT.into(),
    }))
}
