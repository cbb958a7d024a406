use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::users;
use crate::security::{jwt, password};
use crate::state::AppState;
use crate::validators;

#[derive(Debug, Deserialize)]
pub struct UserInCreate {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UserInLogin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserWithToken {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<UserInCreate>,
) -> AppResult<(StatusCode, Json<UserWithToken>)> {
    let mut violations = Vec::new();
    if !validators::validate_username(&body.username) {
        violations.push("username must be 3-32 characters (letters, digits, - and _)".to_string());
    }
    if !validators::validate_email(&body.email) {
        violations.push("email is not valid".to_string());
    }
    if !validators::validate_password(&body.password) {
        violations.push("password must be at least 6 characters".to_string());
    }
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    if users::find_by_email(&state.db, &body.email).await?.is_some() {
        return Err(AppError::Conflict("user with this email already exists".into()));
    }
    if users::find_by_username(&state.db, &body.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("user with this username already exists".into()));
    }

    let password_hash = password::hash_password(&body.password)?;

    // A concurrent register can slip past the lookups above; the unique
    // constraints are the real arbiter, so a violation is still a 409.
    let user = match users::create(&state.db, &body.username, &body.email, &password_hash).await {
        Ok(user) => user,
        Err(e) if e.is_unique_violation() => {
            return Err(AppError::Conflict(
                "user with this email or username already exists".into(),
            ))
        }
        Err(e) => return Err(e),
    };

    let token = jwt::create_token(
        user.id,
        &user.username,
        &state.config.jwt_secret,
        state.config.token_ttl_seconds,
    )?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserWithToken {
            id: user.id,
            username: user.username,
            email: user.email,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<UserInLogin>,
) -> AppResult<Json<UserWithToken>> {
    // Unknown email and wrong password are indistinguishable to the caller.
    let user = users::find_by_email(&state.db, &body.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !password::verify_password(&body.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::create_token(
        user.id,
        &user.username,
        &state.config.jwt_secret,
        state.config.token_ttl_seconds,
    )?;

    Ok(Json(UserWithToken {
        id: user.id,
        username: user.username,
        email: user.email,
        token,
    }))
}
