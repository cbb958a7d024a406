use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthedUser;
use crate::models::message::Message;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageInCreate {
    pub content: String,
    pub numbers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub sent_included: bool,
}

#[derive(Debug, Serialize)]
pub struct MessagesInResponse {
    pub messages: Vec<Message>,
}

pub async fn create_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(body): Json<MessageInCreate>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let message = state
        .messages
        .create_message(user.id, &user.username, &body.content, &body.numbers)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<MessagesInResponse>> {
    let messages = state
        .messages
        .list_messages(user.id, params.sent_included)
        .await?;

    Ok(Json(MessagesInResponse { messages }))
}

pub async fn get_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Message>> {
    let message = state.messages.get_message(id, user.id).await?;
    Ok(Json(message))
}

pub async fn mark_received(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Message>> {
    let message = state.messages.mark_received(id, user.id).await?;
    Ok(Json(message))
}

pub async fn mark_sent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Message>> {
    let message = state.messages.mark_sent(id, user.id).await?;
    Ok(Json(message))
}
