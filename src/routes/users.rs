use axum::extract::State;
use axum::{Extension, Json};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthedUser;
use crate::models::user::UserView;
use crate::repository::users;
use crate::state::AppState;

pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
) -> AppResult<Json<UserView>> {
    // Token outlived the account: treat as a stale credential.
    let user = users::find_by_id(&state.db, user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(UserView::from(&user)))
}
