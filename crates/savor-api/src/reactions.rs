use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use savor_db::ToggleOutcome;
use savor_types::api::{Identity, ToggleLikeRequest, ToggleLikeResponse};
use savor_types::models::{ReactionTarget, ReplyId, ThreadId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::forum::resolve_author;
use crate::with_db;

/// PUT /forum/threads/{thread_id}/like
pub async fn toggle_thread_like(
    State(state): State<AppState>,
    Path(thread_id): Path<ThreadId>,
    Extension(identity): Extension<Identity>,
    body: Option<JsonBody<ToggleLikeRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|JsonBody(req)| req).unwrap_or_default();
    toggle(state, identity, req, ReactionTarget::Thread(thread_id)).await
}

/// PUT /forum/replies/{reply_id}/like
pub async fn toggle_reply_like(
    State(state): State<AppState>,
    Path(reply_id): Path<ReplyId>,
    Extension(identity): Extension<Identity>,
    body: Option<JsonBody<ToggleLikeRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|JsonBody(req)| req).unwrap_or_default();
    toggle(state, identity, req, ReactionTarget::Reply(reply_id)).await
}

async fn toggle(
    state: AppState,
    identity: Identity,
    req: ToggleLikeRequest,
    target: ReactionTarget,
) -> Result<Json<ToggleLikeResponse>, ApiError> {
    let author = resolve_author(&identity, req.user_id, req.user_name, req.user_avatar)?;

    let outcome = with_db(&state, move |db| db.toggle_like(&author, target)).await?;
    let liked = match outcome {
        ToggleOutcome::Liked => true,
        ToggleOutcome::Unliked => false,
        ToggleOutcome::MissingTarget => {
            return Err(ApiError::NotFound(match target {
                ReactionTarget::Thread(_) => "Thread not found",
                ReactionTarget::Reply(_) => "Reply not found",
            }));
        }
    };

    Ok(Json(ToggleLikeResponse { liked }))
}
