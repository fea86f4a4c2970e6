use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use savor_db::{Author, InitOutcome};
use savor_types::api::{Identity, MessageResponse, SavePreferencesRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::with_db;

fn message(status: StatusCode, text: &str) -> Response {
    let body = MessageResponse {
        message: text.to_string(),
    };
    (status, Json(body)).into_response()
}

/// GET /user-preference
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError> {
    let uid = identity.uid;
    let prefs = with_db(&state, move |db| db.get_preferences(&uid)).await?;
    Ok(match prefs {
        Some(prefs) => Json(prefs).into_response(),
        None => message(StatusCode::NOT_FOUND, "No preferences found."),
    })
}

/// POST /user-preference replaces the caller's preferences. An existing
/// display name is kept; unknown users start out as "Anonymous".
pub async fn save_preferences(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<SavePreferencesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let author = Author {
        id: identity.uid,
        name: None,
        avatar: identity.picture,
    };
    let saved = with_db(&state, move |db| db.save_preferences(&author, &req)).await?;
    Ok(Json(saved))
}

/// POST /user-preference/status: first-login initialization.
pub async fn initialize(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError> {
    let outcome = with_db(&state, move |db| {
        db.initialize_user(&identity.uid, identity.name.as_deref(), identity.picture.as_deref())
    })
    .await?;

    Ok(match outcome {
        InitOutcome::Created => message(StatusCode::CREATED, "User and preference initialized."),
        InitOutcome::AlreadyInitialized => message(StatusCode::OK, "User already initialized."),
    })
}
