use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use savor_db::{Author, NewReply, NewThread};
use savor_types::api::{CreateReplyRequest, CreateThreadRequest, Identity, ViewerQuery};
use savor_types::models::ThreadId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::with_db;

/// GET /forum/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = with_db(&state, |db| db.list_categories()).await?;
    Ok(Json(categories))
}

/// GET /forum/threads?user_id=: every thread, newest first.
pub async fn list_threads(
    State(state): State<AppState>,
    Query(query): Query<ViewerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = query.viewer().map(str::to_string);
    let feed = with_db(&state, move |db| db.feed(viewer.as_deref())).await?;
    Ok(Json(feed))
}

/// GET /forum/threads/{thread_id}?user_id=
pub async fn get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<ThreadId>,
    Query(query): Query<ViewerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = query.viewer().map(str::to_string);
    let detail = with_db(&state, move |db| db.thread_detail(thread_id, viewer.as_deref()))
        .await?
        .ok_or(ApiError::NotFound("Thread not found"))?;
    Ok(Json(detail))
}

/// POST /forum/threads
pub async fn create_thread(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<CreateThreadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category_id = req.category_id.ok_or_else(|| ApiError::missing("category_id"))?;
    let title = required("title", req.title)?;
    let content = required("content", req.content)?;
    let author = resolve_author(&identity, req.user_id, req.user_name, req.user_avatar)?;
    let author = named_author(author)?;

    let thread = NewThread {
        category_id,
        title,
        content,
    };
    let created = with_db(&state, move |db| db.create_thread(&author, &thread))
        .await?
        .ok_or_else(|| ApiError::Validation {
            field: "category_id",
            message: format!("Unknown category: {category_id}"),
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /forum/threads/{thread_id}/replies
pub async fn create_reply(
    State(state): State<AppState>,
    Path(thread_id): Path<ThreadId>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<CreateReplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required("content", req.content)?;
    let author = resolve_author(&identity, req.user_id, req.user_name, req.user_avatar)?;
    let author = named_author(author)?;

    let reply = NewReply { thread_id, content };
    let created = with_db(&state, move |db| db.create_reply(&author, &reply))
        .await?
        .ok_or(ApiError::NotFound("Thread not found"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::missing(field))
}

/// The acting user is always the verified identity. A `user_id` in the body
/// is accepted only if it names that same user. Display fields from the body
/// win over the identity's own.
pub(crate) fn resolve_author(
    identity: &Identity,
    user_id: Option<String>,
    user_name: Option<String>,
    user_avatar: Option<String>,
) -> Result<Author, ApiError> {
    if let Some(claimed) = user_id.filter(|id| !id.is_empty()) {
        if claimed != identity.uid {
            return Err(ApiError::Forbidden);
        }
    }

    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    Ok(Author {
        id: identity.uid.clone(),
        name: non_empty(user_name).or(non_empty(identity.name.clone())),
        avatar: non_empty(user_avatar).or(non_empty(identity.picture.clone())),
    })
}

/// Thread and reply authors must come with a display name.
fn named_author(author: Author) -> Result<Author, ApiError> {
    if author.name.is_none() {
        return Err(ApiError::missing("user_name"));
    }
    Ok(author)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            uid: "uid-1".into(),
            name: Some("Ada".into()),
            picture: Some("https://img/ada.png".into()),
        }
    }

    #[test]
    fn body_display_fields_take_precedence() {
        let author = resolve_author(&identity(), None, Some("Chef Ada".into()), None)
            .unwrap();
        assert_eq!(author.id, "uid-1");
        assert_eq!(author.name.as_deref(), Some("Chef Ada"));
        assert_eq!(author.avatar.as_deref(), Some("https://img/ada.png"));
    }

    #[test]
    fn mismatched_user_id_is_forbidden() {
        let err = resolve_author(&identity(), Some("someone-else".into()), None, None)
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn blank_name_falls_back_then_fails() {
        let nameless = Identity {
            name: None,
            ..identity()
        };
        let author = resolve_author(&nameless, Some("uid-1".into()), Some("  ".into()), None)
            .unwrap();
        assert!(author.name.is_none());
        let err = named_author(author).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field, .. } if field == "user_name"));
    }

    #[test]
    fn required_rejects_blank() {
        assert!(required("title", Some("   ".into())).is_err());
        assert_eq!(required("title", Some("Soup".into())).unwrap(), "Soup");
    }
}
