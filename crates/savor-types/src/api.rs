use serde::{Deserialize, Serialize};

use crate::models::CategoryId;

// -- Identity --

/// Bearer token claims. `sub` is the stable external user id; `name` and
/// `picture` are optional display hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: usize,
}

/// The caller as resolved from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.sub,
            name: claims.name,
            picture: claims.picture,
        }
    }
}

// -- Forum --

/// Optional viewer for the read endpoints (`?user_id=`).
#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    pub user_id: Option<String>,
}

impl ViewerQuery {
    /// An empty `user_id` means no viewer.
    pub fn viewer(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }
}

// Required fields are Options so a missing one is reported by name
// instead of as an opaque body rejection.

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateThreadRequest {
    pub category_id: Option<CategoryId>,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReplyRequest {
    pub user_id: Option<String>,
    pub content: Option<String>,
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleLikeRequest {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
}

// -- Preferences --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePreferencesRequest {
    pub diet_type: Option<String>,
    pub other_diet: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub other_allergy: Option<String>,
    #[serde(default)]
    pub disliked_ingredients: Vec<String>,
    pub goal: Option<String>,
    pub other_goal: Option<String>,
    #[serde(default)]
    pub preferred_cuisines: Vec<String>,
    pub other_cuisine: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_viewer_is_none() {
        let q = ViewerQuery {
            user_id: Some(String::new()),
        };
        assert_eq!(q.viewer(), None);
        let q = ViewerQuery {
            user_id: Some("u1".into()),
        };
        assert_eq!(q.viewer(), Some("u1"));
    }

    #[test]
    fn preferences_accept_camel_case() {
        let req: SavePreferencesRequest = serde_json::from_str(
            r#"{"dietType":"vegan","allergies":["nuts"],"preferredCuisines":["thai"]}"#,
        )
        .unwrap();
        assert_eq!(req.diet_type.as_deref(), Some("vegan"));
        assert_eq!(req.allergies, vec!["nuts"]);
        assert!(req.disliked_ingredients.is_empty());
    }

    #[test]
    fn thread_request_rejects_unknown_fields() {
        let res = serde_json::from_str::<CreateThreadRequest>(r#"{"title":"x","bogus":1}"#);
        assert!(res.is_err());
    }
}
