use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CategoryId = i64;
pub type ThreadId = i64;
pub type ReplyId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// A thread exactly as stored, returned from the create endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub category_id: CategoryId,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: ReplyId,
    pub thread_id: ThreadId,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// What a like points at. Stored as two nullable columns, exactly one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReactionTarget {
    Thread(ThreadId),
    Reply(ReplyId),
}

impl ReactionTarget {
    pub fn id(&self) -> i64 {
        match self {
            Self::Thread(id) | Self::Reply(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Thread(_) => "thread",
            Self::Reply(_) => "reply",
        }
    }
}

/// Feed entry: a thread plus joined display fields, aggregates and the
/// viewer-relative `liked_by_user` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub category_id: CategoryId,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub category_name: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub like_count: i64,
    pub replies_count: i64,
    pub liked_by_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySummary {
    pub id: ReplyId,
    pub thread_id: ThreadId,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub like_count: i64,
    pub liked_by_user: bool,
}

/// A thread with its replies, oldest reply first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDetail {
    #[serde(flatten)]
    pub thread: ThreadSummary,
    pub replies: Vec<ReplySummary>,
}

/// Onboarding answers saved per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: String,
    pub diet_type: Option<String>,
    pub other_diet: Option<String>,
    pub allergies: Vec<String>,
    pub other_allergy: Option<String>,
    pub disliked_ingredients: Vec<String>,
    pub goal: Option<String>,
    pub other_goal: Option<String>,
    pub preferred_cuisines: Vec<String>,
    pub other_cuisine: Option<String>,
    pub status: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_target_accessors() {
        assert_eq!(ReactionTarget::Thread(7).id(), 7);
        assert_eq!(ReactionTarget::Reply(9).kind(), "reply");
    }

    #[test]
    fn reaction_target_serializes_tagged() {
        let json = serde_json::to_value(ReactionTarget::Reply(3)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "reply", "id": 3 }));
    }
}
