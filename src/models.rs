// Domain types - rows as stored plus the projections handlers return

use serde::{Deserialize, Serialize};

/// Full user row. Never serialized to other users directly; see [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created: i64,
    pub updated: i64,
}

/// Public projection of a user - safe to embed in any response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created: i64,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            avatar_url: user.avatar_url.clone(),
            cover_url: user.cover_url.clone(),
            location: user.location.clone(),
            website: user.website.clone(),
            created: user.created,
        }
    }
}

/// Public profile with social counts, as returned by GET /api/users/{id}.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: PublicUser,
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    pub is_following: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub caption: String,
    pub media_urls: Vec<String>,
    pub created: i64,
    pub updated: i64,
}

/// Post hydrated with its author and viewer-specific state.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: PublicUser,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked: bool,
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: PublicUser,
    pub like_count: i64,
    pub liked: bool,
}

/// What a like attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeSubject {
    Post,
    Comment,
}

impl LikeSubject {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeSubject::Post => "post",
            LikeSubject::Comment => "comment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(LikeSubject::Post),
            "comment" => Some(LikeSubject::Comment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub text: String,
    pub read: bool,
    pub created: i64,
}

/// A chat partner with the latest message, for the conversation list.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub partner: PublicUser,
    pub last_message: Message,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Message,
    Contact,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::Message => "message",
            NotificationKind::Contact => "contact",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(NotificationKind::Like),
            "comment" => Some(NotificationKind::Comment),
            "follow" => Some(NotificationKind::Follow),
            "message" => Some(NotificationKind::Message),
            "contact" => Some(NotificationKind::Contact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub sender_id: i64,
    pub kind: NotificationKind,
    pub post_id: Option<i64>,
    pub read: bool,
    pub created: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub sender: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created: i64,
}

/// Browser push credentials, stored verbatim for the delivery worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub id: i64,
    pub user_id: i64,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_user_hides_credentials() {
        let user = User {
            id: 1,
            username: "ana".into(),
            email: "ana@example.com".into(),
            password_hash: "secret-hash".into(),
            display_name: None,
            bio: None,
            avatar_url: None,
            cover_url: None,
            location: None,
            website: None,
            created: 0,
            updated: 0,
        };
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(!json.contains("ana@example.com"));
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            NotificationKind::Like,
            NotificationKind::Comment,
            NotificationKind::Follow,
            NotificationKind::Message,
            NotificationKind::Contact,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("poke"), None);
    }
}
