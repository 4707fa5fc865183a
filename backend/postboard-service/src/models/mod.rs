/// Document models stored by Postboard
///
/// Every model serializes to a camelCase JSON object and is stored under the
/// collection named by the matching constant below.
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const USERS: &str = "users";
pub const ACCOUNTS: &str = "accounts";
pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";
pub const LIKES: &str = "likes";
pub const NOTIFICATIONS: &str = "notifications";

/// RFC 3339 UTC timestamp with millisecond precision; sorts lexicographically.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Public profile, keyed by handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub handle: String,
    pub email: String,
    pub image_url: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Login credentials, keyed by email. Never rendered in responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user_id: String,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_handle: String,
    pub user_image: String,
    pub body: String,
    pub created_at: String,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: String,
    pub user_handle: String,
    pub user_image: String,
    pub body: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub post_id: String,
    pub user_handle: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Like,
    Comment,
}

/// Fan-out record for likes and comments; its id mirrors the source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient: String,
    pub sender: String,
    pub post_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub read: bool,
    pub created_at: String,
}

// Response views pair a document with its id.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub post_id: String,
    #[serde(flatten)]
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostDetails {
    pub post_id: String,
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub comment_id: String,
    #[serde(flatten)]
    pub comment: Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub notification_id: String,
    #[serde(flatten)]
    pub notification: Notification,
}

/// `GET /user` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    pub credentials: User,
    pub likes: Vec<Like>,
    pub notifications: Vec<NotificationView>,
}

/// `GET /user/{handle}` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDetails {
    pub user: User,
    pub posts: Vec<PostView>,
}
