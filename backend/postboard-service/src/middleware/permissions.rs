/// Ownership checks for mutating endpoints
///
/// Identity is compared by handle, which is unique and immutable.
use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::models::{Notification, Post};

pub type PermissionResult = Result<(), AppError>;

/// Only the author may delete a post.
pub fn check_post_ownership(auth: &AuthContext, post: &Post) -> PermissionResult {
    if post.user_handle == auth.handle {
        Ok(())
    } else {
        Err(AppError::Forbidden("Unauthorized".to_string()))
    }
}

pub fn check_notification_recipient(
    auth: &AuthContext,
    notification: &Notification,
) -> PermissionResult {
    if notification.recipient == auth.handle {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Cannot modify another user's notifications".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationType;

    fn auth(handle: &str) -> AuthContext {
        AuthContext {
            user_id: format!("{}-id", handle),
            handle: handle.to_string(),
        }
    }

    fn post(author: &str) -> Post {
        Post {
            user_handle: author.to_string(),
            user_image: String::new(),
            body: "hello".to_string(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            like_count: 0,
            comment_count: 0,
        }
    }

    #[test]
    fn author_may_modify_post() {
        assert!(check_post_ownership(&auth("alice"), &post("alice")).is_ok());
    }

    #[test]
    fn handle_comparison_is_case_sensitive() {
        assert!(matches!(
            check_post_ownership(&auth("Alice"), &post("alice")),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn only_recipient_may_mark_notification() {
        let n = Notification {
            recipient: "alice".into(),
            sender: "bob".into(),
            post_id: "p1".into(),
            kind: NotificationType::Comment,
            read: false,
            created_at: "2024-01-01T00:00:00.000Z".into(),
        };
        assert!(check_notification_recipient(&auth("alice"), &n).is_ok());
        assert!(check_notification_recipient(&auth("bob"), &n).is_err());
    }
}
