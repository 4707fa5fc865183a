/// User service - signup, login and profiles
use crate::error::{AppError, Result};
use crate::middleware::AuthContext;
use crate::models::{
    now_timestamp, Account, AuthenticatedUser, Like, NotificationView, User, UserDetails,
    ACCOUNTS, LIKES, NOTIFICATIONS, POSTS, USERS,
};
use crate::services::posts::post_view;
use crate::services::validation::{
    reduce_user_details, validate_request, LoginRequest, SignupRequest, UserDetailsRequest,
};
use crate::SharedStore;
use crypto_core::jwt::JwtCodec;
use crypto_core::password::{hash_password, verify_password};
use doc_store::{to_fields, DocRef, Direction, DocumentStore, Fields, Query, WriteBatch};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Notifications returned with the authenticated user's profile.
pub const RECENT_NOTIFICATIONS: usize = 10;

const WRONG_CREDENTIALS: &str = "Wrong credentials, please try again";

pub struct UserService {
    store: SharedStore,
}

impl UserService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Create the account and profile, returning an access token.
    pub async fn signup(
        &self,
        jwt: &JwtCodec,
        request: SignupRequest,
        default_image_url: &str,
    ) -> Result<String> {
        validate_request(&request)?;
        if !jwt.can_issue() {
            return Err(AppError::Internal("token signing key not configured".to_string()));
        }
        let email = request.email.trim().to_string();
        let handle = request.handle.trim().to_string();

        if self.store.get(&DocRef::new(USERS, &handle)).await?.is_some() {
            return Err(AppError::field("handle", "This handle is already taken"));
        }
        if self.store.get(&DocRef::new(ACCOUNTS, &email)).await?.is_some() {
            return Err(AppError::field("email", "Email is already in use"));
        }

        let user_id = Uuid::new_v4().to_string();
        let account = Account {
            user_id: user_id.clone(),
            handle: handle.clone(),
            email: email.clone(),
            password_hash: hash_password(&request.password)?,
        };
        let user = User {
            user_id: user_id.clone(),
            handle: handle.clone(),
            email: email.clone(),
            image_url: default_image_url.to_string(),
            created_at: now_timestamp(),
            bio: None,
            website: None,
            location: None,
        };

        let mut batch = WriteBatch::new();
        batch
            .set(DocRef::new(ACCOUNTS, &email), to_fields(&account)?)
            .set(DocRef::new(USERS, &handle), to_fields(&user)?);
        self.store.commit(batch).await?;

        info!(%handle, %user_id, "user signed up");
        Ok(jwt.issue_access_token(&user_id, &handle)?)
    }

    pub async fn login(&self, jwt: &JwtCodec, request: LoginRequest) -> Result<String> {
        validate_request(&request)?;

        let email = request.email.trim();
        let Some(doc) = self.store.get(&DocRef::new(ACCOUNTS, email)).await? else {
            return Err(AppError::Forbidden(WRONG_CREDENTIALS.to_string()));
        };
        let account: Account = doc.decode()?;

        if !verify_password(&request.password, &account.password_hash)? {
            warn!(handle = %account.handle, "login rejected");
            return Err(AppError::Forbidden(WRONG_CREDENTIALS.to_string()));
        }

        Ok(jwt.issue_access_token(&account.user_id, &account.handle)?)
    }

    pub async fn add_details(&self, caller: &AuthContext, request: &UserDetailsRequest) -> Result<()> {
        let details = reduce_user_details(request);

        let mut patch = Fields::new();
        for (field, value) in [
            ("bio", details.bio),
            ("website", details.website),
            ("location", details.location),
        ] {
            if let Some(value) = value {
                patch.insert(field.to_string(), Value::from(value));
            }
        }

        self.store
            .update(&DocRef::new(USERS, &caller.handle), patch)
            .await?;
        Ok(())
    }

    /// Own profile with likes and the latest notifications
    pub async fn authenticated_user(&self, caller: &AuthContext) -> Result<AuthenticatedUser> {
        let credentials = load_user(self.store.as_ref(), &caller.handle).await?;

        let likes = self
            .store
            .query(&Query::collection(LIKES).where_eq("userHandle", caller.handle.as_str()))
            .await?
            .iter()
            .map(|doc| doc.decode::<Like>().map_err(AppError::from))
            .collect::<Result<Vec<_>>>()?;

        let notifications = self
            .store
            .query(
                &Query::collection(NOTIFICATIONS)
                    .where_eq("recipient", caller.handle.as_str())
                    .order_by("createdAt", Direction::Descending)
                    .limit(RECENT_NOTIFICATIONS),
            )
            .await?
            .iter()
            .map(|doc| {
                Ok(NotificationView {
                    notification_id: doc.id().to_string(),
                    notification: doc.decode()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AuthenticatedUser {
            credentials,
            likes,
            notifications,
        })
    }

    /// Public profile with the user's posts, newest first
    pub async fn user_details(&self, handle: &str) -> Result<UserDetails> {
        let user = load_user(self.store.as_ref(), handle).await?;

        let posts = self
            .store
            .query(
                &Query::collection(POSTS)
                    .where_eq("userHandle", handle)
                    .order_by("createdAt", Direction::Descending),
            )
            .await?
            .iter()
            .map(post_view)
            .collect::<Result<Vec<_>>>()?;

        Ok(UserDetails { user, posts })
    }

    /// Point the profile at a new image; posts follow via the image trigger.
    pub async fn set_image_url(&self, caller: &AuthContext, image_url: &str) -> Result<()> {
        let mut patch = Fields::new();
        patch.insert("imageUrl".to_string(), Value::from(image_url));
        self.store
            .update(&DocRef::new(USERS, &caller.handle), patch)
            .await?;
        Ok(())
    }
}

pub(crate) async fn load_user(store: &dyn DocumentStore, handle: &str) -> Result<User> {
    store
        .get(&DocRef::new(USERS, handle))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
        .decode()
        .map_err(AppError::from)
}
