/// Post service - posts, comments and likes
use crate::error::{AppError, Result};
use crate::middleware::{check_post_ownership, AuthContext};
use crate::models::{
    now_timestamp, Comment, CommentView, Like, Post, PostDetails, PostView, COMMENTS, LIKES,
    POSTS,
};
use crate::services::users::load_user;
use crate::SharedStore;
use doc_store::{generate_id, to_fields, DocRef, Direction, Document, Fields, Query, WriteBatch};
use serde_json::Value;
use tracing::info;

pub struct PostService {
    store: SharedStore,
}

impl PostService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Every post, newest first
    pub async fn list_posts(&self) -> Result<Vec<PostView>> {
        let docs = self
            .store
            .query(&Query::collection(POSTS).order_by("createdAt", Direction::Descending))
            .await?;
        docs.iter().map(post_view).collect()
    }

    pub async fn create_post(&self, author: &AuthContext, body: String) -> Result<PostView> {
        let user = load_user(self.store.as_ref(), &author.handle).await?;

        let post = Post {
            user_handle: author.handle.clone(),
            user_image: user.image_url,
            body,
            created_at: now_timestamp(),
            like_count: 0,
            comment_count: 0,
        };
        let reference = self.store.add(POSTS, to_fields(&post)?).await?;

        info!(post_id = %reference.id, handle = %author.handle, "post created");
        Ok(PostView {
            post_id: reference.id,
            post,
        })
    }

    /// A post with its comments, newest first
    pub async fn get_post(&self, post_id: &str) -> Result<PostDetails> {
        let post = self.load_post(post_id).await?;

        let comments = self
            .store
            .query(
                &Query::collection(COMMENTS)
                    .where_eq("postId", post_id)
                    .order_by("createdAt", Direction::Descending),
            )
            .await?
            .iter()
            .map(|doc| {
                Ok(CommentView {
                    comment_id: doc.id().to_string(),
                    comment: doc.decode()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PostDetails {
            post_id: post_id.to_string(),
            post,
            comments,
        })
    }

    /// Delete a post owned by the caller. Dependents are removed by the
    /// cascade trigger.
    pub async fn delete_post(&self, caller: &AuthContext, post_id: &str) -> Result<()> {
        let post = self.load_post(post_id).await?;
        check_post_ownership(caller, &post)?;

        self.store.delete(&DocRef::new(POSTS, post_id)).await?;
        info!(%post_id, handle = %caller.handle, "post deleted");
        Ok(())
    }

    pub async fn add_comment(
        &self,
        caller: &AuthContext,
        post_id: &str,
        body: String,
    ) -> Result<CommentView> {
        let post = self.load_post(post_id).await?;
        let user = load_user(self.store.as_ref(), &caller.handle).await?;

        let comment = Comment {
            post_id: post_id.to_string(),
            user_handle: caller.handle.clone(),
            user_image: user.image_url,
            body,
            created_at: now_timestamp(),
        };
        let reference = DocRef::new(COMMENTS, generate_id());

        let mut batch = WriteBatch::new();
        batch
            .set(reference.clone(), to_fields(&comment)?)
            .update(
                DocRef::new(POSTS, post_id),
                count_patch("commentCount", post.comment_count + 1),
            );
        self.store.commit(batch).await?;

        Ok(CommentView {
            comment_id: reference.id,
            comment,
        })
    }

    /// Like a post; one like per user and post
    pub async fn like_post(&self, caller: &AuthContext, post_id: &str) -> Result<PostView> {
        let mut post = self.load_post(post_id).await?;
        if self.find_like(caller, post_id).await?.is_some() {
            return Err(AppError::BadRequest("Post already liked".to_string()));
        }

        let like = Like {
            post_id: post_id.to_string(),
            user_handle: caller.handle.clone(),
        };
        post.like_count += 1;

        let mut batch = WriteBatch::new();
        batch
            .set(DocRef::new(LIKES, generate_id()), to_fields(&like)?)
            .update(
                DocRef::new(POSTS, post_id),
                count_patch("likeCount", post.like_count),
            );
        self.store.commit(batch).await?;

        Ok(PostView {
            post_id: post_id.to_string(),
            post,
        })
    }

    pub async fn unlike_post(&self, caller: &AuthContext, post_id: &str) -> Result<PostView> {
        let mut post = self.load_post(post_id).await?;
        let Some(like) = self.find_like(caller, post_id).await? else {
            return Err(AppError::BadRequest("Post not liked".to_string()));
        };

        post.like_count = (post.like_count - 1).max(0);

        let mut batch = WriteBatch::new();
        batch.delete(like.reference).update(
            DocRef::new(POSTS, post_id),
            count_patch("likeCount", post.like_count),
        );
        self.store.commit(batch).await?;

        Ok(PostView {
            post_id: post_id.to_string(),
            post,
        })
    }

    async fn load_post(&self, post_id: &str) -> Result<Post> {
        self.store
            .get(&DocRef::new(POSTS, post_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?
            .decode()
            .map_err(AppError::from)
    }

    async fn find_like(&self, caller: &AuthContext, post_id: &str) -> Result<Option<Document>> {
        let mut likes = self
            .store
            .query(
                &Query::collection(LIKES)
                    .where_eq("postId", post_id)
                    .where_eq("userHandle", caller.handle.as_str())
                    .limit(1),
            )
            .await?;
        Ok(likes.pop())
    }
}

pub(crate) fn post_view(doc: &Document) -> Result<PostView> {
    Ok(PostView {
        post_id: doc.id().to_string(),
        post: doc.decode()?,
    })
}

fn count_patch(field: &str, value: i64) -> Fields {
    let mut patch = Fields::new();
    patch.insert(field.to_string(), Value::from(value));
    patch
}
