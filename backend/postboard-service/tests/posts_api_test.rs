/// HTTP tests for post, comment and like endpoints
mod common;

use actix_web::{http::StatusCode, test, App};
use common::*;
use doc_store::{DocumentStore, MemoryStore};
use postboard_service::SharedStore;
use serde_json::{json, Value};
use std::sync::Arc;

macro_rules! app {
    ($store:expr) => {{
        let (ctx, dir) = context($store.clone());
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;
        (app, dir)
    }};
}

fn memory() -> SharedStore {
    Arc::new(MemoryStore::new())
}

#[actix_web::test]
async fn create_post_requires_auth() {
    let store = memory();
    let (app, _dir) = app!(store);

    let req = test::TestRequest::post()
        .uri("/post")
        .set_json(json!({"body": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/post")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .set_json(json!({"body": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 401);
}

#[actix_web::test]
async fn empty_post_body_is_rejected() {
    let store = memory();
    seed_user(store.as_ref(), "alice", "http://media.test/alice.png").await;
    let (app, _dir) = app!(store);

    let req = test::TestRequest::post()
        .uri("/post")
        .insert_header(bearer("alice"))
        .set_json(json!({"body": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["fields"]["body"], "Must not be empty");
}

#[actix_web::test]
async fn create_get_and_list_posts() {
    let store = memory();
    seed_user(store.as_ref(), "alice", "http://media.test/alice.png").await;
    seed_post(store.as_ref(), "old", "bob", "2020-01-01T00:00:00.000Z").await;
    let (app, _dir) = app!(store);

    let req = test::TestRequest::post()
        .uri("/post")
        .insert_header(bearer("alice"))
        .set_json(json!({"body": "first post"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let post_id = created["postId"].as_str().unwrap().to_string();
    assert_eq!(created["userHandle"], "alice");
    assert_eq!(created["userImage"], "http://media.test/alice.png");
    assert_eq!(created["likeCount"], 0);
    assert_eq!(created["commentCount"], 0);

    let req = test::TestRequest::get().uri("/posts").to_request();
    let posts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<_> = posts.iter().map(|p| p["postId"].as_str().unwrap()).collect();
    assert_eq!(ids, [post_id.as_str(), "old"]);

    let req = test::TestRequest::get()
        .uri(&format!("/post/{post_id}"))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(post["body"], "first post");
    assert_eq!(post["comments"], json!([]));
}

#[actix_web::test]
async fn missing_post_is_not_found() {
    let store = memory();
    let (app, _dir) = app!(store);

    let req = test::TestRequest::get().uri("/post/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Post not found");

    let req = test::TestRequest::delete()
        .uri("/post/nope")
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn only_author_may_delete_post() {
    let store = memory();
    seed_post(store.as_ref(), "P1", "alice", "2024-01-01T00:00:00.000Z").await;
    let (app, _dir) = app!(store);

    let req = test::TestRequest::delete()
        .uri("/post/P1")
        .insert_header(bearer("bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Unauthorized");
    assert!(get_doc(store.as_ref(), "posts", "P1").await.is_some());

    let req = test::TestRequest::delete()
        .uri("/post/P1")
        .insert_header(bearer("alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Post deleted successfully");
    assert!(get_doc(store.as_ref(), "posts", "P1").await.is_none());
}

#[actix_web::test]
async fn delete_post_cascades_through_triggers() {
    let store = memory();
    let mut changes = store.subscribe();
    seed_post(store.as_ref(), "P1", "alice", "2024-01-01T00:00:00.000Z").await;
    seed_comment(store.as_ref(), "C1", "P1", "bob").await;
    seed_like(store.as_ref(), "L1", "P1", "bob").await;
    drain_triggers(store.as_ref(), &mut changes).await;
    assert!(get_doc(store.as_ref(), "notifications", "L1").await.is_some());

    let (app, _dir) = app!(store);
    let req = test::TestRequest::delete()
        .uri("/post/P1")
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    drain_triggers(store.as_ref(), &mut changes).await;
    assert!(ids_where(store.as_ref(), "comments", "postId", "P1").await.is_empty());
    assert!(ids_where(store.as_ref(), "likes", "postId", "P1").await.is_empty());
    assert!(ids_where(store.as_ref(), "notifications", "postId", "P1").await.is_empty());
}

#[actix_web::test]
async fn add_comment_validates_and_counts() {
    let store = memory();
    seed_user(store.as_ref(), "bob", "http://media.test/bob.png").await;
    seed_post(store.as_ref(), "P1", "alice", "2024-01-01T00:00:00.000Z").await;
    let (app, _dir) = app!(store);

    let req = test::TestRequest::post()
        .uri("/post/P1/comment")
        .insert_header(bearer("bob"))
        .set_json(json!({"body": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["fields"]["comment"], "Must not be empty");

    let req = test::TestRequest::post()
        .uri("/post/missing/comment")
        .insert_header(bearer("bob"))
        .set_json(json!({"body": "hi"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/post/P1/comment")
        .insert_header(bearer("bob"))
        .set_json(json!({"body": "nice post"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;
    assert_eq!(comment["postId"], "P1");
    assert_eq!(comment["userHandle"], "bob");
    assert_eq!(comment["userImage"], "http://media.test/bob.png");
    assert!(comment["commentId"].is_string());

    let req = test::TestRequest::get().uri("/post/P1").to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(post["commentCount"], 1);
    assert_eq!(post["comments"][0]["body"], "nice post");
}

#[actix_web::test]
async fn like_and_unlike_once_each() {
    let store = memory();
    let mut changes = store.subscribe();
    seed_post(store.as_ref(), "P1", "alice", "2024-01-01T00:00:00.000Z").await;
    let (app, _dir) = app!(store);

    let like = || {
        test::TestRequest::get()
            .uri("/post/P1/like")
            .insert_header(bearer("bob"))
            .to_request()
    };
    let unlike = || {
        test::TestRequest::get()
            .uri("/post/P1/unlike")
            .insert_header(bearer("bob"))
            .to_request()
    };

    let post: Value = test::call_and_read_body_json(&app, like()).await;
    assert_eq!(post["likeCount"], 1);

    let resp = test::call_service(&app, like()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Post already liked");

    drain_triggers(store.as_ref(), &mut changes).await;
    let like_ids = ids_where(store.as_ref(), "likes", "postId", "P1").await;
    assert_eq!(like_ids.len(), 1);
    let notification = get_doc(store.as_ref(), "notifications", &like_ids[0])
        .await
        .expect("like notification");
    assert_eq!(notification.get_str("recipient"), Some("alice"));

    let post: Value = test::call_and_read_body_json(&app, unlike()).await;
    assert_eq!(post["likeCount"], 0);

    let resp = test::call_service(&app, unlike()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Post not liked");

    drain_triggers(store.as_ref(), &mut changes).await;
    assert!(get_doc(store.as_ref(), "notifications", &like_ids[0]).await.is_none());
}

#[actix_web::test]
async fn like_count_never_goes_negative() {
    let store = memory();
    seed_post(store.as_ref(), "P1", "alice", "2024-01-01T00:00:00.000Z").await;
    seed_like(store.as_ref(), "L1", "P1", "bob").await;
    let (app, _dir) = app!(store);

    let req = test::TestRequest::get()
        .uri("/post/P1/unlike")
        .insert_header(bearer("bob"))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(post["likeCount"], 0);
}

#[actix_web::test]
async fn store_failure_is_a_generic_500() {
    let failing = Arc::new(FailingStore::new());
    failing.fail_queries_on("posts");
    let store: SharedStore = failing;
    let (app, _dir) = app!(store);

    let req = test::TestRequest::get().uri("/posts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Internal server error");
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let store = memory();
    let (app, _dir) = app!(store);

    let req = test::TestRequest::post()
        .uri("/post")
        .insert_header(bearer("alice"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
