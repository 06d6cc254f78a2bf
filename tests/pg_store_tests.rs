// tests/pg_store_tests.rs
//
// Runs the Postgres store against a real database.
// Requires DATABASE_URL; run with `cargo test -- --ignored`.

use chirp::{
    error::AppError,
    models::{
        account::{NewAccount, ProfileChanges},
        post::NewPost,
    },
    services::{
        engagement::toggle_like,
        feed::{FeedCursor, FeedKind, get_page},
        social::follow,
    },
    store::{PgStore, PostScope, RowRange, Store, StoreError},
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn pg_store() -> PgStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    PgStore::new(pool)
}

/// Usernames are unique across runs against the same database.
fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

async fn account(store: &PgStore, prefix: &str) -> Uuid {
    store
        .insert_account(NewAccount {
            id: Uuid::new_v4(),
            username: Some(unique_name(prefix)),
            is_admin: false,
        })
        .await
        .expect("Failed to insert account")
        .id
}

async fn post(store: &PgStore, owner: Uuid, content: &str) -> Uuid {
    store
        .insert_post(NewPost {
            user_id: owner,
            content: content.to_string(),
            topics: vec!["testing".to_string()],
            sentiment: "neutral".to_string(),
            tone: "informal".to_string(),
        })
        .await
        .expect("Failed to insert post")
        .id
}

#[tokio::test]
#[ignore]
async fn author_feed_pages_newest_first() {
    let store = pg_store().await;
    let owner = account(&store, "pager").await;
    for i in 0..12 {
        post(&store, owner, &format!("post {}", i)).await;
    }

    let first = get_page(&store, FeedKind::Author(owner), None, FeedCursor::first())
        .await
        .unwrap();
    assert_eq!(first.posts.len(), 10);
    assert!(first.has_more);
    assert_eq!(first.posts[0].post.content, "post 11");
    assert_eq!(first.posts[0].post.topics, Some(vec!["testing".to_string()]));

    let second = get_page(&store, FeedKind::Author(owner), None, first.next_cursor.unwrap())
        .await
        .unwrap();
    let contents: Vec<_> = second.posts.iter().map(|p| p.post.content.as_str()).collect();
    assert_eq!(contents, vec!["post 1", "post 0"]);
    assert!(!second.has_more);
}

#[tokio::test]
#[ignore]
async fn equal_timestamps_fall_back_to_id_order() {
    let store = pg_store().await;
    let owner = account(&store, "ties").await;
    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(post(&store, owner, &format!("tied {}", i)).await);
    }

    let database_url = std::env::var("DATABASE_URL").unwrap();
    let pool = PgPoolOptions::new().connect(&database_url).await.unwrap();
    sqlx::query("UPDATE posts SET created_at = NOW() WHERE user_id = $1")
        .bind(owner)
        .execute(&pool)
        .await
        .unwrap();

    let rows = store
        .fetch_post_rows(&PostScope::Owners(vec![owner]), RowRange { offset: 0, limit: 10 })
        .await
        .unwrap();
    let got: Vec<Uuid> = rows.iter().map(|r| r.post.id).collect();
    ids.sort();
    ids.reverse();
    assert_eq!(got, ids);
}

#[tokio::test]
#[ignore]
async fn following_feed_is_limited_to_followed_owners() {
    let store = pg_store().await;
    let reader = account(&store, "reader").await;
    let friend = account(&store, "friend").await;
    let stranger = account(&store, "stranger").await;
    post(&store, friend, "from friend").await;
    post(&store, stranger, "from stranger").await;

    let empty = get_page(&store, FeedKind::Following, Some(reader), FeedCursor::first())
        .await
        .unwrap();
    assert!(empty.posts.is_empty());

    follow(&store, reader, friend).await.unwrap();
    let page = get_page(&store, FeedKind::Following, Some(reader), FeedCursor::first())
        .await
        .unwrap();
    assert_eq!(page.posts.len(), 1);
    assert_eq!(page.posts[0].post.content, "from friend");
    assert!(page.posts[0].author.as_ref().unwrap().username.is_some());
}

#[tokio::test]
#[ignore]
async fn like_toggle_aggregates_likers() {
    let store = pg_store().await;
    let owner = account(&store, "owner").await;
    let fan = account(&store, "fan").await;
    let post_id = post(&store, owner, "likeable").await;

    assert!(toggle_like(&store, post_id, fan).await.unwrap().liked);
    assert!(toggle_like(&store, post_id, owner).await.unwrap().liked);

    let page = get_page(&store, FeedKind::Author(owner), Some(fan), FeedCursor::first())
        .await
        .unwrap();
    assert_eq!(page.posts[0].like_count, 2);
    assert!(page.posts[0].liked_by_viewer);

    assert!(!toggle_like(&store, post_id, fan).await.unwrap().liked);
    let page = get_page(&store, FeedKind::Author(owner), Some(fan), FeedCursor::first())
        .await
        .unwrap();
    assert_eq!(page.posts[0].like_count, 1);
    assert!(!page.posts[0].liked_by_viewer);
}

#[tokio::test]
#[ignore]
async fn duplicate_like_is_a_unique_violation() {
    let store = pg_store().await;
    let owner = account(&store, "dup").await;
    let post_id = post(&store, owner, "twice").await;

    store.insert_like(owner, post_id).await.unwrap();
    let err = store.insert_like(owner, post_id).await.unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)));
}

#[tokio::test]
#[ignore]
async fn self_follow_is_refused() {
    let store = pg_store().await;
    let me = account(&store, "self").await;

    let err = follow(&store, me, me).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The table constraint holds even without the service check
    assert!(store.insert_follow(me, me).await.is_err());
    assert!(store.followed_ids(me).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn profile_update_clears_and_keeps_fields() {
    let store = pg_store().await;
    let id = account(&store, "editor").await;

    let updated = store
        .update_account(
            id,
            &ProfileChanges {
                username: None,
                bio: Some(Some("hello there".to_string())),
                avatar_url: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.bio.as_deref(), Some("hello there"));
    let name = updated.username.clone();

    let cleared = store
        .update_account(
            id,
            &ProfileChanges {
                username: None,
                bio: Some(None),
                avatar_url: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.bio, None);
    assert_eq!(cleared.username, name);

    let missing = store
        .update_account(Uuid::new_v4(), &ProfileChanges::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}
