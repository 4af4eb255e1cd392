// SocialStore - async SQLite store with an LRU read cache in front of hot rows
//
// One impl block per resource:
//   users.rs         - accounts and profiles
//   posts.rs         - posts, feed assembly, hydration
//   comments.rs      - comments on posts
//   social.rs        - follow/like/save edges
//   messages.rs      - direct messages and conversations
//   notifications.rs - notifications, push subscriptions, contact requests

mod comments;
mod messages;
mod notifications;
mod posts;
mod social;
mod users;

pub use users::ProfileUpdate;

use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::cache::Cache;
use crate::id_generator::IdGenerator;
use crate::models::{Post, User};

pub struct SocialStore {
    pub pool: SqlitePool,
    ids: IdGenerator,
    user_cache: Cache<i64, User>,
    post_cache: Cache<i64, Post>,
}

impl SocialStore {
    pub async fn new(database_url: &str, cache_capacity: usize) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;

        Ok(SocialStore {
            pool,
            ids: IdGenerator::new(0),
            user_cache: Cache::new(cache_capacity),
            post_cache: Cache::new(cache_capacity),
        })
    }

    pub(crate) fn next_id(&self) -> i64 {
        self.ids.next_id()
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                display_name TEXT,
                bio TEXT,
                avatar_url TEXT,
                cover_url TEXT,
                location TEXT,
                website TEXT,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY,
                author_id INTEGER NOT NULL,
                caption TEXT NOT NULL,
                media_urls TEXT NOT NULL,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY,
                post_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                created INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY,
                follower_id INTEGER NOT NULL,
                followee_id INTEGER NOT NULL,
                created INTEGER NOT NULL,
                UNIQUE(follower_id, followee_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS likes (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                subject_type TEXT NOT NULL,
                subject_id INTEGER NOT NULL,
                created INTEGER NOT NULL,
                UNIQUE(user_id, subject_type, subject_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS saves (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                post_id INTEGER NOT NULL,
                created INTEGER NOT NULL,
                UNIQUE(user_id, post_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY,
                sender_id INTEGER NOT NULL,
                recipient_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                read INTEGER NOT NULL DEFAULT 0,
                created INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY,
                recipient_id INTEGER NOT NULL,
                sender_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                post_id INTEGER,
                read INTEGER NOT NULL DEFAULT 0,
                created INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS push_subscriptions (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                endpoint TEXT NOT NULL UNIQUE,
                p256dh TEXT NOT NULL,
                auth TEXT NOT NULL,
                created INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS contact_requests (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                created INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // Secondary indexes for the hot lookups
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, created)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_likes_subject ON likes(subject_type, subject_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(sender_id, recipient_id, created)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, created)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub(crate) async fn cache_user(&self, user: User) {
        self.user_cache.insert(user.id, user).await;
    }

    pub(crate) async fn cached_user(&self, id: i64) -> Option<User> {
        self.user_cache.get(&id).await
    }

    pub(crate) async fn evict_user(&self, id: i64) {
        self.user_cache.remove(&id).await;
    }

    pub(crate) async fn cache_post(&self, post: Post) {
        self.post_cache.insert(post.id, post).await;
    }

    pub(crate) async fn cached_post(&self, id: i64) -> Option<Post> {
        self.post_cache.get(&id).await
    }

    pub(crate) async fn evict_post(&self, id: i64) {
        self.post_cache.remove(&id).await;
    }
}
