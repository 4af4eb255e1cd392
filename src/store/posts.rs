use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;

use super::SocialStore;
use crate::models::{LikeSubject, Post, PostView, PublicUser};

fn post_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let media_json: String = row.get("media_urls");
    let media_urls =
        serde_json::from_str(&media_json).context("invalid media_urls column")?;

    Ok(Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        caption: row.get("caption"),
        media_urls,
        created: row.get("created"),
        updated: row.get("updated"),
    })
}

impl SocialStore {
    pub async fn create_post(
        &self,
        author_id: i64,
        caption: &str,
        media_urls: &[String],
    ) -> Result<Post> {
        let now = Utc::now().timestamp();
        let id = self.next_id();
        let media_json = serde_json::to_string(media_urls)?;

        sqlx::query(
            "INSERT INTO posts (id, author_id, caption, media_urls, created, updated)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(author_id)
        .bind(caption)
        .bind(&media_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let post = Post {
            id,
            author_id,
            caption: caption.to_string(),
            media_urls: media_urls.to_vec(),
            created: now,
            updated: now,
        };

        self.cache_post(post.clone()).await;
        Ok(post)
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        if let Some(post) = self.cached_post(id).await {
            return Ok(Some(post));
        }

        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let post = post_from_row(&row)?;
            self.cache_post(post.clone()).await;
            Ok(Some(post))
        } else {
            Ok(None)
        }
    }

    pub async fn posts_by_user(&self, user_id: i64, limit: i32, offset: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT * FROM posts WHERE author_id = ?
             ORDER BY created DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    /// Feed: viewer's own posts plus posts by everyone the viewer follows,
    /// newest first.
    pub async fn feed(&self, viewer_id: i64, limit: i32, offset: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT * FROM posts WHERE author_id = ?
                OR author_id IN (SELECT followee_id FROM follows WHERE follower_id = ?)
             ORDER BY created DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(viewer_id)
        .bind(viewer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    pub async fn update_caption(&self, id: i64, caption: &str) -> Result<Option<Post>> {
        let now = Utc::now().timestamp();

        let result = sqlx::query("UPDATE posts SET caption = ?, updated = ? WHERE id = ?")
            .bind(caption)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.evict_post(id).await;
        self.get_post(id).await
    }

    /// Delete a post and its comments, likes, and saves in one transaction.
    pub async fn delete_post(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "DELETE FROM likes WHERE subject_type = 'comment'
             AND subject_id IN (SELECT id FROM comments WHERE post_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM likes WHERE subject_type = 'post' AND subject_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM saves WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM notifications WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.evict_post(id).await;
        Ok(true)
    }

    pub async fn comment_count(&self, post_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    /// Attach author, counts, and viewer flags to a batch of posts.
    /// Posts whose author has vanished mid-read are skipped.
    pub async fn hydrate_posts(&self, viewer_id: i64, posts: Vec<Post>) -> Result<Vec<PostView>> {
        let mut views = Vec::with_capacity(posts.len());

        for post in posts {
            let Some(author) = self.get_user(post.author_id).await? else {
                continue;
            };

            let like_count = self.like_count(LikeSubject::Post, post.id).await?;
            let comment_count = self.comment_count(post.id).await?;
            let liked = self.has_liked(viewer_id, LikeSubject::Post, post.id).await?;
            let saved = self.has_saved(viewer_id, post.id).await?;

            views.push(PostView {
                author: PublicUser::from(&author),
                post,
                like_count,
                comment_count,
                liked,
                saved,
            });
        }

        Ok(views)
    }
}
