// Follow, like, and save edges. All three are idempotent toggles over
// UNIQUE-constrained relation tables; toggling twice restores the original
// state.

use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use super::SocialStore;
use crate::models::{LikeSubject, Post, User};

impl SocialStore {
    /// Follow if not following, unfollow otherwise. Returns whether the
    /// edge exists after the call.
    pub async fn toggle_follow(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        if self.is_following(follower_id, followee_id).await? {
            sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&self.pool)
                .await?;
            return Ok(false);
        }

        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT OR IGNORE INTO follows (id, follower_id, followee_id, created)
             VALUES (?, ?, ?, ?)",
        )
        .bind(self.next_id())
        .bind(follower_id)
        .bind(followee_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    pub async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followee_id = ?",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>(0) > 0)
    }

    pub async fn follower_count(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM follows WHERE followee_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    pub async fn following_count(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    /// Users who follow `user_id`, most recent first.
    pub async fn followers_of(&self, user_id: i64) -> Result<Vec<User>> {
        let ids: Vec<i64> = sqlx::query(
            "SELECT follower_id FROM follows WHERE followee_id = ? ORDER BY created DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get(0))
        .collect();

        self.users_by_ids(&ids).await
    }

    /// Users `user_id` follows, most recent first.
    pub async fn following_of(&self, user_id: i64) -> Result<Vec<User>> {
        let ids: Vec<i64> = sqlx::query(
            "SELECT followee_id FROM follows WHERE follower_id = ? ORDER BY created DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get(0))
        .collect();

        self.users_by_ids(&ids).await
    }

    async fn users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(user) = self.get_user(id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    /// Like if not liked, unlike otherwise. Returns whether the like exists
    /// after the call.
    pub async fn toggle_like(
        &self,
        user_id: i64,
        subject: LikeSubject,
        subject_id: i64,
    ) -> Result<bool> {
        if self.has_liked(user_id, subject, subject_id).await? {
            sqlx::query(
                "DELETE FROM likes WHERE user_id = ? AND subject_type = ? AND subject_id = ?",
            )
            .bind(user_id)
            .bind(subject.as_str())
            .bind(subject_id)
            .execute(&self.pool)
            .await?;
            return Ok(false);
        }

        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT OR IGNORE INTO likes (id, user_id, subject_type, subject_id, created)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.next_id())
        .bind(user_id)
        .bind(subject.as_str())
        .bind(subject_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    pub async fn has_liked(
        &self,
        user_id: i64,
        subject: LikeSubject,
        subject_id: i64,
    ) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM likes WHERE user_id = ? AND subject_type = ? AND subject_id = ?",
        )
        .bind(user_id)
        .bind(subject.as_str())
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>(0) > 0)
    }

    pub async fn like_count(&self, subject: LikeSubject, subject_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM likes WHERE subject_type = ? AND subject_id = ?",
        )
        .bind(subject.as_str())
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get(0))
    }

    /// Save if not saved, unsave otherwise. Returns whether the save exists
    /// after the call.
    pub async fn toggle_save(&self, user_id: i64, post_id: i64) -> Result<bool> {
        if self.has_saved(user_id, post_id).await? {
            sqlx::query("DELETE FROM saves WHERE user_id = ? AND post_id = ?")
                .bind(user_id)
                .bind(post_id)
                .execute(&self.pool)
                .await?;
            return Ok(false);
        }

        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT OR IGNORE INTO saves (id, user_id, post_id, created) VALUES (?, ?, ?, ?)",
        )
        .bind(self.next_id())
        .bind(user_id)
        .bind(post_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    pub async fn has_saved(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) FROM saves WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>(0) > 0)
    }

    /// Posts the user has saved, most recently saved first.
    pub async fn saved_posts(&self, user_id: i64) -> Result<Vec<Post>> {
        let ids: Vec<i64> = sqlx::query(
            "SELECT post_id FROM saves WHERE user_id = ? ORDER BY created DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get(0))
        .collect();

        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(post) = self.get_post(id).await? {
                posts.push(post);
            }
        }
        Ok(posts)
    }
}
