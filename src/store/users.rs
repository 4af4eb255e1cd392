use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use super::SocialStore;
use crate::models::User;

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        bio: row.get("bio"),
        avatar_url: row.get("avatar_url"),
        cover_url: row.get("cover_url"),
        location: row.get("location"),
        website: row.get("website"),
        created: row.get("created"),
        updated: row.get("updated"),
    }
}

/// Profile fields that may be replaced via PUT /api/users/{id}.
/// `None` leaves the stored value untouched.
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

impl SocialStore {
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let now = Utc::now().timestamp();
        let id = self.next_id();

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created, updated)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let user = User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            display_name: None,
            bio: None,
            avatar_url: None,
            cover_url: None,
            location: None,
            website: None,
            created: now,
            updated: now,
        };

        self.cache_user(user.clone()).await;
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        if let Some(user) = self.cached_user(id).await {
            return Ok(Some(user));
        }

        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let user = user_from_row(&row);
            self.cache_user(user.clone()).await;
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    /// Prefix search over username and display name.
    pub async fn search_users(&self, query: &str, limit: i32) -> Result<Vec<User>> {
        // Escape LIKE metacharacters so user input matches literally
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let prefix = format!("{}%", escaped);

        let rows = sqlx::query(
            "SELECT * FROM users WHERE username LIKE ? ESCAPE '\\' OR display_name LIKE ? ESCAPE '\\'
             ORDER BY username LIMIT ?",
        )
        .bind(&prefix)
        .bind(&prefix)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    pub async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<Option<User>> {
        let Some(current) = self.get_user(id).await? else {
            return Ok(None);
        };

        let now = Utc::now().timestamp();
        let mut merged = current;
        merged.display_name = update.display_name.clone().or(merged.display_name);
        merged.bio = update.bio.clone().or(merged.bio);
        merged.avatar_url = update.avatar_url.clone().or(merged.avatar_url);
        merged.cover_url = update.cover_url.clone().or(merged.cover_url);
        merged.location = update.location.clone().or(merged.location);
        merged.website = update.website.clone().or(merged.website);
        merged.updated = now;

        sqlx::query(
            "UPDATE users SET display_name = ?, bio = ?, avatar_url = ?, cover_url = ?,
             location = ?, website = ?, updated = ? WHERE id = ?",
        )
        .bind(&merged.display_name)
        .bind(&merged.bio)
        .bind(&merged.avatar_url)
        .bind(&merged.cover_url)
        .bind(&merged.location)
        .bind(&merged.website)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.evict_user(id).await;
        self.cache_user(merged.clone()).await;
        Ok(Some(merged))
    }

    /// Delete an account and every row it owns, atomically.
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        // Likes on comments that are about to disappear: the user's own
        // comments plus every comment under the user's posts
        sqlx::query(
            "DELETE FROM likes WHERE subject_type = 'comment'
             AND subject_id IN (SELECT id FROM comments WHERE author_id = ?
                 OR post_id IN (SELECT id FROM posts WHERE author_id = ?))",
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Comments and edges left by others on this user's posts go with the posts
        sqlx::query(
            "DELETE FROM comments WHERE post_id IN (SELECT id FROM posts WHERE author_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM likes WHERE subject_type = 'post'
             AND subject_id IN (SELECT id FROM posts WHERE author_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM saves WHERE post_id IN (SELECT id FROM posts WHERE author_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM posts WHERE author_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM comments WHERE author_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM follows WHERE follower_id = ? OR followee_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM likes WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM saves WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM messages WHERE sender_id = ? OR recipient_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM notifications WHERE recipient_id = ? OR sender_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM push_subscriptions WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.evict_user(id).await;
        self.post_cache.clear().await;
        Ok(true)
    }

    pub async fn post_count(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM posts WHERE author_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }
}
