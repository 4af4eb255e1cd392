use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use super::SocialStore;
use crate::models::{Comment, CommentView, LikeSubject, PublicUser};

fn comment_from_row(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created: row.get("created"),
    }
}

impl SocialStore {
    pub async fn create_comment(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        let now = Utc::now().timestamp();
        let id = self.next_id();

        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, text, created)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id,
            post_id,
            author_id,
            text: text.to_string(),
            created: now,
        })
    }

    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| comment_from_row(&row)))
    }

    /// Comments on a post, oldest first.
    pub async fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT * FROM comments WHERE post_id = ? ORDER BY created ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    /// Delete a comment and any likes attached to it.
    pub async fn delete_comment(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM likes WHERE subject_type = 'comment' AND subject_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn hydrate_comments(
        &self,
        viewer_id: i64,
        comments: Vec<Comment>,
    ) -> Result<Vec<CommentView>> {
        let mut views = Vec::with_capacity(comments.len());

        for comment in comments {
            let Some(author) = self.get_user(comment.author_id).await? else {
                continue;
            };

            let like_count = self.like_count(LikeSubject::Comment, comment.id).await?;
            let liked = self
                .has_liked(viewer_id, LikeSubject::Comment, comment.id)
                .await?;

            views.push(CommentView {
                author: PublicUser::from(&author),
                comment,
                like_count,
                liked,
            });
        }

        Ok(views)
    }
}
