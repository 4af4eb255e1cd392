use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use super::SocialStore;
use crate::models::Message;

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        text: row.get("text"),
        read: row.get::<i64, _>("read") != 0,
        created: row.get("created"),
    }
}

impl SocialStore {
    pub async fn create_message(
        &self,
        sender_id: i64,
        recipient_id: i64,
        text: &str,
    ) -> Result<Message> {
        let now = Utc::now().timestamp();
        let id = self.next_id();

        sqlx::query(
            "INSERT INTO messages (id, sender_id, recipient_id, text, read, created)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(id)
        .bind(sender_id)
        .bind(recipient_id)
        .bind(text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id,
            sender_id,
            recipient_id,
            text: text.to_string(),
            read: false,
            created: now,
        })
    }

    /// The two-party conversation between `user_a` and `user_b`, oldest first.
    pub async fn conversation(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT * FROM messages
             WHERE (sender_id = ? AND recipient_id = ?) OR (sender_id = ? AND recipient_id = ?)
             ORDER BY created ASC, id ASC",
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    /// Mark everything `partner_id` sent to `recipient_id` as read.
    pub async fn mark_conversation_read(&self, recipient_id: i64, partner_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE messages SET read = 1
             WHERE recipient_id = ? AND sender_id = ? AND read = 0",
        )
        .bind(recipient_id)
        .bind(partner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Distinct chat partners for `user_id` with the last message exchanged
    /// and the number of unread incoming messages, most recent first.
    pub async fn conversations(&self, user_id: i64) -> Result<Vec<(i64, Message, i64)>> {
        let partner_ids: Vec<i64> = sqlx::query(
            "SELECT partner FROM (
                 SELECT CASE WHEN sender_id = ? THEN recipient_id ELSE sender_id END AS partner,
                        MAX(created) AS last_at
                 FROM messages WHERE sender_id = ? OR recipient_id = ?
                 GROUP BY partner
             ) ORDER BY last_at DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get(0))
        .collect();

        let mut out = Vec::with_capacity(partner_ids.len());
        for partner_id in partner_ids {
            let last = sqlx::query(
                "SELECT * FROM messages
                 WHERE (sender_id = ? AND recipient_id = ?) OR (sender_id = ? AND recipient_id = ?)
                 ORDER BY created DESC, id DESC LIMIT 1",
            )
            .bind(user_id)
            .bind(partner_id)
            .bind(partner_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

            let Some(last) = last else { continue };

            let unread: i64 = sqlx::query(
                "SELECT COUNT(*) FROM messages
                 WHERE recipient_id = ? AND sender_id = ? AND read = 0",
            )
            .bind(user_id)
            .bind(partner_id)
            .fetch_one(&self.pool)
            .await?
            .get(0);

            out.push((partner_id, message_from_row(&last), unread));
        }

        Ok(out)
    }
}
