use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use super::SocialStore;
use crate::models::{ContactRequest, Notification, NotificationKind, PushSubscription};

fn notification_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<Notification> {
    let kind = NotificationKind::parse(row.get("kind"))?;
    Some(Notification {
        id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        sender_id: row.get("sender_id"),
        kind,
        post_id: row.get("post_id"),
        read: row.get::<i64, _>("read") != 0,
        created: row.get("created"),
    })
}

impl SocialStore {
    /// Record a notification. No-op when the actor is the recipient.
    pub async fn create_notification(
        &self,
        recipient_id: i64,
        sender_id: i64,
        kind: NotificationKind,
        post_id: Option<i64>,
    ) -> Result<Option<Notification>> {
        if recipient_id == sender_id {
            return Ok(None);
        }

        let now = Utc::now().timestamp();
        let id = self.next_id();

        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, sender_id, kind, post_id, read, created)
             VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(id)
        .bind(recipient_id)
        .bind(sender_id)
        .bind(kind.as_str())
        .bind(post_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Some(Notification {
            id,
            recipient_id,
            sender_id,
            kind,
            post_id,
            read: false,
            created: now,
        }))
    }

    /// Newest first. Rows with an unknown kind (written by a newer build) are
    /// skipped rather than failing the whole listing.
    pub async fn notifications_for(&self, recipient_id: i64, limit: i32) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE recipient_id = ?
             ORDER BY created DESC, id DESC LIMIT ?",
        )
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(notification_from_row).collect())
    }

    pub async fn mark_notification_read(&self, recipient_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read = 1 WHERE id = ? AND recipient_id = ?",
        )
        .bind(id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_notifications_read(&self, recipient_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = 1 WHERE recipient_id = ? AND read = 0",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_notification_count(&self, recipient_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND read = 0",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get(0))
    }

    /// Upsert by endpoint: re-registering an existing endpoint refreshes the
    /// keys and owner instead of duplicating the row.
    pub async fn upsert_push_subscription(
        &self,
        user_id: i64,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription> {
        let now = Utc::now().timestamp();
        let id = self.next_id();

        sqlx::query(
            "INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh, auth, created)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(endpoint) DO UPDATE SET user_id = excluded.user_id,
                 p256dh = excluded.p256dh, auth = excluded.auth",
        )
        .bind(id)
        .bind(user_id)
        .bind(endpoint)
        .bind(p256dh)
        .bind(auth)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT * FROM push_subscriptions WHERE endpoint = ?")
            .bind(endpoint)
            .fetch_one(&self.pool)
            .await?;

        Ok(PushSubscription {
            id: row.get("id"),
            user_id: row.get("user_id"),
            endpoint: row.get("endpoint"),
            p256dh: row.get("p256dh"),
            auth: row.get("auth"),
            created: row.get("created"),
        })
    }

    pub async fn delete_push_subscription(&self, user_id: i64, endpoint: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM push_subscriptions WHERE user_id = ? AND endpoint = ?",
        )
        .bind(user_id)
        .bind(endpoint)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn push_subscriptions_for(&self, user_id: i64) -> Result<Vec<PushSubscription>> {
        let rows = sqlx::query("SELECT * FROM push_subscriptions WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| PushSubscription {
                id: row.get("id"),
                user_id: row.get("user_id"),
                endpoint: row.get("endpoint"),
                p256dh: row.get("p256dh"),
                auth: row.get("auth"),
                created: row.get("created"),
            })
            .collect())
    }

    pub async fn create_contact_request(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<ContactRequest> {
        let now = Utc::now().timestamp();
        let id = self.next_id();

        sqlx::query(
            "INSERT INTO contact_requests (id, name, email, message, created)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(ContactRequest {
            id,
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            created: now,
        })
    }
}
