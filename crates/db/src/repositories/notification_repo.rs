//! Repository for the `notifications` table.
//!
//! The lifecycle writes also maintain the activity counters on the owning
//! authorization and user, in the same transaction as the notification
//! row itself.

use notif_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::notification::{NewNotification, Notification, NotificationRevision};
use crate::repositories::{AuthorizationRepo, UserInfoRepo};

const COLUMNS: &str = "\
    id, notid, address, user_id, from_domain, description, source, subject, body, \
    priority, origination_time, expires_at, received_at, revision_count, \
    is_read, read_at, is_deleted";

pub struct NotificationRepo;

impl NotificationRepo {
    /// Find a notification by its public id, including soft-deleted rows.
    pub async fn find_by_notid(
        pool: &PgPool,
        notid: &str,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE notid = $1");
        sqlx::query_as::<_, Notification>(&query)
            .bind(notid)
            .fetch_optional(pool)
            .await
    }

    /// Insert an accepted notification and count it against its
    /// authorization and user.
    pub async fn create(
        pool: &PgPool,
        input: &NewNotification,
        now: Timestamp,
    ) -> Result<Notification, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO notifications \
                (notid, address, user_id, from_domain, description, source, subject, body, \
                 priority, origination_time, expires_at, received_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        let notification = sqlx::query_as::<_, Notification>(&query)
            .bind(&input.notid)
            .bind(&input.address)
            .bind(input.user_id)
            .bind(&input.from_domain)
            .bind(&input.description)
            .bind(&input.source)
            .bind(&input.subject)
            .bind(&input.body)
            .bind(input.priority.as_i16())
            .bind(input.origination_time)
            .bind(input.expires_at)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        if !AuthorizationRepo::record_create(&mut *tx, &input.address, now).await? {
            tracing::warn!(address = %input.address, "Authorization vanished during create");
        }
        if !UserInfoRepo::record_create(&mut *tx, input.user_id, now).await? {
            tracing::warn!(user_id = input.user_id, "No user info row to count create");
        }

        tx.commit().await?;
        Ok(notification)
    }

    /// Apply an update if it is strictly newer than the stored revision.
    ///
    /// Returns `None` (and writes nothing) when the notification is missing,
    /// soft-deleted, or already at an equal or later origination time.
    pub async fn revise(
        pool: &PgPool,
        notid: &str,
        revision: &NotificationRevision,
        now: Timestamp,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE notifications SET \
                subject = $2, body = $3, priority = $4, origination_time = $5, \
                expires_at = $6, received_at = $7, \
                revision_count = revision_count + 1, is_read = FALSE \
             WHERE notid = $1 AND NOT is_deleted AND origination_time < $5 \
             RETURNING {COLUMNS}"
        );
        let Some(notification) = sqlx::query_as::<_, Notification>(&query)
            .bind(notid)
            .bind(&revision.subject)
            .bind(&revision.body)
            .bind(revision.priority.as_i16())
            .bind(revision.origination_time)
            .bind(revision.expires_at)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        AuthorizationRepo::touch(&mut *tx, &notification.address, now).await?;
        if !UserInfoRepo::touch(&mut *tx, notification.user_id, now).await? {
            tracing::warn!(user_id = notification.user_id, "No user info row to touch on update");
        }

        tx.commit().await?;
        Ok(Some(notification))
    }

    /// Soft-delete a notification. Returns `None` if it was missing or
    /// already deleted.
    pub async fn soft_delete(
        pool: &PgPool,
        notid: &str,
        now: Timestamp,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications SET is_deleted = TRUE, received_at = $2 \
             WHERE notid = $1 AND NOT is_deleted \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(notid)
            .bind(now)
            .fetch_optional(pool)
            .await
    }
}
