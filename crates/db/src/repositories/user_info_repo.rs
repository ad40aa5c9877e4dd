//! Repository for the `user_info` table.

use notif_core::credentials::ProviderCredentials;
use notif_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::user_info::UserInfo;

const COLUMNS: &str = "user_id, count, latest, twilio_sid, twilio_token, twilio_from";

pub struct UserInfoRepo;

impl UserInfoRepo {
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<UserInfo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_info WHERE user_id = $1");
        sqlx::query_as::<_, UserInfo>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create the info row for a user with optional provider overrides.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        credentials: &ProviderCredentials,
    ) -> Result<UserInfo, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_info (user_id, twilio_sid, twilio_token, twilio_from) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserInfo>(&query)
            .bind(user_id)
            .bind(&credentials.account_sid)
            .bind(&credentials.auth_token)
            .bind(&credentials.from_number)
            .fetch_one(pool)
            .await
    }

    /// Returns `false` when the user has no info row.
    pub async fn record_create<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_info SET count = count + 1, latest = $2, updated_at = NOW() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn touch<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_info SET latest = $2, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
