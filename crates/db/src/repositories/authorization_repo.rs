//! Repository for the `authorizations` table.

use notif_core::types::Timestamp;
use sqlx::{PgExecutor, PgPool};

use crate::models::authorization::{Authorization, CreateAuthorization};

const COLUMNS: &str = "\
    id, address, user_id, domain, description, max_priority, count, latest, \
    is_active, is_deleted, created_at, updated_at";

pub struct AuthorizationRepo;

impl AuthorizationRepo {
    /// Find an authorization by address token, deleted or not.
    pub async fn find_by_address(
        pool: &PgPool,
        address: &str,
    ) -> Result<Option<Authorization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM authorizations WHERE address = $1");
        sqlx::query_as::<_, Authorization>(&query)
            .bind(address)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        input: &CreateAuthorization,
    ) -> Result<Authorization, sqlx::Error> {
        let query = format!(
            "INSERT INTO authorizations \
                (address, user_id, domain, description, max_priority, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Authorization>(&query)
            .bind(&input.address)
            .bind(input.user_id)
            .bind(&input.domain)
            .bind(&input.description)
            .bind(input.max_priority.as_i16())
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Set the lifecycle flags of an authorization.
    ///
    /// Returns `true` if a row was updated.
    pub async fn set_status(
        pool: &PgPool,
        address: &str,
        is_active: bool,
        is_deleted: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE authorizations \
             SET is_active = $2, is_deleted = $3, updated_at = NOW() \
             WHERE address = $1",
        )
        .bind(address)
        .bind(is_active)
        .bind(is_deleted)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count one more notification and stamp the activity time.
    ///
    /// Single-statement increment, safe under concurrent writers.
    pub async fn record_create<'e>(
        executor: impl PgExecutor<'e>,
        address: &str,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE authorizations SET count = count + 1, latest = $2 WHERE address = $1",
        )
        .bind(address)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp the activity time without counting.
    pub async fn touch<'e>(
        executor: impl PgExecutor<'e>,
        address: &str,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE authorizations SET latest = $2 WHERE address = $1")
            .bind(address)
            .bind(now)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
