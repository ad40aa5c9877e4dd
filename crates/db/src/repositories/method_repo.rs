//! Repository for the `methods` table.

use notif_core::types::DbId;
use sqlx::PgPool;

use crate::models::method::{CreateMethod, Method};

const COLUMNS: &str = "id, user_id, name, mode, address, preamble, is_active, created_at";

pub struct MethodRepo;

impl MethodRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Method>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM methods WHERE id = $1");
        sqlx::query_as::<_, Method>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreateMethod) -> Result<Method, sqlx::Error> {
        let query = format!(
            "INSERT INTO methods (user_id, name, mode, address, preamble, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Method>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(input.mode.as_i16())
            .bind(&input.address)
            .bind(&input.preamble)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }
}
