//! Repository for the `rules` table.

use notif_core::types::DbId;
use sqlx::PgPool;

use crate::models::rule::{CreateRule, Rule};

const COLUMNS: &str = "id, user_id, priority, domain, method_id, is_active, created_at";

pub struct RuleRepo;

impl RuleRepo {
    /// All of a user's rules, active or not, in insertion order.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Rule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rules WHERE user_id = $1 ORDER BY id");
        sqlx::query_as::<_, Rule>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreateRule) -> Result<Rule, sqlx::Error> {
        let query = format!(
            "INSERT INTO rules (user_id, priority, domain, method_id, is_active) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Rule>(&query)
            .bind(input.user_id)
            .bind(input.priority)
            .bind(&input.domain)
            .bind(input.method_id)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }
}
