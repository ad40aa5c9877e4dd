//! Repository for the single-row `site_info` table.

use sqlx::PgPool;

use crate::models::site_info::SiteInfo;

pub struct SiteInfoRepo;

impl SiteInfoRepo {
    pub async fn find(pool: &PgPool) -> Result<Option<SiteInfo>, sqlx::Error> {
        sqlx::query_as::<_, SiteInfo>(
            "SELECT twilio_sid, twilio_token, twilio_from FROM site_info WHERE id = 1",
        )
        .fetch_optional(pool)
        .await
    }

    pub async fn upsert(pool: &PgPool, info: &SiteInfo) -> Result<SiteInfo, sqlx::Error> {
        sqlx::query_as::<_, SiteInfo>(
            "INSERT INTO site_info (id, twilio_sid, twilio_token, twilio_from) \
             VALUES (1, $1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET \
                twilio_sid = EXCLUDED.twilio_sid, \
                twilio_token = EXCLUDED.twilio_token, \
                twilio_from = EXCLUDED.twilio_from \
             RETURNING twilio_sid, twilio_token, twilio_from",
        )
        .bind(&info.twilio_sid)
        .bind(&info.twilio_token)
        .bind(&info.twilio_from)
        .fetch_one(pool)
        .await
    }
}
