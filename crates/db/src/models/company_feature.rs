use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Per-company feature override. A missing row means the feature is enabled.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CompanyFeature {
    pub company_id: Uuid,
    pub feature: String,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl CompanyFeature {
    pub async fn find_by_company_id(
        pool: &SqlitePool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CompanyFeature>(
            r#"SELECT company_id, feature, enabled, updated_at
               FROM company_features
               WHERE company_id = $1
               ORDER BY feature ASC"#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    pub async fn set(
        pool: &SqlitePool,
        company_id: Uuid,
        feature: &str,
        enabled: bool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CompanyFeature>(
            r#"INSERT INTO company_features (company_id, feature, enabled, updated_at)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT(company_id, feature) DO UPDATE SET
                   enabled = excluded.enabled,
                   updated_at = excluded.updated_at
               RETURNING company_id, feature, enabled, updated_at"#,
        )
        .bind(company_id)
        .bind(feature)
        .bind(enabled)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }
}
