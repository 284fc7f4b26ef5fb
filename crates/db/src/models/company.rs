use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A residential home belonging to a company.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Home {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub async fn create(pool: &SqlitePool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"INSERT INTO companies (id, name, created_at)
               VALUES ($1, $2, $3)
               RETURNING id, name, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }
}

impl Home {
    pub async fn create(
        pool: &SqlitePool,
        company_id: Uuid,
        name: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Home>(
            r#"INSERT INTO homes (id, company_id, name, created_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id, company_id, name, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }
}
