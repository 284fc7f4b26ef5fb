use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::access::{Caller, visible_to};

/// A young person cared for by a home; the subject of YOUNG_PEOPLE forms.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct YoungPerson {
    pub id: Uuid,
    pub company_id: Uuid,
    pub home_id: Option<Uuid>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateYoungPerson {
    pub company_id: Uuid,
    pub home_id: Option<Uuid>,
    pub name: String,
}

impl YoungPerson {
    pub async fn create(pool: &SqlitePool, data: &CreateYoungPerson) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, YoungPerson>(
            r#"INSERT INTO young_people (id, company_id, home_id, name, created_at)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, company_id, home_id, name, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.company_id)
        .bind(data.home_id)
        .bind(&data.name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Load a young person only if the caller's memberships grant access to their company.
    pub async fn find_by_id_for(
        pool: &SqlitePool,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"SELECT yp.id, yp.company_id, yp.home_id, yp.name, yp.created_at
               FROM young_people yp
               WHERE yp.id = $2 AND {}"#,
            visible_to("yp", "$1")
        );
        sqlx::query_as::<_, YoungPerson>(&sql)
            .bind(caller.user_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
