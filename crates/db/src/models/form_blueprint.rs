use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::access::{Caller, visible_to};

/// Top-level category a form applies to.
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "form_head", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FormHead {
    YoungPeople,
    Cars,
    Home,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "blueprint_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum BlueprintStatus {
    #[default]
    Draft,
    Published,
}

/// A form template; entries are filled-in instances of a blueprint.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct FormBlueprint {
    pub id: Uuid,
    pub company_id: Uuid,
    pub head: FormHead,
    pub name: String,
    pub status: BlueprintStatus,
    pub form_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFormBlueprint {
    pub company_id: Uuid,
    pub head: FormHead,
    pub name: String,
    pub status: Option<BlueprintStatus>,
    pub form_type: Option<String>,
}

impl FormBlueprint {
    pub fn is_published(&self) -> bool {
        self.status == BlueprintStatus::Published
    }

    pub async fn create(pool: &SqlitePool, data: &CreateFormBlueprint) -> Result<Self, sqlx::Error> {
        let status = data.status.unwrap_or_default();
        sqlx::query_as::<_, FormBlueprint>(
            r#"INSERT INTO form_blueprints (id, company_id, head, name, status, form_type, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, company_id, head, name, status, form_type, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.company_id)
        .bind(data.head)
        .bind(&data.name)
        .bind(status)
        .bind(&data.form_type)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id_for(
        pool: &SqlitePool,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"SELECT fb.id, fb.company_id, fb.head, fb.name, fb.status, fb.form_type, fb.created_at
               FROM form_blueprints fb
               WHERE fb.id = $2 AND {}"#,
            visible_to("fb", "$1")
        );
        sqlx::query_as::<_, FormBlueprint>(&sql)
            .bind(caller.user_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
