use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Role a user holds, either globally (ADMIN) or within a company/home.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Company,
    Manager,
    #[default]
    Staff,
}

impl Role {
    /// Precedence used when collapsing several memberships into one level.
    pub fn rank(self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Company => 2,
            Role::Manager => 1,
            Role::Staff => 0,
        }
    }

    pub fn is_manager_level(self) -> bool {
        matches!(self, Role::Admin | Role::Company | Role::Manager)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct RoleMembership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub home_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateRoleMembership {
    pub user_id: Uuid,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub home_id: Option<Uuid>,
}

impl RoleMembership {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateRoleMembership,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RoleMembership>(
            r#"INSERT INTO role_memberships (id, user_id, role, company_id, home_id, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, user_id, role, company_id, home_id, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.role)
        .bind(data.company_id)
        .bind(data.home_id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoleMembership>(
            r#"SELECT id, user_id, role, company_id, home_id, created_at
               FROM role_memberships
               WHERE user_id = $1
               ORDER BY created_at ASC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Every role the user holds, across all companies and homes.
    pub async fn roles_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Role>, sqlx::Error> {
        let memberships = Self::find_by_user_id(pool, user_id).await?;
        Ok(memberships.into_iter().map(|m| m.role).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_as_uppercase() {
        assert_eq!(Role::Company.to_string(), "COMPANY");
        assert_eq!("MANAGER".parse::<Role>().unwrap(), Role::Manager);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_manager_level_roles() {
        assert!(Role::Admin.is_manager_level());
        assert!(Role::Company.is_manager_level());
        assert!(Role::Manager.is_manager_level());
        assert!(!Role::Staff.is_manager_level());
    }
}
