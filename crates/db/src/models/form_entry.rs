use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    access::{Caller, editable_by, visible_to},
    form_blueprint::FormHead,
};

const ENTRY_COLUMNS: &str = "id, blueprint_id, company_id, home_id, head, subject_young_person_id, \
     answers, status, created_by, created_at, submitted_at, updated_at";

/// Lifecycle of a filled-in form.
///
/// `Draft` is the only editable state. `Submitted`, `Locked` and `Cancelled` have no
/// outgoing transitions from the application; review of submitted forms happens elsewhere.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "form_entry_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum FormEntryStatus {
    #[default]
    Draft,
    Submitted,
    Locked,
    Cancelled,
}

impl FormEntryStatus {
    pub fn is_editable(self) -> bool {
        self == FormEntryStatus::Draft
    }

    pub fn can_transition_to(self, next: FormEntryStatus) -> bool {
        matches!(
            (self, next),
            (
                FormEntryStatus::Draft,
                FormEntryStatus::Submitted | FormEntryStatus::Locked | FormEntryStatus::Cancelled
            )
        )
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct FormEntry {
    pub id: Uuid,
    pub blueprint_id: Uuid,
    pub company_id: Uuid,
    pub home_id: Option<Uuid>,
    pub head: FormHead,
    pub subject_young_person_id: Option<Uuid>,
    pub answers: String, // JSON-serialized answers document
    pub status: FormEntryStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFormEntry {
    pub blueprint_id: Uuid,
    pub company_id: Uuid,
    pub home_id: Option<Uuid>,
    pub head: FormHead,
    pub subject_young_person_id: Option<Uuid>,
    pub created_by: Uuid,
}

impl FormEntry {
    /// Parse the stored answers into a JSON value.
    pub fn parsed_answers(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.answers).ok()
    }

    /// Insert a new DRAFT entry with an empty answers document.
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateFormEntry,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let sql = format!(
            r#"INSERT INTO form_entries
                   (id, blueprint_id, company_id, home_id, head, subject_young_person_id,
                    answers, status, created_by, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, '{{}}', $7, $8, $9, $9)
               RETURNING {ENTRY_COLUMNS}"#
        );
        sqlx::query_as::<_, FormEntry>(&sql)
            .bind(id)
            .bind(data.blueprint_id)
            .bind(data.company_id)
            .bind(data.home_id)
            .bind(data.head)
            .bind(data.subject_young_person_id)
            .bind(FormEntryStatus::Draft)
            .bind(data.created_by)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Lookup without an access scope.
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM form_entries WHERE id = $1");
        sqlx::query_as::<_, FormEntry>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id_for(
        pool: &SqlitePool,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM form_entries WHERE id = $2 AND {}",
            visible_to("form_entries", "$1")
        );
        sqlx::query_as::<_, FormEntry>(&sql)
            .bind(caller.user_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the answers of a DRAFT entry the caller may edit.
    ///
    /// Returns `None` when no row matched: the id is unknown, hidden from the caller,
    /// or no longer DRAFT.
    pub async fn update_answers_if_draft(
        pool: &SqlitePool,
        caller: &Caller,
        id: Uuid,
        answers: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"UPDATE form_entries
               SET answers = $3, updated_at = $4
               WHERE id = $2 AND status = $5 AND {}
               RETURNING {ENTRY_COLUMNS}"#,
            editable_by("form_entries", "$1")
        );
        sqlx::query_as::<_, FormEntry>(&sql)
            .bind(caller.user_id)
            .bind(id)
            .bind(answers)
            .bind(Utc::now())
            .bind(FormEntryStatus::Draft)
            .fetch_optional(pool)
            .await
    }

    /// Write final answers and move a DRAFT entry to `status` in one guarded update.
    pub async fn submit_if_draft(
        pool: &SqlitePool,
        caller: &Caller,
        id: Uuid,
        answers: &str,
        status: FormEntryStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let now = Utc::now();
        let sql = format!(
            r#"UPDATE form_entries
               SET answers = $3, status = $4, submitted_at = $5, updated_at = $5
               WHERE id = $2 AND status = $6 AND {}
               RETURNING {ENTRY_COLUMNS}"#,
            editable_by("form_entries", "$1")
        );
        sqlx::query_as::<_, FormEntry>(&sql)
            .bind(caller.user_id)
            .bind(id)
            .bind(answers)
            .bind(status)
            .bind(now)
            .bind(FormEntryStatus::Draft)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a DRAFT entry. Answers are kept.
    pub async fn cancel_if_draft(
        pool: &SqlitePool,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"UPDATE form_entries
               SET status = $3, updated_at = $4
               WHERE id = $2 AND status = $5 AND {}
               RETURNING {ENTRY_COLUMNS}"#,
            editable_by("form_entries", "$1")
        );
        sqlx::query_as::<_, FormEntry>(&sql)
            .bind(caller.user_id)
            .bind(id)
            .bind(FormEntryStatus::Cancelled)
            .bind(Utc::now())
            .bind(FormEntryStatus::Draft)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DBService,
        models::{
            company::{Company, Home},
            form_blueprint::{BlueprintStatus, CreateFormBlueprint, FormBlueprint},
            role_membership::{CreateRoleMembership, Role, RoleMembership},
            young_person::{CreateYoungPerson, YoungPerson},
        },
    };

    struct Fixture {
        db: DBService,
        company_id: Uuid,
        staff: Caller,
        entry: FormEntry,
    }

    async fn fixture() -> Fixture {
        let db = DBService::new_in_memory().await.unwrap();
        let company = Company::create(&db.pool, "Acme Care").await.unwrap();
        let home = Home::create(&db.pool, company.id, "Oak House").await.unwrap();
        let person = YoungPerson::create(
            &db.pool,
            &CreateYoungPerson {
                company_id: company.id,
                home_id: Some(home.id),
                name: "Sam".to_string(),
            },
        )
        .await
        .unwrap();
        let blueprint = FormBlueprint::create(
            &db.pool,
            &CreateFormBlueprint {
                company_id: company.id,
                head: FormHead::YoungPeople,
                name: "Daily log".to_string(),
                status: Some(BlueprintStatus::Published),
                form_type: None,
            },
        )
        .await
        .unwrap();
        let staff = Caller::new(Uuid::new_v4());
        RoleMembership::create(
            &db.pool,
            &CreateRoleMembership {
                user_id: staff.user_id,
                role: Role::Staff,
                company_id: Some(company.id),
                home_id: Some(home.id),
            },
        )
        .await
        .unwrap();
        let entry = FormEntry::create(
            &db.pool,
            &CreateFormEntry {
                blueprint_id: blueprint.id,
                company_id: company.id,
                home_id: Some(home.id),
                head: FormHead::YoungPeople,
                subject_young_person_id: Some(person.id),
                created_by: staff.user_id,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        Fixture {
            db,
            company_id: company.id,
            staff,
            entry,
        }
    }

    #[test]
    fn test_only_draft_has_outgoing_transitions() {
        use FormEntryStatus::*;
        assert!(Draft.can_transition_to(Submitted));
        assert!(Draft.can_transition_to(Locked));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(!Draft.can_transition_to(Draft));
        for from in [Submitted, Locked, Cancelled] {
            for to in [Draft, Submitted, Locked, Cancelled] {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[tokio::test]
    async fn test_create_starts_as_empty_draft() {
        let f = fixture().await;
        assert_eq!(f.entry.status, FormEntryStatus::Draft);
        assert_eq!(f.entry.parsed_answers(), Some(serde_json::json!({})));
        assert!(f.entry.submitted_at.is_none());
        assert_eq!(f.entry.company_id, f.company_id);
    }

    #[tokio::test]
    async fn test_update_answers_only_matches_drafts() {
        let f = fixture().await;
        let saved = FormEntry::update_answers_if_draft(&f.db.pool, &f.staff, f.entry.id, r#"{"q1":"yes"}"#)
            .await
            .unwrap()
            .expect("draft should be editable");
        assert_eq!(saved.parsed_answers(), Some(serde_json::json!({"q1": "yes"})));

        FormEntry::submit_if_draft(&f.db.pool, &f.staff, f.entry.id, r#"{"q1":"yes"}"#, FormEntryStatus::Submitted)
            .await
            .unwrap()
            .expect("draft should submit");

        let after = FormEntry::update_answers_if_draft(&f.db.pool, &f.staff, f.entry.id, r#"{"q1":"no"}"#)
            .await
            .unwrap();
        assert!(after.is_none());
        let stored = FormEntry::find_by_id(&f.db.pool, f.entry.id).await.unwrap().unwrap();
        assert_eq!(stored.parsed_answers(), Some(serde_json::json!({"q1": "yes"})));
    }

    #[tokio::test]
    async fn test_outsider_cannot_see_or_edit() {
        let f = fixture().await;
        let other_company = Company::create(&f.db.pool, "Other Ltd").await.unwrap();
        let outsider = Caller::new(Uuid::new_v4());
        RoleMembership::create(
            &f.db.pool,
            &CreateRoleMembership {
                user_id: outsider.user_id,
                role: Role::Manager,
                company_id: Some(other_company.id),
                home_id: None,
            },
        )
        .await
        .unwrap();

        assert!(FormEntry::find_by_id_for(&f.db.pool, &outsider, f.entry.id).await.unwrap().is_none());
        assert!(FormEntry::update_answers_if_draft(&f.db.pool, &outsider, f.entry.id, "{}")
            .await
            .unwrap()
            .is_none());
        assert!(FormEntry::cancel_if_draft(&f.db.pool, &outsider, f.entry.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_colleague_can_see_but_not_edit() {
        let f = fixture().await;
        let colleague = Caller::new(Uuid::new_v4());
        RoleMembership::create(
            &f.db.pool,
            &CreateRoleMembership {
                user_id: colleague.user_id,
                role: Role::Staff,
                company_id: Some(f.company_id),
                home_id: None,
            },
        )
        .await
        .unwrap();

        assert!(FormEntry::find_by_id_for(&f.db.pool, &colleague, f.entry.id).await.unwrap().is_some());
        assert!(FormEntry::update_answers_if_draft(&f.db.pool, &colleague, f.entry.id, "{}")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_cancel_keeps_row_and_answers() {
        let f = fixture().await;
        FormEntry::update_answers_if_draft(&f.db.pool, &f.staff, f.entry.id, r#"{"q1":"yes"}"#)
            .await
            .unwrap();
        let cancelled = FormEntry::cancel_if_draft(&f.db.pool, &f.staff, f.entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, FormEntryStatus::Cancelled);
        assert_eq!(cancelled.parsed_answers(), Some(serde_json::json!({"q1": "yes"})));
        assert!(FormEntry::cancel_if_draft(&f.db.pool, &f.staff, f.entry.id).await.unwrap().is_none());
    }
}
