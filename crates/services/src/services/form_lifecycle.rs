//! Form entry lifecycle: DRAFT → SUBMITTED | LOCKED, and DRAFT → CANCELLED.
//!
//! Every status-changing write is a single UPDATE guarded by `status = 'DRAFT'`.
//! That guard is the only mutual exclusion: a second writer racing on the same
//! entry matches zero rows and gets the same failure as an unknown id.

use db::models::{
    access::Caller,
    form_blueprint::{FormBlueprint, FormHead},
    form_entry::{CreateFormEntry, FormEntry, FormEntryStatus},
    role_membership::RoleMembership,
    young_person::YoungPerson,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FormLifecycleError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("json error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Form not found or not editable")]
    NotEditable,
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StartFormEntry {
    pub young_person_id: Uuid,
    pub blueprint_id: Uuid,
}

/// An entry as returned to callers, with its answers parsed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct FormEntryView {
    pub id: Uuid,
    pub blueprint_id: Uuid,
    pub company_id: Uuid,
    pub home_id: Option<Uuid>,
    pub head: FormHead,
    pub subject_young_person_id: Option<Uuid>,
    pub answers: serde_json::Value,
    pub status: FormEntryStatus,
    pub created_by: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<FormEntry> for FormEntryView {
    fn from(entry: FormEntry) -> Self {
        let answers = entry
            .parsed_answers()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
        Self {
            id: entry.id,
            blueprint_id: entry.blueprint_id,
            company_id: entry.company_id,
            home_id: entry.home_id,
            head: entry.head,
            subject_young_person_id: entry.subject_young_person_id,
            answers,
            status: entry.status,
            created_by: entry.created_by,
            created_at: entry.created_at,
            submitted_at: entry.submitted_at,
            updated_at: entry.updated_at,
        }
    }
}

pub struct FormLifecycleService {
    pool: SqlitePool,
}

impl FormLifecycleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a DRAFT entry for a young person from a published blueprint of their company.
    pub async fn start(
        &self,
        caller: &Caller,
        data: &StartFormEntry,
    ) -> Result<FormEntry, FormLifecycleError> {
        let person = YoungPerson::find_by_id_for(&self.pool, caller, data.young_person_id)
            .await?
            .ok_or(FormLifecycleError::NotFound("Young person not found"))?;
        let blueprint = FormBlueprint::find_by_id_for(&self.pool, caller, data.blueprint_id)
            .await?
            .ok_or(FormLifecycleError::NotFound("Blueprint not found"))?;

        if blueprint.company_id != person.company_id {
            return Err(FormLifecycleError::Validation(
                "Blueprint does not belong to this young person's company".to_string(),
            ));
        }
        if blueprint.head != FormHead::YoungPeople {
            return Err(FormLifecycleError::Validation(
                "Blueprint is not a young people form".to_string(),
            ));
        }
        if !blueprint.is_published() {
            return Err(FormLifecycleError::Validation(
                "Blueprint is not published".to_string(),
            ));
        }

        let entry = FormEntry::create(
            &self.pool,
            &CreateFormEntry {
                blueprint_id: blueprint.id,
                company_id: person.company_id,
                home_id: person.home_id,
                head: FormHead::YoungPeople,
                subject_young_person_id: Some(person.id),
                created_by: caller.user_id,
            },
            Uuid::new_v4(),
        )
        .await?;

        info!(
            entry_id = %entry.id,
            blueprint_id = %blueprint.id,
            young_person_id = %person.id,
            user_id = %caller.user_id,
            "Started form entry"
        );
        Ok(entry)
    }

    /// Replace the answers of a DRAFT entry.
    pub async fn save(
        &self,
        caller: &Caller,
        entry_id: Uuid,
        answers: &serde_json::Value,
    ) -> Result<FormEntry, FormLifecycleError> {
        let answers = serialize_answers(answers)?;
        let entry = FormEntry::update_answers_if_draft(&self.pool, caller, entry_id, &answers)
            .await?
            .ok_or(FormLifecycleError::NotEditable)?;
        info!(entry_id = %entry.id, user_id = %caller.user_id, "Saved form entry");
        Ok(entry)
    }

    /// Finalise a DRAFT entry. Manager-level callers lock it outright; everyone else
    /// leaves it SUBMITTED for review.
    pub async fn submit(
        &self,
        caller: &Caller,
        entry_id: Uuid,
        answers: &serde_json::Value,
    ) -> Result<FormEntry, FormLifecycleError> {
        let answers = serialize_answers(answers)?;
        let roles = RoleMembership::roles_for_user(&self.pool, caller.user_id).await?;
        let target = submit_target(roles.iter().any(|role| role.is_manager_level()));

        let entry = FormEntry::submit_if_draft(&self.pool, caller, entry_id, &answers, target)
            .await?
            .ok_or(FormLifecycleError::NotEditable)?;
        info!(
            entry_id = %entry.id,
            user_id = %caller.user_id,
            status = %entry.status,
            "Submitted form entry"
        );
        Ok(entry)
    }

    /// Soft-delete a DRAFT entry by cancelling it.
    pub async fn delete(&self, caller: &Caller, entry_id: Uuid) -> Result<(), FormLifecycleError> {
        let entry = FormEntry::find_by_id_for(&self.pool, caller, entry_id)
            .await?
            .ok_or(FormLifecycleError::NotFound("Form not found"))?;
        if !entry.status.can_transition_to(FormEntryStatus::Cancelled) {
            return Err(only_drafts_deletable());
        }

        match FormEntry::cancel_if_draft(&self.pool, caller, entry_id).await? {
            Some(_) => {
                info!(entry_id = %entry_id, user_id = %caller.user_id, "Cancelled form entry");
                Ok(())
            }
            None => {
                // Status moved on between the read and the write, or the caller can
                // see the entry without being allowed to edit it.
                let current = FormEntry::find_by_id_for(&self.pool, caller, entry_id).await?;
                match current {
                    Some(current) if !current.status.is_editable() => Err(only_drafts_deletable()),
                    _ => {
                        warn!(entry_id = %entry_id, user_id = %caller.user_id, "Delete matched no editable row");
                        Err(FormLifecycleError::NotEditable)
                    }
                }
            }
        }
    }

    pub async fn get(&self, caller: &Caller, entry_id: Uuid) -> Result<FormEntry, FormLifecycleError> {
        FormEntry::find_by_id_for(&self.pool, caller, entry_id)
            .await?
            .ok_or(FormLifecycleError::NotFound("Form not found"))
    }
}

pub fn submit_target(is_manager_level: bool) -> FormEntryStatus {
    if is_manager_level {
        FormEntryStatus::Locked
    } else {
        FormEntryStatus::Submitted
    }
}

fn serialize_answers(answers: &serde_json::Value) -> Result<String, FormLifecycleError> {
    if !answers.is_object() {
        return Err(FormLifecycleError::Validation(
            "answers must be an object".to_string(),
        ));
    }
    Ok(serde_json::to_string(answers)?)
}

fn only_drafts_deletable() -> FormLifecycleError {
    FormLifecycleError::Validation("Only draft forms can be deleted".to_string())
}
