//! Role and feature visibility for a caller.
//!
//! The resolver only decides what to show. Row access is enforced by the
//! caller-scoped queries in `db`, never by the capabilities computed here.

use std::{collections::BTreeMap, str::FromStr};

use db::models::{
    access::Caller,
    company_feature::CompanyFeature,
    role_membership::{Role, RoleMembership},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

/// Named areas of the application that a company can switch off.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    EnumIter,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    Rotas,
    Timesheets,
    Payslips,
    Forms,
    HelpCentre,
    Training,
    Budgets,
}

/// Everything the resolver needs, loaded up front so resolution stays pure.
#[derive(Debug, Clone, Default)]
pub struct AccessSnapshot {
    pub roles: Vec<Role>,
    pub company_id: Option<Uuid>,
    pub feature_overrides: Vec<(Feature, bool)>,
}

/// Immutable capability set for one caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    level: Role,
    company_id: Option<Uuid>,
    features: BTreeMap<Feature, bool>,
}

impl Capabilities {
    pub fn level(&self) -> Role {
        self.level
    }

    pub fn company_id(&self) -> Option<Uuid> {
        self.company_id
    }

    pub fn is_admin(&self) -> bool {
        self.level == Role::Admin
    }

    pub fn is_manager_level(&self) -> bool {
        self.level.is_manager_level()
    }

    pub fn feature_enabled(&self, feature: Feature) -> bool {
        self.features.get(&feature).copied().unwrap_or(true)
    }

    pub fn features(&self) -> &BTreeMap<Feature, bool> {
        &self.features
    }
}

/// Highest role held in any company, STAFF when there is none.
///
/// The level is not narrowed to the company in view: a COMPANY member elsewhere
/// stays COMPANY while looking at a company where they are only STAFF.
pub fn effective_level(roles: &[Role]) -> Role {
    roles
        .iter()
        .copied()
        .max_by_key(|role| role.rank())
        .unwrap_or(Role::Staff)
}

pub fn resolve(snapshot: &AccessSnapshot) -> Capabilities {
    use strum::IntoEnumIterator;

    let level = effective_level(&snapshot.roles);
    let mut features: BTreeMap<Feature, bool> = Feature::iter().map(|f| (f, true)).collect();

    // Admins see every area regardless of company overrides
    if level != Role::Admin {
        for (feature, enabled) in &snapshot.feature_overrides {
            features.insert(*feature, *enabled);
        }
    }

    Capabilities {
        level,
        company_id: snapshot.company_id,
        features,
    }
}

pub struct VisibilityResolver;

impl VisibilityResolver {
    /// Load the caller's memberships and the feature overrides of the company in view.
    ///
    /// `company_id` is honoured only when the caller is an admin or a member of that
    /// company; otherwise the first company among the caller's memberships is used.
    pub async fn snapshot(
        pool: &SqlitePool,
        caller: &Caller,
        company_id: Option<Uuid>,
    ) -> Result<AccessSnapshot, sqlx::Error> {
        let memberships = RoleMembership::find_by_user_id(pool, caller.user_id).await?;
        let is_admin = memberships.iter().any(|m| m.role == Role::Admin);

        let company_id = company_id
            .filter(|requested| {
                is_admin || memberships.iter().any(|m| m.company_id == Some(*requested))
            })
            .or_else(|| memberships.iter().find_map(|m| m.company_id));

        let feature_overrides = match company_id {
            Some(company_id) => CompanyFeature::find_by_company_id(pool, company_id)
                .await?
                .into_iter()
                .filter_map(|row| match Feature::from_str(&row.feature) {
                    Ok(feature) => Some((feature, row.enabled)),
                    Err(_) => {
                        debug!(
                            company_id = %company_id,
                            feature = %row.feature,
                            "Ignoring unknown feature override"
                        );
                        None
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(AccessSnapshot {
            roles: memberships.into_iter().map(|m| m.role).collect(),
            company_id,
            feature_overrides,
        })
    }

    pub async fn resolve_for(
        pool: &SqlitePool,
        caller: &Caller,
        company_id: Option<Uuid>,
    ) -> Result<Capabilities, sqlx::Error> {
        let snapshot = Self::snapshot(pool, caller, company_id).await?;
        Ok(resolve(&snapshot))
    }
}
