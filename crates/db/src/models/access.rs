//! Row-level access rules for caller-scoped queries.
//!
//! Every read or write made on behalf of a user goes through one of these
//! predicates, so a caller only ever touches rows of companies they belong to.
//! Rows are assumed to carry a `company_id` column; entries also carry `created_by`.

use uuid::Uuid;

/// The authenticated user a query runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
}

impl Caller {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// `true` when the caller holds ADMIN anywhere, or any role in the row's company.
pub fn visible_to(alias: &str, caller_param: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM role_memberships vm \
          WHERE vm.user_id = {caller_param} \
            AND (vm.role = 'ADMIN' OR vm.company_id = {alias}.company_id))"
    )
}

/// `true` when the row is visible and the caller either created it or manages its company.
pub fn editable_by(alias: &str, caller_param: &str) -> String {
    format!(
        "({visible} AND ({alias}.created_by = {caller_param} OR EXISTS (SELECT 1 FROM role_memberships em \
          WHERE em.user_id = {caller_param} \
            AND (em.role = 'ADMIN' \
                 OR (em.role IN ('COMPANY', 'MANAGER') AND em.company_id = {alias}.company_id)))))",
        visible = visible_to(alias, caller_param)
    )
}
