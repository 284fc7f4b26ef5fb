pub mod access;
pub mod company;
pub mod company_feature;
pub mod form_blueprint;
pub mod form_entry;
pub mod role_membership;
pub mod young_person;
