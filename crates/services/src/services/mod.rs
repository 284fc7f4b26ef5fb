pub mod auth;
pub mod form_lifecycle;
pub mod visibility;
