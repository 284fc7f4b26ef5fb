use axum::Router;

use crate::AppState;

pub mod capabilities;
pub mod forms;
pub mod health;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(forms::router())
        .merge(capabilities::router())
}
