use axum::{Router, routing::get};

use crate::{config::AppConfig, state::AppState};

pub mod admin;
pub mod audit;
pub mod auth;
pub mod categories;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod plans;
pub mod products;
pub mod settings;
pub mod uploads;
pub mod usage;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router(config.body_limit()))
        .route("/usage", get(usage::usage))
}
