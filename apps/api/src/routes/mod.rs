pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/screenings",
            post(handlers::handle_submit).get(handlers::handle_list),
        )
        .route(
            "/api/v1/screenings/export.csv",
            get(handlers::handle_export_csv),
        )
        .route("/api/v1/screenings/:task_id", get(handlers::handle_status))
        .with_state(state)
}
