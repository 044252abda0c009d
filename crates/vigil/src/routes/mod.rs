//! HTTP route handlers for Vigil services.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use vigil_common::constants::endpoints;

use crate::config::Role;
use crate::state::AppState;

mod auth;
mod health;
mod notification;

/// Create the router for this process's role
pub fn create_router(state: AppState) -> Router {
    let router = Router::new().route(endpoints::HEALTHY, get(health::healthy));

    let router = match state.role {
        Role::Auth => router
            .route(
                endpoints::SEND_TO_NOTIFICATION,
                get(auth::send_data_to_notification),
            )
            .route(endpoints::STATUS, get(health::status_snapshot)),
        Role::Notification => router
            .route(endpoints::RECEIVE_DATA, post(notification::receive_data))
            .route(endpoints::STATUS, get(health::status_snapshot)),
        Role::Health => router.route(endpoints::UPDATE_HEALTH, get(health::update_health)),
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
