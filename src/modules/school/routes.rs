use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

use super::controller;

pub fn school_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(controller::register))
        .route("/login", post(controller::login))
        .route(
            "/verifyemail/{token}",
            get(controller::verify_email).post(controller::verify_email),
        )
        .route("/recover", post(controller::recover))
        .route("/reset/{token}", post(controller::reset_password))
        .route("/", get(controller::list_schools))
        .route(
            "/{id}",
            get(controller::get_school).delete(controller::delete_school),
        )
}
