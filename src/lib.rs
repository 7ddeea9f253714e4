use std::path::Path;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::app_state::AppState;

pub mod aliases;
pub mod app_error;
pub mod app_state;
pub mod auth;
pub mod bootstrap;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod session;
pub mod swagger;
pub mod uploads;

/// Upper bound for a request body; product images arrive in one multipart request.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Builds the full HTTP application: API routes, Swagger UI and the uploaded
/// images under `/static/uploads`.
pub fn app(state: AppState, upload_folder: &Path) -> Router {
    let routes = routes::routes_with_openapi(state.clone());

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Storefront API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi);

    Router::new()
        .merge(routes)
        .nest_service("/static/uploads", ServeDir::new(upload_folder))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(swagger_ui)
}
