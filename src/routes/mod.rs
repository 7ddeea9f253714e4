use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    catalog::routes_with_openapi()
        .merge(cart::routes_with_openapi())
        .merge(auth::routes_with_openapi(state.clone()))
        .merge(admin::routes_with_openapi(state))
}
