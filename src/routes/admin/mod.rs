use utoipa_axum::router::OpenApiRouter;

use crate::{app_state::AppState, middleware};

pub mod orders;
pub mod products;

/// Every `/admin` route, behind the admin session check.
pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    products::routes_with_openapi()
        .merge(orders::routes_with_openapi())
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::admin_authorization,
        ))
}
